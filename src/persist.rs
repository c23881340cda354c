use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::models::{Tournament, User};
use crate::session::Session;

const CACHE_DIR: &str = "poker_lobby";
const CACHE_FILE: &str = "cache.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheFile {
    pub version: u32,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tournaments: Vec<Tournament>,
    #[serde(default)]
    pub current_user: Option<User>,
    #[serde(default)]
    pub saved_at: Option<u64>,
}

/// Where the last-known server state lives. `None` disables caching.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: Option<PathBuf>,
}

impl LocalCache {
    pub fn default_location() -> Self {
        Self { path: cache_path() }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Missing, unreadable or outdated caches all read as `None`.
    pub fn load(&self) -> Option<CacheFile> {
        let path = self.path.as_ref()?;
        let raw = fs::read_to_string(path).ok()?;
        let cache = serde_json::from_str::<CacheFile>(&raw).ok()?;
        if cache.version != CACHE_VERSION {
            return None;
        }
        Some(cache)
    }

    /// Best-effort snapshot of the session lists; failures are ignored.
    pub fn save_from_session(&self, session: &Session) {
        let Some(path) = self.path.as_ref() else {
            return;
        };
        let Some(dir) = path.parent() else {
            return;
        };
        let _ = fs::create_dir_all(dir);

        let cache = CacheFile {
            version: CACHE_VERSION,
            users: session.users.clone(),
            tournaments: session.tournaments.clone(),
            current_user: session.current_user.clone(),
            saved_at: system_time_to_secs(SystemTime::now()),
        };
        if let Ok(json) = serde_json::to_string(&cache) {
            let tmp = path.with_extension("json.tmp");
            if fs::write(&tmp, json).is_ok() {
                let _ = fs::rename(&tmp, path);
            }
        }
    }
}

fn cache_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(CACHE_FILE),
    )
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
