use std::env;

use crate::models::PlatformIdentity;

pub const DEFAULT_ADMIN_ID: i64 = 100_000_001;
pub const DEFAULT_TELEGRAM_ID: i64 = 100_000_001;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `None` runs against the in-memory demo backend.
    pub api_url: Option<String>,
    pub admin_id: i64,
    pub identity: PlatformIdentity,
    pub request_timeout_secs: u64,
    pub utc_offset_hours: i32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            admin_id: DEFAULT_ADMIN_ID,
            identity: PlatformIdentity {
                telegram_id: DEFAULT_TELEGRAM_ID,
                username: None,
                first_name: "Player".to_string(),
                last_name: None,
            },
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            utc_offset_hours: 0,
        }
    }
}

impl ClientConfig {
    /// Reads `.env.local`, `.env` and the process environment.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_url = env::var("POKER_API_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());
        let admin_id = parse_env_or("POKER_ADMIN_ID", defaults.admin_id);
        let telegram_id = parse_env_or("POKER_TELEGRAM_ID", defaults.identity.telegram_id);
        let first_name = non_empty_env("POKER_FIRST_NAME").unwrap_or(defaults.identity.first_name);
        let request_timeout_secs =
            parse_env_or("POKER_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS).max(1);
        let utc_offset_hours = parse_env_or("POKER_UTC_OFFSET_HOURS", 0i32).clamp(-12, 14);

        Self {
            api_url,
            admin_id,
            identity: PlatformIdentity {
                telegram_id,
                username: non_empty_env("POKER_USERNAME"),
                first_name,
                last_name: non_empty_env("POKER_LAST_NAME"),
            },
            request_timeout_secs,
            utc_offset_hours,
        }
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
