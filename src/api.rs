use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::demo_api::DemoApi;
use crate::http_client::http_client;
use crate::models::{
    AdminStats, NewTournament, NewUser, ProfileUpdate, Tournament, TournamentUpdate, User,
};

/// Remote operations the client needs. Every call is a single exchange.
pub trait PokerApi {
    fn list_users(&self) -> Result<Vec<User>>;
    fn get_user(&self, telegram_id: i64) -> Result<Option<User>>;
    fn create_user(&self, req: &NewUser) -> Result<User>;
    fn update_user(&self, user_id: u64, req: &ProfileUpdate) -> Result<User>;
    fn list_tournaments(&self) -> Result<Vec<Tournament>>;
    fn create_tournament(&self, req: &NewTournament) -> Result<Tournament>;
    fn update_tournament(&self, tournament_id: u64, req: &TournamentUpdate) -> Result<Tournament>;
    fn join_tournament(&self, tournament_id: u64, user_id: u64) -> Result<Tournament>;
    fn admin_stats(&self) -> Result<AdminStats>;
}

/// Backend for `config`: HTTP when a base url is set, the seeded demo store otherwise.
pub fn connect(config: &ClientConfig) -> Result<Box<dyn PokerApi>> {
    match &config.api_url {
        Some(url) => Ok(Box::new(HttpApi::new(url, config.request_timeout_secs)?)),
        None => Ok(Box::new(DemoApi::seeded(Utc::now()))),
    }
}

pub struct HttpApi {
    client: &'static Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(anyhow!("api base url is empty"));
        }
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    fn send(&self, req: RequestBuilder) -> Result<String> {
        self.send_optional(req)?
            .ok_or_else(|| anyhow!("http {}: not found", StatusCode::NOT_FOUND))
    }

    /// Like [`Self::send`] but maps 404 to `None`.
    fn send_optional(&self, req: RequestBuilder) -> Result<Option<String>> {
        let resp = req
            .header(USER_AGENT, "poker_lobby")
            .header(ACCEPT, "application/json")
            .send()
            .context("request failed")?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {}: {}", status, body));
        }
        Ok(Some(body))
    }
}

impl PokerApi for HttpApi {
    fn list_users(&self) -> Result<Vec<User>> {
        let body = self.send(self.get("users"))?;
        parse_users_json(&body)
    }

    fn get_user(&self, telegram_id: i64) -> Result<Option<User>> {
        match self.send_optional(self.get(&format!("users/{telegram_id}")))? {
            Some(body) => parse_user_json(&body),
            None => Ok(None),
        }
    }

    fn create_user(&self, req: &NewUser) -> Result<User> {
        let body = self.send(self.client.post(self.url("users")).json(req))?;
        required_user(&body)
    }

    fn update_user(&self, user_id: u64, req: &ProfileUpdate) -> Result<User> {
        let body = self.send(
            self.client
                .put(self.url(&format!("users/{user_id}")))
                .json(req),
        )?;
        required_user(&body)
    }

    fn list_tournaments(&self) -> Result<Vec<Tournament>> {
        let body = self.send(self.get("tournaments"))?;
        parse_tournaments_json(&body)
    }

    fn create_tournament(&self, req: &NewTournament) -> Result<Tournament> {
        let body = self.send(self.client.post(self.url("tournaments")).json(req))?;
        parse_tournament_json(&body)
    }

    fn update_tournament(&self, tournament_id: u64, req: &TournamentUpdate) -> Result<Tournament> {
        let body = self.send(
            self.client
                .put(self.url(&format!("tournaments/{tournament_id}")))
                .json(req),
        )?;
        parse_tournament_json(&body)
    }

    fn join_tournament(&self, tournament_id: u64, user_id: u64) -> Result<Tournament> {
        let body = self.send(
            self.client
                .post(self.url(&format!("tournaments/{tournament_id}/join")))
                .json(&json!({ "user_id": user_id })),
        )?;
        parse_tournament_json(&body)
    }

    fn admin_stats(&self) -> Result<AdminStats> {
        let body = self.send(self.get("stats"))?;
        parse_stats_json(&body)
    }
}

fn required_user(body: &str) -> Result<User> {
    parse_user_json(body)?.ok_or_else(|| anyhow!("empty user response"))
}

pub fn parse_users_json(raw: &str) -> Result<Vec<User>> {
    parse_list(raw, &["data", "users"]).context("invalid users json")
}

pub fn parse_tournaments_json(raw: &str) -> Result<Vec<Tournament>> {
    parse_list(raw, &["data", "tournaments"]).context("invalid tournaments json")
}

pub fn parse_user_json(raw: &str) -> Result<Option<User>> {
    let Some(root) = parse_root(raw)? else {
        return Ok(None);
    };
    let value = unwrap_entity(root, &["data", "user"]);
    if value.is_null() {
        return Ok(None);
    }
    let user = serde_json::from_value(value).context("invalid user json")?;
    Ok(Some(user))
}

pub fn parse_tournament_json(raw: &str) -> Result<Tournament> {
    let root = parse_root(raw)?.ok_or_else(|| anyhow!("empty tournament response"))?;
    let value = unwrap_entity(root, &["data", "tournament"]);
    serde_json::from_value(value).context("invalid tournament json")
}

pub fn parse_stats_json(raw: &str) -> Result<AdminStats> {
    let Some(root) = parse_root(raw)? else {
        return Ok(AdminStats::default());
    };
    let value = unwrap_entity(root, &["data", "stats"]);
    serde_json::from_value(value).context("invalid stats json")
}

fn parse_root(raw: &str) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed).context("response is not json")?;
    Ok(Some(value))
}

fn parse_list<T: DeserializeOwned>(raw: &str, keys: &[&str]) -> Result<Vec<T>> {
    let Some(root) = parse_root(raw)? else {
        return Ok(Vec::new());
    };
    let list = match root {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => keys
            .iter()
            .find_map(|k| map.remove(*k))
            .ok_or_else(|| anyhow!("no list field in response"))?,
        _ => return Err(anyhow!("unexpected response shape")),
    };
    if list.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(list)?)
}

// Some backends wrap single entities in an envelope.
fn unwrap_entity(root: Value, keys: &[&str]) -> Value {
    if let Value::Object(map) = &root {
        for key in keys {
            if let Some(inner) = map.get(*key) {
                if inner.is_object() || inner.is_null() {
                    return inner.clone();
                }
            }
        }
    }
    root
}
