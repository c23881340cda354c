use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::TournamentStatus;

pub const NICKNAME_MAX_CHARS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    #[default]
    Holdem,
    Omaha,
    ShortDeck,
    #[serde(other)]
    Other,
}

impl GameType {
    pub const SELECTABLE: [GameType; 3] = [GameType::Holdem, GameType::Omaha, GameType::ShortDeck];

    pub fn label(self) -> &'static str {
        match self {
            GameType::Holdem => "Texas Hold'em",
            GameType::Omaha => "Omaha",
            GameType::ShortDeck => "Short Deck",
            GameType::Other => "Other",
        }
    }

    pub fn next(self) -> Self {
        match self {
            GameType::Holdem => GameType::Omaha,
            GameType::Omaha => GameType::ShortDeck,
            GameType::ShortDeck | GameType::Other => GameType::Holdem,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub points: u64,
}

impl UserStats {
    /// Win rate in percent; zero when no games were played.
    pub fn win_rate(&self) -> f32 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins as f32 * 100.0 / self.games_played as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub nickname: String,
    #[serde(default)]
    pub preferred_game: GameType,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub stats: UserStats,
}

impl User {
    pub fn display_name(&self) -> &str {
        if self.nickname.trim().is_empty() {
            &self.first_name
        } else {
            &self.nickname
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: u64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub status: TournamentStatus,
    pub max_players: u32,
    #[serde(default)]
    pub prize: u64,
    #[serde(default)]
    pub game_type: GameType,
    #[serde(default)]
    pub participants: Vec<u64>,
}

impl Tournament {
    pub fn seats_taken(&self) -> u32 {
        self.participants.len() as u32
    }

    pub fn is_full(&self) -> bool {
        self.seats_taken() >= self.max_players
    }

    pub fn has_participant(&self, user_id: u64) -> bool {
        self.participants.contains(&user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_tournaments: u64,
    #[serde(default)]
    pub active_tournaments: u64,
    #[serde(default)]
    pub finished_tournaments: u64,
    #[serde(default)]
    pub total_prize_pool: u64,
}

/// Platform identity of whoever is running the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformIdentity {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub nickname: String,
    pub preferred_game: GameType,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub nickname: String,
    pub preferred_game: GameType,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTournament {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub max_players: u32,
    pub prize: u64,
    pub game_type: GameType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentUpdate {
    pub status: TournamentStatus,
}

pub const AVATARS: [&str; 8] = ["ace", "king", "queen", "jack", "joker", "chip", "dice", "shark"];

pub fn avatar_glyph(avatar: &str) -> &'static str {
    match avatar {
        "ace" => "🂡",
        "king" => "♚",
        "queen" => "♛",
        "jack" => "♞",
        "joker" => "🃏",
        "chip" => "◉",
        "dice" => "🎲",
        "shark" => "🦈",
        _ => "?",
    }
}

pub fn next_avatar(current: &str) -> &'static str {
    let idx = AVATARS.iter().position(|a| *a == current);
    match idx {
        Some(i) => AVATARS[(i + 1) % AVATARS.len()],
        None => AVATARS[0],
    }
}
