use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::models::{AdminStats, PlatformIdentity, Tournament, User};
use crate::status::refresh_statuses;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Tournaments,
    Leaderboard,
    Profile,
    Admin,
}

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Screen::Tournaments => "TOURNAMENTS",
            Screen::Leaderboard => "LEADERBOARD",
            Screen::Profile => "PROFILE",
            Screen::Admin => "ADMIN",
        }
    }
}

/// Everything the client knows about the current run. Passed explicitly to
/// actions and views; mutated only through [`apply_delta`].
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: PlatformIdentity,
    pub admin_id: i64,
    pub current_user: Option<User>,
    pub is_admin: bool,
    pub users: Vec<User>,
    pub tournaments: Vec<Tournament>,
    pub stats: Option<AdminStats>,
    pub offline: bool,
    pub notice: Option<String>,
    pub logs: VecDeque<String>,
    pub screen: Screen,
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub enum Delta {
    Bootstrap {
        users: Vec<User>,
        tournaments: Vec<Tournament>,
        current_user: Option<User>,
        offline: bool,
    },
    SetUsers(Vec<User>),
    SetTournaments(Vec<Tournament>),
    UpsertUser(User),
    SetCurrentUser(Option<User>),
    UpsertTournament(Tournament),
    SetStats(AdminStats),
    Notice(String),
    Log(String),
}

impl Session {
    pub fn new(identity: PlatformIdentity, admin_id: i64) -> Self {
        let is_admin = identity.telegram_id == admin_id;
        Self {
            identity,
            admin_id,
            current_user: None,
            is_admin,
            users: Vec::with_capacity(64),
            tournaments: Vec::with_capacity(32),
            stats: None,
            offline: false,
            notice: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            screen: Screen::Tournaments,
            selected: 0,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn current_user_id(&self) -> Option<u64> {
        self.current_user.as_ref().map(|u| u.id)
    }

    pub fn tournament(&self, id: u64) -> Option<&Tournament> {
        self.tournaments.iter().find(|t| t.id == id)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.selected = 0;
        }
    }

    /// Promotes tournaments whose start time has passed. Run once per render pass.
    pub fn refresh_statuses(&mut self, now: DateTime<Utc>) {
        let promoted = refresh_statuses(&mut self.tournaments, now);
        for id in promoted {
            self.push_log(format!("[INFO] Tournament {id} is now active"));
        }
    }

    fn set_current_user(&mut self, user: Option<User>) {
        self.is_admin = self.identity.telegram_id == self.admin_id;
        if let Some(user) = &user {
            self.is_admin = user.telegram_id == self.admin_id;
            upsert_user(&mut self.users, user.clone());
        }
        self.current_user = user;
    }
}

pub fn apply_delta(session: &mut Session, delta: Delta) {
    match delta {
        Delta::Bootstrap {
            users,
            tournaments,
            current_user,
            offline,
        } => {
            session.users = users;
            session.tournaments = Vec::with_capacity(tournaments.len());
            for t in tournaments {
                upsert_tournament(&mut session.tournaments, t);
            }
            session.offline = offline;
            session.set_current_user(current_user);
            session.selected = 0;
            session.refresh_statuses(Utc::now());
        }
        Delta::SetUsers(users) => {
            session.users = users;
            // The current user may be newer than the list snapshot.
            if let Some(current) = session.current_user.clone() {
                match session.users.iter().find(|u| u.id == current.id) {
                    Some(fresh) => session.current_user = Some(fresh.clone()),
                    None => session.users.push(current),
                }
            }
            session.offline = false;
        }
        Delta::SetTournaments(tournaments) => {
            let previous = std::mem::take(&mut session.tournaments);
            for mut t in tournaments {
                // A stale snapshot never moves a known tournament backward.
                if let Some(prev) = previous.iter().find(|p| p.id == t.id) {
                    if !prev.status.can_transition_to(t.status) {
                        t.status = prev.status;
                    }
                }
                upsert_tournament(&mut session.tournaments, t);
            }
            session.offline = false;
            session.refresh_statuses(Utc::now());
        }
        Delta::UpsertUser(user) => {
            if session.current_user_id() == Some(user.id) {
                session.set_current_user(Some(user));
            } else {
                upsert_user(&mut session.users, user);
            }
        }
        Delta::SetCurrentUser(user) => session.set_current_user(user),
        Delta::UpsertTournament(t) => {
            upsert_tournament(&mut session.tournaments, t);
            session.refresh_statuses(Utc::now());
        }
        Delta::SetStats(stats) => session.stats = Some(stats),
        Delta::Notice(msg) => session.notice = Some(msg),
        Delta::Log(msg) => session.push_log(msg),
    }
}

fn upsert_user(users: &mut Vec<User>, user: User) {
    match users.iter_mut().find(|u| u.id == user.id) {
        Some(existing) => *existing = user,
        None => users.push(user),
    }
}

fn upsert_tournament(tournaments: &mut Vec<Tournament>, mut t: Tournament) {
    match tournaments.iter_mut().find(|existing| existing.id == t.id) {
        Some(existing) => {
            if !existing.status.can_transition_to(t.status) {
                t.status = existing.status;
            }
            *existing = t;
        }
        None => tournaments.push(t),
    }
}
