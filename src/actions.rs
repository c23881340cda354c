use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::api::PokerApi;
use crate::models::{
    AVATARS, NICKNAME_MAX_CHARS, NewTournament, NewUser, ProfileUpdate, TournamentUpdate,
};
use crate::persist::LocalCache;
use crate::session::{Delta, Session, apply_delta};
use crate::status::{TournamentStatus, derive_status};

pub const GENERIC_NOTICE: &str = "Request failed. Please try again.";
pub const MIN_CAPACITY: u32 = 2;
pub const MAX_CAPACITY: u32 = 1000;

/// Local checks that stop a request before it is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("Nickname cannot be empty")]
    EmptyNickname,
    #[error("Nickname must be at most {0} characters")]
    NicknameTooLong(usize),
    #[error("Register first")]
    NotRegistered,
    #[error("You are already registered")]
    AlreadyRegistered,
    #[error("Only the admin can do that")]
    NotAdmin,
    #[error("Tournament {0} not found")]
    UnknownTournament(u64),
    #[error("Registration for this tournament is closed")]
    RegistrationClosed,
    #[error("You already joined this tournament")]
    AlreadyJoined,
    #[error("Tournament is full")]
    TournamentFull,
    #[error("Tournament name cannot be empty")]
    EmptyTournamentName,
    #[error("Capacity must be between 2 and 1000")]
    InvalidCapacity,
    #[error("Start time must be in the future")]
    StartInPast,
    #[error("Only active tournaments can be finished")]
    NotActive,
}

/// Text shown to the user for a failed action.
pub fn notice_for(err: &anyhow::Error) -> String {
    match err.downcast_ref::<RuleViolation>() {
        Some(rule) => rule.to_string(),
        None => GENERIC_NOTICE.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
    Empty,
}

pub fn validate_nickname(raw: &str) -> Result<String, RuleViolation> {
    let nickname = raw.trim();
    if nickname.is_empty() {
        return Err(RuleViolation::EmptyNickname);
    }
    if nickname.chars().count() > NICKNAME_MAX_CHARS {
        return Err(RuleViolation::NicknameTooLong(NICKNAME_MAX_CHARS));
    }
    Ok(nickname.to_string())
}

pub fn validate_new_tournament(
    form: &NewTournament,
    now: DateTime<Utc>,
) -> Result<NewTournament, RuleViolation> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(RuleViolation::EmptyTournamentName);
    }
    if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&form.max_players) {
        return Err(RuleViolation::InvalidCapacity);
    }
    if form.start_time <= now {
        return Err(RuleViolation::StartInPast);
    }
    Ok(NewTournament {
        name: name.to_string(),
        ..form.clone()
    })
}

fn normalized_profile(form: &ProfileUpdate) -> Result<ProfileUpdate, RuleViolation> {
    let nickname = validate_nickname(&form.nickname)?;
    let avatar = if form.avatar.trim().is_empty() {
        AVATARS[0].to_string()
    } else {
        form.avatar.trim().to_string()
    };
    Ok(ProfileUpdate {
        nickname,
        preferred_game: form.preferred_game,
        avatar,
    })
}

/// Runs user actions against the backend and mirrors results into the session
/// and the local cache. Calls are made one at a time, in program order.
pub struct Dispatcher<'a> {
    api: &'a dyn PokerApi,
    cache: &'a LocalCache,
}

impl<'a> Dispatcher<'a> {
    pub fn new(api: &'a dyn PokerApi, cache: &'a LocalCache) -> Self {
        Self { api, cache }
    }

    /// Initial bulk fetch. Falls back to the local cache when the backend is unreachable.
    pub fn bootstrap(&self, session: &mut Session) -> LoadSource {
        match self.fetch_all(session.identity.telegram_id) {
            Ok(delta) => {
                apply_delta(session, delta);
                session.push_log(format!(
                    "[INFO] Loaded {} players and {} tournaments",
                    session.users.len(),
                    session.tournaments.len()
                ));
                self.cache.save_from_session(session);
                LoadSource::Remote
            }
            Err(err) => {
                session.push_log(format!("[WARN] Initial load failed: {err:#}"));
                apply_delta(session, Delta::Notice(GENERIC_NOTICE.to_string()));
                let Some(cached) = self.cache.load() else {
                    return LoadSource::Empty;
                };
                let current_user = cached
                    .current_user
                    .filter(|u| u.telegram_id == session.identity.telegram_id);
                apply_delta(
                    session,
                    Delta::Bootstrap {
                        users: cached.users,
                        tournaments: cached.tournaments,
                        current_user,
                        offline: true,
                    },
                );
                session.push_log("[INFO] Showing cached data (offline)");
                LoadSource::Cache
            }
        }
    }

    pub fn refresh(&self, session: &mut Session) -> Result<()> {
        let result = self.try_refresh();
        self.finish(session, "Refresh", result)
    }

    pub fn register(&self, session: &mut Session, form: &ProfileUpdate) -> Result<()> {
        let result = self.try_register(session, form);
        self.finish(session, "Register", result)
    }

    pub fn edit_profile(&self, session: &mut Session, form: &ProfileUpdate) -> Result<()> {
        let result = self.try_edit_profile(session, form);
        self.finish(session, "Edit profile", result)
    }

    pub fn create_tournament(&self, session: &mut Session, form: &NewTournament) -> Result<()> {
        let result = self.try_create_tournament(session, form);
        self.finish(session, "Create tournament", result)
    }

    pub fn join_tournament(&self, session: &mut Session, tournament_id: u64) -> Result<()> {
        let result = self.try_join_tournament(session, tournament_id);
        self.finish(session, "Join tournament", result)
    }

    pub fn finish_tournament(&self, session: &mut Session, tournament_id: u64) -> Result<()> {
        let result = self.try_finish_tournament(session, tournament_id);
        self.finish(session, "Finish tournament", result)
    }

    pub fn load_stats(&self, session: &mut Session) -> Result<()> {
        let result = self.try_load_stats(session);
        self.finish(session, "Load stats", result)
    }

    fn fetch_all(&self, telegram_id: i64) -> Result<Delta> {
        let users = self.api.list_users()?;
        let tournaments = self.api.list_tournaments()?;
        let current_user = self.api.get_user(telegram_id)?;
        Ok(Delta::Bootstrap {
            users,
            tournaments,
            current_user,
            offline: false,
        })
    }

    fn try_refresh(&self) -> Result<Vec<Delta>> {
        let users = self.api.list_users()?;
        let tournaments = self.api.list_tournaments()?;
        Ok(vec![
            Delta::SetUsers(users),
            Delta::SetTournaments(tournaments),
        ])
    }

    fn try_register(&self, session: &Session, form: &ProfileUpdate) -> Result<Vec<Delta>> {
        if session.is_registered() {
            return Err(RuleViolation::AlreadyRegistered.into());
        }
        let profile = normalized_profile(form)?;
        let identity = &session.identity;
        let user = self.api.create_user(&NewUser {
            telegram_id: identity.telegram_id,
            username: identity.username.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            nickname: profile.nickname,
            preferred_game: profile.preferred_game,
            avatar: profile.avatar,
        })?;
        let notice = format!("Welcome, {}!", user.nickname);
        Ok(vec![Delta::SetCurrentUser(Some(user)), Delta::Notice(notice)])
    }

    fn try_edit_profile(&self, session: &Session, form: &ProfileUpdate) -> Result<Vec<Delta>> {
        let user_id = session.current_user_id().ok_or(RuleViolation::NotRegistered)?;
        let profile = normalized_profile(form)?;
        let user = self.api.update_user(user_id, &profile)?;
        Ok(vec![
            Delta::UpsertUser(user),
            Delta::Notice("Profile saved".to_string()),
        ])
    }

    fn try_create_tournament(&self, session: &Session, form: &NewTournament) -> Result<Vec<Delta>> {
        if !session.is_admin {
            return Err(RuleViolation::NotAdmin.into());
        }
        let req = validate_new_tournament(form, Utc::now())?;
        let tournament = self.api.create_tournament(&req)?;
        let notice = format!("Created {}", tournament.name);
        Ok(vec![Delta::UpsertTournament(tournament), Delta::Notice(notice)])
    }

    fn try_join_tournament(&self, session: &Session, tournament_id: u64) -> Result<Vec<Delta>> {
        let user_id = session.current_user_id().ok_or(RuleViolation::NotRegistered)?;
        let t = session
            .tournament(tournament_id)
            .ok_or(RuleViolation::UnknownTournament(tournament_id))?;
        if derive_status(t.status, t.start_time, Utc::now()) != TournamentStatus::Upcoming {
            return Err(RuleViolation::RegistrationClosed.into());
        }
        if t.has_participant(user_id) {
            return Err(RuleViolation::AlreadyJoined.into());
        }
        if t.is_full() {
            return Err(RuleViolation::TournamentFull.into());
        }
        let updated = self.api.join_tournament(tournament_id, user_id)?;
        if updated.seats_taken() > updated.max_players {
            return Err(anyhow!("join response exceeds capacity"));
        }
        let notice = format!("Joined {}", updated.name);
        Ok(vec![Delta::UpsertTournament(updated), Delta::Notice(notice)])
    }

    fn try_finish_tournament(&self, session: &Session, tournament_id: u64) -> Result<Vec<Delta>> {
        if !session.is_admin {
            return Err(RuleViolation::NotAdmin.into());
        }
        let t = session
            .tournament(tournament_id)
            .ok_or(RuleViolation::UnknownTournament(tournament_id))?;
        if derive_status(t.status, t.start_time, Utc::now()) != TournamentStatus::Active {
            return Err(RuleViolation::NotActive.into());
        }
        let updated = self.api.update_tournament(
            tournament_id,
            &TournamentUpdate {
                status: TournamentStatus::Finished,
            },
        )?;
        let notice = format!("Finished {}", updated.name);
        Ok(vec![Delta::UpsertTournament(updated), Delta::Notice(notice)])
    }

    fn try_load_stats(&self, session: &Session) -> Result<Vec<Delta>> {
        if !session.is_admin {
            return Err(RuleViolation::NotAdmin.into());
        }
        let stats = self.api.admin_stats()?;
        Ok(vec![Delta::SetStats(stats)])
    }

    fn finish(&self, session: &mut Session, action: &str, result: Result<Vec<Delta>>) -> Result<()> {
        match result {
            Ok(deltas) => {
                for delta in deltas {
                    apply_delta(session, delta);
                }
                session.push_log(format!("[INFO] {action} ok"));
                self.cache.save_from_session(session);
                Ok(())
            }
            Err(err) => {
                session.push_log(format!("[WARN] {action} failed: {err:#}"));
                apply_delta(session, Delta::Notice(notice_for(&err)));
                Err(err)
            }
        }
    }
}
