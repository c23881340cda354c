use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::api::PokerApi;
use crate::models::{
    AVATARS, AdminStats, GameType, NewTournament, NewUser, ProfileUpdate, Tournament,
    TournamentUpdate, User, UserStats,
};
use crate::status::{TournamentStatus, refresh_statuses};

#[derive(Debug)]
struct DemoStore {
    users: Vec<User>,
    tournaments: Vec<Tournament>,
    next_user_id: u64,
    next_tournament_id: u64,
}

/// In-memory stand-in for the remote backend.
#[derive(Debug)]
pub struct DemoApi {
    store: Mutex<DemoStore>,
    unreachable: AtomicBool,
}

const DEMO_NICKNAMES: [&str; 8] = [
    "RiverRat",
    "NutsOnly",
    "FoldEquity",
    "TiltProof",
    "CheckRaise",
    "SlowRoll",
    "DonkBet",
    "AllInAndy",
];

impl DemoApi {
    pub fn empty() -> Self {
        Self::with_data(Vec::new(), Vec::new())
    }

    pub fn with_data(users: Vec<User>, tournaments: Vec<Tournament>) -> Self {
        let next_user_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let next_tournament_id = tournaments.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            store: Mutex::new(DemoStore {
                users,
                tournaments,
                next_user_id,
                next_tournament_id,
            }),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Sample players with random stats and a handful of tournaments around `now`.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let users = DEMO_NICKNAMES
            .iter()
            .enumerate()
            .map(|(i, nick)| {
                let games_played = rng.gen_range(0..400u32);
                let wins = if games_played == 0 {
                    0
                } else {
                    rng.gen_range(0..=games_played / 3)
                };
                User {
                    id: i as u64 + 1,
                    telegram_id: 200_000_000 + i as i64,
                    username: Some(nick.to_lowercase()),
                    first_name: (*nick).to_string(),
                    last_name: None,
                    nickname: (*nick).to_string(),
                    preferred_game: GameType::SELECTABLE[i % GameType::SELECTABLE.len()],
                    avatar: AVATARS[i % AVATARS.len()].to_string(),
                    stats: UserStats {
                        wins,
                        games_played,
                        points: rng.gen_range(0..14_000u64),
                    },
                }
            })
            .collect::<Vec<_>>();

        let mut finished = demo_tournament(
            5,
            "Weekly Freeroll",
            now - Duration::days(3),
            50,
            500,
            GameType::Holdem,
            &[1, 2, 3, 4, 5],
        );
        finished.status = TournamentStatus::Finished;
        let tournaments = vec![
            demo_tournament(
                1,
                "Sunday Million",
                now + Duration::days(2),
                100,
                10_000,
                GameType::Holdem,
                &[1, 2, 3],
            ),
            demo_tournament(
                2,
                "Omaha Madness",
                now + Duration::hours(3),
                9,
                1_500,
                GameType::Omaha,
                &[2, 4, 5, 6, 7, 8],
            ),
            demo_tournament(
                3,
                "Turbo Hold'em",
                now - Duration::minutes(20),
                18,
                2_500,
                GameType::Holdem,
                &[1, 4, 6],
            ),
            demo_tournament(
                4,
                "Short Deck Sprint",
                now + Duration::days(1),
                6,
                800,
                GameType::ShortDeck,
                &[],
            ),
            finished,
        ];
        Self::with_data(users, tournaments)
    }

    /// Makes every call fail, as if the network were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Locks the store with every tournament status brought up to date.
    fn store(&self) -> Result<std::sync::MutexGuard<'_, DemoStore>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(anyhow!("request failed: backend unreachable"));
        }
        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow!("demo store lock poisoned"))?;
        refresh_statuses(&mut store.tournaments, Utc::now());
        Ok(store)
    }
}

fn demo_tournament(
    id: u64,
    name: &str,
    start_time: DateTime<Utc>,
    max_players: u32,
    prize: u64,
    game_type: GameType,
    participants: &[u64],
) -> Tournament {
    Tournament {
        id,
        name: name.to_string(),
        start_time,
        status: TournamentStatus::Upcoming,
        max_players,
        prize,
        game_type,
        participants: participants.to_vec(),
    }
}

impl PokerApi for DemoApi {
    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store()?.users.clone())
    }

    fn get_user(&self, telegram_id: i64) -> Result<Option<User>> {
        Ok(self
            .store()?
            .users
            .iter()
            .find(|u| u.telegram_id == telegram_id)
            .cloned())
    }

    fn create_user(&self, req: &NewUser) -> Result<User> {
        let mut store = self.store()?;
        if store.users.iter().any(|u| u.telegram_id == req.telegram_id) {
            return Err(anyhow!("http 409 Conflict: user already registered"));
        }
        let user = User {
            id: store.next_user_id,
            telegram_id: req.telegram_id,
            username: req.username.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            nickname: req.nickname.clone(),
            preferred_game: req.preferred_game,
            avatar: req.avatar.clone(),
            stats: UserStats::default(),
        };
        store.next_user_id += 1;
        store.users.push(user.clone());
        Ok(user)
    }

    fn update_user(&self, user_id: u64, req: &ProfileUpdate) -> Result<User> {
        let mut store = self.store()?;
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| anyhow!("http 404 Not Found: user {user_id}"))?;
        user.nickname = req.nickname.clone();
        user.preferred_game = req.preferred_game;
        user.avatar = req.avatar.clone();
        Ok(user.clone())
    }

    fn list_tournaments(&self) -> Result<Vec<Tournament>> {
        Ok(self.store()?.tournaments.clone())
    }

    fn create_tournament(&self, req: &NewTournament) -> Result<Tournament> {
        let mut store = self.store()?;
        let tournament = Tournament {
            id: store.next_tournament_id,
            name: req.name.clone(),
            start_time: req.start_time,
            status: TournamentStatus::Upcoming,
            max_players: req.max_players,
            prize: req.prize,
            game_type: req.game_type,
            participants: Vec::new(),
        };
        store.next_tournament_id += 1;
        store.tournaments.push(tournament.clone());
        Ok(tournament)
    }

    fn update_tournament(&self, tournament_id: u64, req: &TournamentUpdate) -> Result<Tournament> {
        let mut store = self.store()?;
        let t = store
            .tournaments
            .iter_mut()
            .find(|t| t.id == tournament_id)
            .ok_or_else(|| anyhow!("http 404 Not Found: tournament {tournament_id}"))?;
        if !t.status.can_transition_to(req.status) {
            return Err(anyhow!("http 409 Conflict: status cannot move backward"));
        }
        t.status = req.status;
        Ok(t.clone())
    }

    fn join_tournament(&self, tournament_id: u64, user_id: u64) -> Result<Tournament> {
        let mut store = self.store()?;
        if !store.users.iter().any(|u| u.id == user_id) {
            return Err(anyhow!("http 404 Not Found: user {user_id}"));
        }
        let t = store
            .tournaments
            .iter_mut()
            .find(|t| t.id == tournament_id)
            .ok_or_else(|| anyhow!("http 404 Not Found: tournament {tournament_id}"))?;
        if t.status != TournamentStatus::Upcoming || t.is_full() {
            return Err(anyhow!("http 409 Conflict: registration closed"));
        }
        if !t.has_participant(user_id) {
            t.participants.push(user_id);
        }
        Ok(t.clone())
    }

    fn admin_stats(&self) -> Result<AdminStats> {
        let store = self.store()?;
        let count = |status: TournamentStatus| {
            store
                .tournaments
                .iter()
                .filter(|t| t.status == status)
                .count() as u64
        };
        Ok(AdminStats {
            total_users: store.users.len() as u64,
            total_tournaments: store.tournaments.len() as u64,
            active_tournaments: count(TournamentStatus::Active),
            finished_tournaments: count(TournamentStatus::Finished),
            total_prize_pool: store.tournaments.iter().map(|t| t.prize).sum(),
        })
    }
}
