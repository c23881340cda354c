use chrono::{Duration, Utc};

use poker_lobby::actions::{Dispatcher, GENERIC_NOTICE, LoadSource, RuleViolation};
use poker_lobby::api::PokerApi;
use poker_lobby::demo_api::DemoApi;
use poker_lobby::models::{
    GameType, NewTournament, PlatformIdentity, ProfileUpdate, Tournament, TournamentUpdate, User,
    UserStats,
};
use poker_lobby::persist::LocalCache;
use poker_lobby::session::Session;
use poker_lobby::status::TournamentStatus;

const ADMIN_ID: i64 = 100_000_001;
const PLAYER_ID: i64 = 555;

fn temp_cache(name: &str) -> LocalCache {
    let mut path = std::env::temp_dir();
    path.push(format!("poker_lobby_test_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&path);
    path.push("cache.json");
    LocalCache::at(path)
}

fn identity(telegram_id: i64) -> PlatformIdentity {
    PlatformIdentity {
        telegram_id,
        username: Some("tester".to_string()),
        first_name: "Test".to_string(),
        last_name: None,
    }
}

fn registered(id: u64, telegram_id: i64) -> User {
    User {
        id,
        telegram_id,
        username: None,
        first_name: "Reg".to_string(),
        last_name: None,
        nickname: format!("Reg{id}"),
        preferred_game: GameType::Omaha,
        avatar: "king".to_string(),
        stats: UserStats::default(),
    }
}

fn tournament(id: u64, start_in_hours: i64, max_players: u32, participants: &[u64]) -> Tournament {
    Tournament {
        id,
        name: format!("T{id}"),
        start_time: Utc::now() + Duration::hours(start_in_hours),
        status: TournamentStatus::Upcoming,
        max_players,
        prize: 1_000,
        game_type: GameType::Holdem,
        participants: participants.to_vec(),
    }
}

fn profile(nickname: &str) -> ProfileUpdate {
    ProfileUpdate {
        nickname: nickname.to_string(),
        preferred_game: GameType::ShortDeck,
        avatar: String::new(),
    }
}

fn rule(err: &anyhow::Error) -> Option<&RuleViolation> {
    err.downcast_ref::<RuleViolation>()
}

#[test]
fn register_then_join_upcoming_tournament() {
    let api = DemoApi::with_data(vec![registered(1, 999)], vec![tournament(7, 2, 3, &[1])]);
    let cache = temp_cache("register_join");
    let dispatcher = Dispatcher::new(&api, &cache);
    let mut session = Session::new(identity(PLAYER_ID), ADMIN_ID);

    assert_eq!(dispatcher.bootstrap(&mut session), LoadSource::Remote);
    assert!(!session.is_registered());

    dispatcher
        .register(&mut session, &profile("  RiverKing  "))
        .expect("register should succeed");
    let me = session.current_user.clone().expect("current user set");
    assert_eq!(me.nickname, "RiverKing");
    assert_eq!(me.telegram_id, PLAYER_ID);
    assert_eq!(me.avatar, "ace");
    assert_eq!(me.preferred_game, GameType::ShortDeck);

    dispatcher
        .join_tournament(&mut session, 7)
        .expect("join should succeed");
    let t = session.tournament(7).expect("tournament present");
    assert!(t.has_participant(me.id));
    assert!(t.seats_taken() <= t.max_players);
    assert_eq!(session.notice.as_deref(), Some("Joined T7"));

    let err = dispatcher.join_tournament(&mut session, 7).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::AlreadyJoined));
}

#[test]
fn join_is_rejected_locally_when_full_closed_or_unregistered() {
    let mut started = tournament(2, -1, 9, &[]);
    started.status = TournamentStatus::Active;
    let api = DemoApi::with_data(
        vec![registered(1, PLAYER_ID), registered(2, 2), registered(3, 3)],
        vec![tournament(1, 3, 2, &[2, 3]), started, tournament(3, 3, 9, &[])],
    );
    let cache = LocalCache::disabled();
    let dispatcher = Dispatcher::new(&api, &cache);

    let mut guest = Session::new(identity(4242), ADMIN_ID);
    dispatcher.bootstrap(&mut guest);
    let err = dispatcher.join_tournament(&mut guest, 3).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::NotRegistered));

    let mut session = Session::new(identity(PLAYER_ID), ADMIN_ID);
    dispatcher.bootstrap(&mut session);
    assert!(session.is_registered());

    let err = dispatcher.join_tournament(&mut session, 1).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::TournamentFull));
    assert_eq!(session.notice.as_deref(), Some("Tournament is full"));

    let err = dispatcher.join_tournament(&mut session, 2).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::RegistrationClosed));

    let err = dispatcher.join_tournament(&mut session, 99).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::UnknownTournament(99)));

    assert_eq!(session.tournament(1).map(|t| t.seats_taken()), Some(2));
}

#[test]
fn register_rejects_blank_and_long_nicknames() {
    let api = DemoApi::empty();
    let cache = LocalCache::disabled();
    let dispatcher = Dispatcher::new(&api, &cache);
    let mut session = Session::new(identity(PLAYER_ID), ADMIN_ID);
    dispatcher.bootstrap(&mut session);

    let err = dispatcher.register(&mut session, &profile("   ")).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::EmptyNickname));

    let long = "x".repeat(25);
    let err = dispatcher.register(&mut session, &profile(&long)).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::NicknameTooLong(24)));

    assert!(api.list_users().expect("demo api reachable").is_empty());
    assert!(session.logs.iter().any(|l| l.starts_with("[WARN] Register failed")));
}

#[test]
fn edit_profile_updates_session_and_backend() {
    let api = DemoApi::with_data(vec![registered(1, PLAYER_ID)], Vec::new());
    let cache = LocalCache::disabled();
    let dispatcher = Dispatcher::new(&api, &cache);
    let mut session = Session::new(identity(PLAYER_ID), ADMIN_ID);
    dispatcher.bootstrap(&mut session);

    let form = ProfileUpdate {
        nickname: "NewName".to_string(),
        preferred_game: GameType::Holdem,
        avatar: "shark".to_string(),
    };
    dispatcher
        .edit_profile(&mut session, &form)
        .expect("edit should succeed");
    assert_eq!(
        session.current_user.as_ref().map(|u| u.nickname.as_str()),
        Some("NewName")
    );
    let remote = api
        .get_user(PLAYER_ID)
        .expect("demo api reachable")
        .expect("user exists");
    assert_eq!(remote.avatar, "shark");
}

#[test]
fn admin_only_actions_are_guarded() {
    let api = DemoApi::with_data(Vec::new(), vec![tournament(1, -1, 9, &[])]);
    let cache = LocalCache::disabled();
    let dispatcher = Dispatcher::new(&api, &cache);
    let mut session = Session::new(identity(PLAYER_ID), ADMIN_ID);
    dispatcher.bootstrap(&mut session);

    let form = NewTournament {
        name: "Mine".to_string(),
        start_time: Utc::now() + Duration::days(1),
        max_players: 9,
        prize: 100,
        game_type: GameType::Omaha,
    };
    let err = dispatcher.create_tournament(&mut session, &form).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::NotAdmin));
    let err = dispatcher.finish_tournament(&mut session, 1).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::NotAdmin));
    let err = dispatcher.load_stats(&mut session).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::NotAdmin));
    assert!(session.stats.is_none());
}

#[test]
fn admin_creates_finishes_and_loads_stats() {
    let api = DemoApi::with_data(vec![registered(1, ADMIN_ID)], vec![tournament(1, -1, 9, &[])]);
    let cache = LocalCache::disabled();
    let dispatcher = Dispatcher::new(&api, &cache);
    let mut session = Session::new(identity(ADMIN_ID), ADMIN_ID);
    dispatcher.bootstrap(&mut session);
    assert!(session.is_admin);
    assert_eq!(
        session.tournament(1).map(|t| t.status),
        Some(TournamentStatus::Active)
    );

    let mut form = NewTournament {
        name: "  Late Night  ".to_string(),
        start_time: Utc::now() + Duration::hours(4),
        max_players: 1,
        prize: 750,
        game_type: GameType::Omaha,
    };
    let err = dispatcher.create_tournament(&mut session, &form).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::InvalidCapacity));

    form.max_players = 8;
    dispatcher
        .create_tournament(&mut session, &form)
        .expect("create should succeed");
    let created = session
        .tournaments
        .iter()
        .find(|t| t.name == "Late Night")
        .expect("created tournament mirrored");
    assert_eq!(created.status, TournamentStatus::Upcoming);
    let created_id = created.id;

    let err = dispatcher.finish_tournament(&mut session, created_id).unwrap_err();
    assert_eq!(rule(&err), Some(&RuleViolation::NotActive));

    dispatcher
        .finish_tournament(&mut session, 1)
        .expect("finish should succeed");
    assert_eq!(
        session.tournament(1).map(|t| t.status),
        Some(TournamentStatus::Finished)
    );

    dispatcher
        .load_stats(&mut session)
        .expect("stats should load");
    let stats = session.stats.expect("stats stored");
    assert_eq!(stats.total_tournaments, 2);
    assert_eq!(stats.finished_tournaments, 1);
    assert_eq!(stats.total_prize_pool, 1_750);
}

#[test]
fn bootstrap_falls_back_to_cache_when_backend_is_down() {
    let cache = temp_cache("fallback");
    let api = DemoApi::with_data(vec![registered(1, PLAYER_ID)], vec![tournament(1, 3, 9, &[])]);
    let dispatcher = Dispatcher::new(&api, &cache);
    let mut first = Session::new(identity(PLAYER_ID), ADMIN_ID);
    assert_eq!(dispatcher.bootstrap(&mut first), LoadSource::Remote);

    api.set_unreachable(true);
    let mut second = Session::new(identity(PLAYER_ID), ADMIN_ID);
    assert_eq!(dispatcher.bootstrap(&mut second), LoadSource::Cache);
    assert!(second.offline);
    assert_eq!(second.notice.as_deref(), Some(GENERIC_NOTICE));
    assert_eq!(second.users.len(), 1);
    assert_eq!(second.tournaments.len(), 1);
    assert_eq!(second.current_user_id(), Some(1));

    // Only the initial load falls back; later calls just report the failure.
    let err = dispatcher.refresh(&mut second);
    assert!(err.is_err());
    assert_eq!(second.notice.as_deref(), Some(GENERIC_NOTICE));
}

#[test]
fn bootstrap_without_cache_reports_empty() {
    let api = DemoApi::empty();
    api.set_unreachable(true);
    let cache = temp_cache("empty");
    let dispatcher = Dispatcher::new(&api, &cache);
    let mut session = Session::new(identity(PLAYER_ID), ADMIN_ID);
    assert_eq!(dispatcher.bootstrap(&mut session), LoadSource::Empty);
    assert!(session.users.is_empty());
    assert_eq!(session.notice.as_deref(), Some(GENERIC_NOTICE));
}

#[test]
fn cached_current_user_of_another_identity_is_ignored() {
    let cache = temp_cache("other_identity");
    let api = DemoApi::with_data(vec![registered(1, PLAYER_ID)], Vec::new());
    let dispatcher = Dispatcher::new(&api, &cache);
    let mut first = Session::new(identity(PLAYER_ID), ADMIN_ID);
    dispatcher.bootstrap(&mut first);

    api.set_unreachable(true);
    let mut other = Session::new(identity(777), ADMIN_ID);
    assert_eq!(dispatcher.bootstrap(&mut other), LoadSource::Cache);
    assert!(other.current_user.is_none());
}

#[test]
fn demo_backend_closes_registration_once_start_time_passes() {
    let api = DemoApi::with_data(
        vec![registered(1, PLAYER_ID)],
        vec![tournament(1, -1, 9, &[]), tournament(2, 2, 9, &[])],
    );

    let err = api.join_tournament(1, 1);
    assert!(err.is_err(), "join after start should be rejected");
    assert!(
        api.list_tournaments()
            .expect("demo api reachable")
            .iter()
            .all(|t| t.participants.is_empty())
    );

    let stats = api.admin_stats().expect("demo api reachable");
    assert_eq!(stats.active_tournaments, 1);

    let finished = api
        .update_tournament(
            1,
            &TournamentUpdate {
                status: TournamentStatus::Finished,
            },
        )
        .expect("active tournament can finish");
    assert_eq!(finished.status, TournamentStatus::Finished);

    let joined = api.join_tournament(2, 1).expect("upcoming join accepted");
    assert_eq!(joined.status, TournamentStatus::Upcoming);
    assert_eq!(joined.participants, vec![1]);
}
