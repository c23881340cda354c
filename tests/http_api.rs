use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use chrono::{Duration, Utc};

use poker_lobby::api::{HttpApi, PokerApi, connect};
use poker_lobby::config::ClientConfig;
use poker_lobby::models::{GameType, NewTournament, NewUser, ProfileUpdate, TournamentUpdate};
use poker_lobby::status::TournamentStatus;

const USER_JSON: &str = r#"{"id":3,"telegram_id":555,"nickname":"Ace"}"#;
const TOURNAMENT_JSON: &str =
    r#"{"id":9,"name":"Nightly","start_time":"2026-06-01T20:00:00Z","max_players":9}"#;

struct Recorded {
    request_line: String,
    body: String,
}

/// Answers one connection per canned response, in order, and records what was asked.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (stream, _) = listener.accept().expect("accept connection");
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("read request line");
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header");
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut payload = vec![0u8; content_length];
            reader.read_exact(&mut payload).expect("read body");

            let reason = match status {
                200 | 201 => "OK",
                404 => "Not Found",
                _ => "Internal Server Error",
            };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream
                .write_all(response.as_bytes())
                .expect("write response");
            let _ = stream.flush();

            let request_line = request_line
                .trim_end()
                .rsplit_once(' ')
                .map(|(head, _)| head.to_string())
                .unwrap_or_default();
            seen.push(Recorded {
                request_line,
                body: String::from_utf8_lossy(&payload).into_owned(),
            });
        }
        seen
    });
    (format!("http://{addr}/api/"), handle)
}

#[test]
fn every_operation_uses_its_endpoint() {
    let (base, server) = serve(vec![
        (200, "[]"),
        (200, USER_JSON),
        (201, USER_JSON),
        (200, USER_JSON),
        (200, r#"{"tournaments":[]}"#),
        (201, TOURNAMENT_JSON),
        (200, TOURNAMENT_JSON),
        (200, TOURNAMENT_JSON),
        (200, r#"{"total_users":1}"#),
    ]);
    let api = HttpApi::new(&base, 5).expect("client builds");

    assert!(api.list_users().expect("list users").is_empty());
    let user = api.get_user(555).expect("get user").expect("user present");
    assert_eq!(user.id, 3);
    api.create_user(&NewUser {
        telegram_id: 555,
        username: None,
        first_name: "A".to_string(),
        last_name: None,
        nickname: "Ace".to_string(),
        preferred_game: GameType::Holdem,
        avatar: "ace".to_string(),
    })
    .expect("create user");
    api.update_user(
        3,
        &ProfileUpdate {
            nickname: "Ace".to_string(),
            preferred_game: GameType::Omaha,
            avatar: "king".to_string(),
        },
    )
    .expect("update user");
    assert!(api.list_tournaments().expect("list tournaments").is_empty());
    api.create_tournament(&NewTournament {
        name: "Nightly".to_string(),
        start_time: Utc::now() + Duration::hours(2),
        max_players: 9,
        prize: 100,
        game_type: GameType::Holdem,
    })
    .expect("create tournament");
    api.update_tournament(
        9,
        &TournamentUpdate {
            status: TournamentStatus::Finished,
        },
    )
    .expect("update tournament");
    api.join_tournament(9, 3).expect("join tournament");
    assert_eq!(api.admin_stats().expect("stats").total_users, 1);

    let seen = server.join().expect("server thread");
    let lines: Vec<&str> = seen.iter().map(|r| r.request_line.as_str()).collect();
    assert_eq!(
        lines,
        vec![
            "GET /api/users",
            "GET /api/users/555",
            "POST /api/users",
            "PUT /api/users/3",
            "GET /api/tournaments",
            "POST /api/tournaments",
            "PUT /api/tournaments/9",
            "POST /api/tournaments/9/join",
            "GET /api/stats",
        ]
    );
    assert!(seen[2].body.contains(r#""telegram_id":555"#));
    assert!(seen[3].body.contains(r#""preferred_game":"omaha""#));
    assert!(seen[6].body.contains(r#""status":"finished""#));
    assert_eq!(seen[7].body, r#"{"user_id":3}"#);
}

#[test]
fn missing_user_is_none() {
    let (base, server) = serve(vec![(404, r#"{"error":"not found"}"#)]);
    let api = HttpApi::new(&base, 5).expect("client builds");
    assert!(api.get_user(777).expect("404 is not an error").is_none());
    server.join().expect("server thread");
}

#[test]
fn server_errors_surface_as_errors() {
    let (base, server) = serve(vec![(500, r#"{"error":"boom"}"#), (404, "")]);
    let api = HttpApi::new(&base, 5).expect("client builds");
    let err = api.list_users().expect_err("500 should fail");
    assert!(format!("{err:#}").contains("500"));
    assert!(api.admin_stats().is_err(), "404 outside get_user should fail");
    server.join().expect("server thread");
}

#[test]
fn connect_picks_backend_from_config() {
    let demo = connect(&ClientConfig::default()).expect("demo backend");
    assert!(!demo.list_tournaments().expect("seeded").is_empty());

    let config = ClientConfig {
        api_url: Some("   ".to_string()),
        ..ClientConfig::default()
    };
    assert!(connect(&config).is_err());
}
