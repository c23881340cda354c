use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::models::{AdminStats, Tournament, User, avatar_glyph};
use crate::rank::{points_to_next, rank_for_points, sort_by_points};
use crate::session::Session;
use crate::status::TournamentStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct TournamentCard {
    pub id: u64,
    pub name: String,
    pub status: TournamentStatus,
    pub status_label: &'static str,
    pub start_label: String,
    pub starts_in: String,
    pub seats_label: String,
    pub prize_label: String,
    pub game_label: &'static str,
    pub joined: bool,
    pub can_join: bool,
    pub can_finish: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub position: usize,
    pub user_id: u64,
    pub nickname: String,
    pub avatar: &'static str,
    pub points: u64,
    pub rank_label: &'static str,
    pub wins: u32,
    pub games: u32,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub nickname: String,
    pub avatar: &'static str,
    pub avatar_key: String,
    pub game_label: &'static str,
    pub rank_label: &'static str,
    pub points: u64,
    pub next_rank_label: String,
    pub win_rate_label: String,
    pub wins: u32,
    pub games: u32,
    pub tournaments_joined: usize,
}

/// Everything one render pass needs.
#[derive(Debug, Clone, PartialEq)]
pub struct LobbyView {
    pub tournaments: Vec<TournamentCard>,
    pub leaderboard: Vec<LeaderboardRow>,
    pub profile: Option<ProfileView>,
    pub stats: Option<AdminStats>,
    pub is_admin: bool,
    pub offline: bool,
    pub notice: Option<String>,
}

/// Runs the status deriver over the session once, then builds the view models.
pub fn render_pass(session: &mut Session, now: DateTime<Utc>, offset: FixedOffset) -> LobbyView {
    session.refresh_statuses(now);
    LobbyView {
        tournaments: tournament_cards(session, now, offset),
        leaderboard: leaderboard_rows(session),
        profile: profile_view(session),
        stats: if session.is_admin { session.stats } else { None },
        is_admin: session.is_admin,
        offline: session.offline,
        notice: session.notice.clone(),
    }
}

pub fn display_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

pub fn tournament_cards(
    session: &Session,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<TournamentCard> {
    let user_id = session.current_user_id();
    let mut ordered: Vec<&Tournament> = session.tournaments.iter().collect();
    ordered.sort_by(|a, b| {
        status_order(a.status)
            .cmp(&status_order(b.status))
            .then(a.start_time.cmp(&b.start_time))
            .then(a.id.cmp(&b.id))
    });

    ordered
        .into_iter()
        .map(|t| {
            let joined = user_id.is_some_and(|id| t.has_participant(id));
            TournamentCard {
                id: t.id,
                name: t.name.clone(),
                status: t.status,
                status_label: t.status.label(),
                start_label: format_start(t.start_time, offset),
                starts_in: starts_in_label(t.start_time, now),
                seats_label: format!("{}/{}", t.seats_taken(), t.max_players),
                prize_label: format_prize(t.prize),
                game_label: t.game_type.label(),
                joined,
                can_join: user_id.is_some()
                    && t.status == TournamentStatus::Upcoming
                    && !joined
                    && !t.is_full(),
                can_finish: session.is_admin && t.status == TournamentStatus::Active,
            }
        })
        .collect()
}

pub fn leaderboard_rows(session: &Session) -> Vec<LeaderboardRow> {
    let current = session.current_user_id();
    let mut users: Vec<User> = session.users.clone();
    sort_by_points(&mut users);
    users
        .into_iter()
        .enumerate()
        .map(|(idx, u)| LeaderboardRow {
            position: idx + 1,
            user_id: u.id,
            nickname: u.display_name().to_string(),
            avatar: avatar_glyph(&u.avatar),
            points: u.stats.points,
            rank_label: rank_for_points(u.stats.points).label(),
            wins: u.stats.wins,
            games: u.stats.games_played,
            is_current: current == Some(u.id),
        })
        .collect()
}

pub fn profile_view(session: &Session) -> Option<ProfileView> {
    let user = session.current_user.as_ref()?;
    let points = user.stats.points;
    let next_rank_label = match points_to_next(points) {
        Some(missing) => format!(
            "{} pts to {}",
            format_thousands(missing),
            rank_for_points(points + missing).label()
        ),
        None => "Top rank reached".to_string(),
    };
    Some(ProfileView {
        nickname: user.display_name().to_string(),
        avatar: avatar_glyph(&user.avatar),
        avatar_key: user.avatar.clone(),
        game_label: user.preferred_game.label(),
        rank_label: rank_for_points(points).label(),
        points,
        next_rank_label,
        win_rate_label: format!("{:.1}%", user.stats.win_rate()),
        wins: user.stats.wins,
        games: user.stats.games_played,
        tournaments_joined: session
            .tournaments
            .iter()
            .filter(|t| t.has_participant(user.id))
            .count(),
    })
}

fn status_order(status: TournamentStatus) -> u8 {
    match status {
        TournamentStatus::Active => 0,
        TournamentStatus::Upcoming => 1,
        TournamentStatus::Finished => 2,
    }
}

pub fn format_start(start: DateTime<Utc>, offset: FixedOffset) -> String {
    start
        .with_timezone(&offset)
        .format("%a %d.%m %H:%M")
        .to_string()
}

pub fn starts_in_label(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (start - now).num_seconds();
    if secs <= 0 {
        return "started".to_string();
    }
    let minutes = (secs + 59) / 60;
    let days = minutes / (24 * 60);
    let hours = (minutes % (24 * 60)) / 60;
    let mins = minutes % 60;
    if days > 0 {
        format!("in {days}d {hours}h")
    } else if hours > 0 {
        format!("in {hours}h {mins}m")
    } else {
        format!("in {mins}m")
    }
}

pub fn format_prize(amount: u64) -> String {
    format!("${}", format_thousands(amount))
}

pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
