//! HTML fragments for the mini-app views.
//!
//! Every piece of user-provided text goes through [`escape`]; the fragments
//! are meant to be swapped into container elements as-is.

use crate::models::AdminStats;
use crate::view::{LeaderboardRow, LobbyView, ProfileView, TournamentCard, format_prize};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn tournament_list(cards: &[TournamentCard]) -> String {
    if cards.is_empty() {
        return r#"<p class="empty">No tournaments yet</p>"#.to_string();
    }
    let mut out = String::from(r#"<ul class="tournaments">"#);
    for card in cards {
        out.push_str(&tournament_card(card));
    }
    out.push_str("</ul>");
    out
}

pub fn tournament_card(card: &TournamentCard) -> String {
    let status_class = card.status_label.to_lowercase();
    let mut out = format!(
        r#"<li class="tournament {status_class}" data-id="{id}"><h3>{name}</h3><span class="status">{status}</span><div class="meta"><span class="start">{start} ({starts_in})</span><span class="game">{game}</span><span class="seats">{seats}</span><span class="prize">{prize}</span></div>"#,
        id = card.id,
        name = escape(&card.name),
        status = card.status_label,
        start = escape(&card.start_label),
        starts_in = escape(&card.starts_in),
        game = escape(card.game_label),
        seats = card.seats_label,
        prize = card.prize_label,
    );
    if card.joined {
        out.push_str(r#"<span class="badge joined">Joined</span>"#);
    }
    if card.can_join {
        out.push_str(&format!(
            r#"<button class="join" data-action="join" data-id="{}">Join</button>"#,
            card.id
        ));
    }
    if card.can_finish {
        out.push_str(&format!(
            r#"<button class="finish" data-action="finish" data-id="{}">Finish</button>"#,
            card.id
        ));
    }
    out.push_str("</li>");
    out
}

pub fn leaderboard(rows: &[LeaderboardRow]) -> String {
    if rows.is_empty() {
        return r#"<p class="empty">No players yet</p>"#.to_string();
    }
    let mut out = String::from(
        r#"<table class="leaderboard"><thead><tr><th>#</th><th>Player</th><th>Rank</th><th>Points</th><th>W/G</th></tr></thead><tbody>"#,
    );
    for row in rows {
        let class = if row.is_current { r#" class="me""# } else { "" };
        out.push_str(&format!(
            r#"<tr{class}><td>{pos}</td><td><span class="avatar">{avatar}</span> {name}</td><td>{rank}</td><td>{points}</td><td>{wins}/{games}</td></tr>"#,
            pos = row.position,
            avatar = row.avatar,
            name = escape(&row.nickname),
            rank = row.rank_label,
            points = row.points,
            wins = row.wins,
            games = row.games,
        ));
    }
    out.push_str("</tbody></table>");
    out
}

pub fn profile(view: Option<&ProfileView>) -> String {
    let Some(p) = view else {
        return r#"<form class="register" data-action="register"><input name="nickname" maxlength="24" placeholder="Nickname" required><button type="submit">Register</button></form>"#.to_string();
    };
    format!(
        r#"<section class="profile"><div class="avatar">{avatar}</div><h2>{name}</h2><dl><dt>Rank</dt><dd>{rank}</dd><dt>Points</dt><dd>{points}</dd><dt>Next</dt><dd>{next}</dd><dt>Win rate</dt><dd>{rate}</dd><dt>Games</dt><dd>{wins}/{games}</dd><dt>Favourite game</dt><dd>{game}</dd><dt>Tournaments</dt><dd>{joined}</dd></dl><button data-action="edit-profile">Edit</button></section>"#,
        avatar = p.avatar,
        name = escape(&p.nickname),
        rank = p.rank_label,
        points = p.points,
        next = escape(&p.next_rank_label),
        rate = p.win_rate_label,
        wins = p.wins,
        games = p.games,
        game = escape(p.game_label),
        joined = p.tournaments_joined,
    )
}

pub fn admin_stats(stats: &AdminStats) -> String {
    format!(
        r#"<section class="admin-stats"><dl><dt>Players</dt><dd>{}</dd><dt>Tournaments</dt><dd>{}</dd><dt>Active</dt><dd>{}</dd><dt>Finished</dt><dd>{}</dd><dt>Prize pool</dt><dd>{}</dd></dl></section>"#,
        stats.total_users,
        stats.total_tournaments,
        stats.active_tournaments,
        stats.finished_tournaments,
        format_prize(stats.total_prize_pool),
    )
}

pub fn notice(text: &str) -> String {
    format!(r#"<div class="notice" role="alert">{}</div>"#, escape(text))
}

/// The whole lobby page body.
pub fn lobby(view: &LobbyView) -> String {
    let mut out = String::new();
    if view.offline {
        out.push_str(r#"<div class="offline">Offline: showing cached data</div>"#);
    }
    if let Some(text) = &view.notice {
        out.push_str(&notice(text));
    }
    out.push_str(&profile(view.profile.as_ref()));
    out.push_str(&tournament_list(&view.tournaments));
    out.push_str(&leaderboard(&view.leaderboard));
    if view.is_admin {
        out.push_str(r#"<button data-action="create-tournament">New tournament</button>"#);
        if let Some(stats) = &view.stats {
            out.push_str(&admin_stats(stats));
        }
    }
    out
}
