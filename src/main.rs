use std::io;
use std::time::{Duration, Instant};

use chrono::{FixedOffset, Utc};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use poker_lobby::actions::Dispatcher;
use poker_lobby::api;
use poker_lobby::config::ClientConfig;
use poker_lobby::models::{GameType, NewTournament, ProfileUpdate, next_avatar};
use poker_lobby::persist::LocalCache;
use poker_lobby::session::{Screen, Session};
use poker_lobby::view::{self, LobbyView};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Nickname(String),
    TournamentName(String),
}

struct App<'a> {
    session: Session,
    dispatcher: Dispatcher<'a>,
    offset: FixedOffset,
    input: Option<Input>,
    help_overlay: bool,
    should_quit: bool,
}

impl<'a> App<'a> {
    fn new(session: Session, dispatcher: Dispatcher<'a>, offset: FixedOffset) -> Self {
        Self {
            session,
            dispatcher,
            offset,
            input: None,
            help_overlay: false,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent, view: &LobbyView) {
        if self.input.is_some() {
            self.on_input_key(key);
            return;
        }
        self.session.clear_notice();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.session.set_screen(Screen::Tournaments),
            KeyCode::Char('2') => self.session.set_screen(Screen::Leaderboard),
            KeyCode::Char('3') => self.session.set_screen(Screen::Profile),
            KeyCode::Char('4') if self.session.is_admin => {
                self.session.set_screen(Screen::Admin);
                let _ = self.dispatcher.load_stats(&mut self.session);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.list_len(view);
                self.session.select_next(len);
            }
            KeyCode::Char('k') | KeyCode::Up => self.session.select_prev(),
            KeyCode::Char('R') => {
                let _ = self.dispatcher.refresh(&mut self.session);
            }
            KeyCode::Enter if self.session.screen == Screen::Tournaments => {
                if let Some(card) = view.tournaments.get(self.session.selected) {
                    let _ = self.dispatcher.join_tournament(&mut self.session, card.id);
                }
            }
            KeyCode::Char('f') if self.session.screen == Screen::Tournaments => {
                if let Some(card) = view.tournaments.get(self.session.selected) {
                    let _ = self.dispatcher.finish_tournament(&mut self.session, card.id);
                }
            }
            KeyCode::Char('n') if self.session.is_admin => {
                self.input = Some(Input::TournamentName(String::new()));
            }
            KeyCode::Char('r') | KeyCode::Char('e') => {
                let current = self
                    .session
                    .current_user
                    .as_ref()
                    .map(|u| u.nickname.clone())
                    .unwrap_or_default();
                self.input = Some(Input::Nickname(current));
            }
            KeyCode::Char('g') if self.session.screen == Screen::Profile => {
                if let Some(mut form) = self.profile_form() {
                    form.preferred_game = form.preferred_game.next();
                    let _ = self.dispatcher.edit_profile(&mut self.session, &form);
                }
            }
            KeyCode::Char('a') if self.session.screen == Screen::Profile => {
                if let Some(mut form) = self.profile_form() {
                    form.avatar = next_avatar(&form.avatar).to_string();
                    let _ = self.dispatcher.edit_profile(&mut self.session, &form);
                }
            }
            KeyCode::Char('s') if self.session.screen == Screen::Admin => {
                let _ = self.dispatcher.load_stats(&mut self.session);
            }
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        let buffer = match input {
            Input::Nickname(buf) | Input::TournamentName(buf) => buf,
        };
        match key.code {
            KeyCode::Esc => self.input = None,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Enter => {
                if let Some(input) = self.input.take() {
                    self.submit(input);
                }
            }
            _ => {}
        }
    }

    fn submit(&mut self, input: Input) {
        match input {
            Input::Nickname(nickname) => match self.profile_form() {
                Some(mut form) => {
                    form.nickname = nickname;
                    let _ = self.dispatcher.edit_profile(&mut self.session, &form);
                }
                None => {
                    let form = ProfileUpdate {
                        nickname,
                        preferred_game: GameType::Holdem,
                        avatar: String::new(),
                    };
                    let _ = self.dispatcher.register(&mut self.session, &form);
                }
            },
            Input::TournamentName(name) => {
                let form = NewTournament {
                    name,
                    start_time: Utc::now() + chrono::Duration::hours(1),
                    max_players: 9,
                    prize: 1_000,
                    game_type: GameType::Holdem,
                };
                let _ = self.dispatcher.create_tournament(&mut self.session, &form);
            }
        }
    }

    fn profile_form(&self) -> Option<ProfileUpdate> {
        self.session.current_user.as_ref().map(|u| ProfileUpdate {
            nickname: u.nickname.clone(),
            preferred_game: u.preferred_game,
            avatar: u.avatar.clone(),
        })
    }

    fn list_len(&self, view: &LobbyView) -> usize {
        match self.session.screen {
            Screen::Tournaments => view.tournaments.len(),
            Screen::Leaderboard => view.leaderboard.len(),
            Screen::Profile | Screen::Admin => 0,
        }
    }
}

fn main() -> io::Result<()> {
    let config = ClientConfig::load();
    let api = api::connect(&config).map_err(|err| io::Error::other(format!("{err:#}")))?;
    let cache = LocalCache::default_location();
    let dispatcher = Dispatcher::new(api.as_ref(), &cache);
    let mut session = Session::new(config.identity.clone(), config.admin_id);
    if config.api_url.is_none() {
        session.push_log("[INFO] POKER_API_URL not set, using demo backend");
    }
    match cache.path() {
        Some(path) => session.push_log(format!("[INFO] Cache file {}", path.display())),
        None => session.push_log("[WARN] No cache directory, offline fallback disabled"),
    }
    dispatcher.bootstrap(&mut session);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let offset = view::display_offset(config.utc_offset_hours);
    let mut app = App::new(session, dispatcher, offset);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        let view = view::render_pass(&mut app.session, Utc::now(), app.offset);
        terminal.draw(|f| ui(f, app, &view))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key, &view);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App, view: &LobbyView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.session, view))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.session.screen {
        Screen::Tournaments => render_tournaments(frame, chunks[1], view, app.session.selected),
        Screen::Leaderboard => render_leaderboard(frame, chunks[1], view, app.session.selected),
        Screen::Profile => render_profile(frame, chunks[1], view),
        Screen::Admin => render_admin(frame, chunks[1], view),
    }

    let console = Paragraph::new(console_text(&app.session))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.session)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if let Some(input) = &app.input {
        render_input(frame, frame.size(), input);
    } else if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(session: &Session, view: &LobbyView) -> String {
    let who = match &session.current_user {
        Some(user) => user.nickname.clone(),
        None => "not registered".to_string(),
    };
    let mut title = format!("POKER LOBBY | {} | {who}", session.screen.label());
    if view.is_admin {
        title.push_str(" | admin");
    }
    if view.offline {
        title.push_str(" | OFFLINE");
    }
    match &view.notice {
        Some(notice) => format!("{title}\n{notice}"),
        None => title,
    }
}

fn footer_text(session: &Session) -> String {
    let mut text = match session.screen {
        Screen::Tournaments => "j/k Move | Enter Join | R Refresh".to_string(),
        Screen::Leaderboard => "j/k Move | R Refresh".to_string(),
        Screen::Profile => "e Nickname | g Game | a Avatar".to_string(),
        Screen::Admin => "s Reload stats | n New tournament".to_string(),
    };
    if session.is_admin && session.screen == Screen::Tournaments {
        text.push_str(" | f Finish | n New");
    }
    text.push_str(" | 1-4 Screens | ? Help | q Quit");
    text
}

fn render_tournaments(frame: &mut Frame, area: Rect, view: &LobbyView, selected: usize) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = tournament_columns();
    render_header_row(
        frame,
        sections[0],
        &widths,
        &["Status", "Tournament", "Start", "Game", "Seats", "Prize", ""],
    );

    let list_area = sections[1];
    if view.tournaments.is_empty() {
        let empty = Paragraph::new("No tournaments yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(selected, view.tournaments.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let card = &view.tournaments[idx];
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let style = row_style(idx == selected);
        if idx == selected {
            frame.render_widget(Block::default().style(style), row_area);
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let marker = if card.joined {
            "joined"
        } else if card.can_join {
            "open"
        } else {
            ""
        };
        let start_text = format!("{} ({})", card.start_label, card.starts_in);
        render_cell_text(frame, cols[0], card.status_label, style.fg(status_color(card.status_label)));
        render_cell_text(frame, cols[1], &card.name, style);
        render_cell_text(frame, cols[2], &start_text, style);
        render_cell_text(frame, cols[3], card.game_label, style);
        render_cell_text(frame, cols[4], &card.seats_label, style);
        render_cell_text(frame, cols[5], &card.prize_label, style);
        render_cell_text(frame, cols[6], marker, style);
    }
}

fn render_leaderboard(frame: &mut Frame, area: Rect, view: &LobbyView, selected: usize) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = leaderboard_columns();
    render_header_row(
        frame,
        sections[0],
        &widths,
        &["#", "Player", "Rank", "Points", "W/G"],
    );

    let list_area = sections[1];
    if view.leaderboard.is_empty() {
        let empty = Paragraph::new("No players yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(selected, view.leaderboard.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let row = &view.leaderboard[idx];
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let mut style = row_style(idx == selected);
        if row.is_current {
            style = style.add_modifier(Modifier::BOLD);
        }
        if idx == selected {
            frame.render_widget(Block::default().style(style), row_area);
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        render_cell_text(frame, cols[0], &row.position.to_string(), style);
        render_cell_text(frame, cols[1], &format!("{} {}", row.avatar, row.nickname), style);
        render_cell_text(frame, cols[2], row.rank_label, style);
        render_cell_text(frame, cols[3], &row.points.to_string(), style);
        render_cell_text(frame, cols[4], &format!("{}/{}", row.wins, row.games), style);
    }
}

fn render_profile(frame: &mut Frame, area: Rect, view: &LobbyView) {
    let text = match &view.profile {
        Some(p) => [
            format!("{} {}", p.avatar, p.nickname),
            String::new(),
            format!("Rank:        {} ({} pts)", p.rank_label, p.points),
            format!("Next:        {}", p.next_rank_label),
            format!("Win rate:    {} ({}/{})", p.win_rate_label, p.wins, p.games),
            format!("Game:        {}", p.game_label),
            format!("Avatar:      {}", p.avatar_key),
            format!("Tournaments: {}", p.tournaments_joined),
        ]
        .join("\n"),
        None => "Not registered yet. Press r to pick a nickname.".to_string(),
    };
    let profile = Paragraph::new(text).block(Block::default().title("Profile").borders(Borders::ALL));
    frame.render_widget(profile, area);
}

fn render_admin(frame: &mut Frame, area: Rect, view: &LobbyView) {
    let text = match &view.stats {
        Some(stats) => [
            format!("Players:     {}", stats.total_users),
            format!("Tournaments: {}", stats.total_tournaments),
            format!("Active:      {}", stats.active_tournaments),
            format!("Finished:    {}", stats.finished_tournaments),
            format!("Prize pool:  {}", view::format_prize(stats.total_prize_pool)),
        ]
        .join("\n"),
        None => "No stats loaded. Press s to fetch.".to_string(),
    };
    let stats = Paragraph::new(text).block(Block::default().title("Admin").borders(Borders::ALL));
    frame.render_widget(stats, area);
}

fn tournament_columns() -> [Constraint; 7] {
    [
        Constraint::Length(10),
        Constraint::Min(18),
        Constraint::Length(28),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(7),
    ]
}

fn leaderboard_columns() -> [Constraint; 5] {
    [
        Constraint::Length(5),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(10),
    ]
}

fn render_header_row(frame: &mut Frame, area: Rect, widths: &[Constraint], titles: &[&str]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);
    for (col, title) in cols.iter().zip(titles) {
        render_cell_text(frame, *col, title, style);
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn row_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn status_color(label: &str) -> Color {
    match label {
        "Active" => Color::Green,
        "Upcoming" => Color::Yellow,
        _ => Color::DarkGray,
    }
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(session: &Session) -> String {
    if session.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = session.logs.len().saturating_sub(3);
    session
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_input(frame: &mut Frame, area: Rect, input: &Input) {
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);
    let (title, buffer) = match input {
        Input::Nickname(buf) => ("Nickname", buf),
        Input::TournamentName(buf) => ("Tournament name", buf),
    };
    let prompt = Paragraph::new(format!("{buffer}_\n\nEnter to confirm, Esc to cancel"))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(prompt, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Poker Lobby - Help",
        "",
        "Screens:",
        "  1            Tournaments",
        "  2            Leaderboard",
        "  3            Profile",
        "  4            Admin (admin only)",
        "",
        "Actions:",
        "  j/k or ↑/↓   Move",
        "  Enter        Join selected tournament",
        "  r / e        Register / edit nickname",
        "  g / a        Cycle game / avatar (profile)",
        "  f / n        Finish / new tournament (admin)",
        "  R            Refresh lists",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text).block(Block::default().title("Help").borders(Borders::ALL));
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
