use anyhow::{Result, anyhow};
use chrono::Utc;

use poker_lobby::actions::{Dispatcher, LoadSource};
use poker_lobby::api;
use poker_lobby::config::ClientConfig;
use poker_lobby::markup;
use poker_lobby::persist::LocalCache;
use poker_lobby::session::Session;
use poker_lobby::view;

fn main() -> Result<()> {
    let config = ClientConfig::load();
    let api = api::connect(&config)?;
    let cache = LocalCache::default_location();
    let dispatcher = Dispatcher::new(api.as_ref(), &cache);

    let mut session = Session::new(config.identity.clone(), config.admin_id);
    let source = dispatcher.bootstrap(&mut session);
    if source == LoadSource::Empty {
        return Err(anyhow!("backend unreachable and no cached data"));
    }
    if session.is_admin && std::env::args().any(|arg| arg == "--stats") {
        if let Err(err) = dispatcher.load_stats(&mut session) {
            eprintln!("[WARN] stats unavailable: {err:#}");
        }
    }

    let offset = view::display_offset(config.utc_offset_hours);
    let lobby = view::render_pass(&mut session, Utc::now(), offset);
    println!("{}", markup::lobby(&lobby));
    Ok(())
}
