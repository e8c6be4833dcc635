mod app;
mod config;
mod constants;
mod error;
mod input;
mod keys;
mod logging;
mod models;
mod omdb;
mod search;
mod selection;
mod store;
mod theme;
mod title;
mod ui;
mod watched;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::SetTitle,
  },
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use app::App;
use config::{API_KEY_ENV, Config, Overrides, Settings};
use omdb::OmdbClient;
use store::FileStore;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Search movies and keep a watched list", long_about = None)]
struct Args {
  /// OMDb API key (default: $OMDB_API_KEY, then prefs.toml)
  #[arg(long)]
  api_key: Option<String>,

  /// OMDb endpoint
  #[arg(long)]
  base_url: Option<String>,

  /// Where the watched list and logs are kept
  #[arg(long)]
  data_dir: Option<PathBuf>,

  /// Delay before a typed query is sent, in milliseconds (0 disables)
  #[arg(long)]
  debounce_ms: Option<u64>,
}

impl From<Args> for Overrides {
  fn from(args: Args) -> Self {
    Overrides { api_key: args.api_key, base_url: args.base_url, data_dir: args.data_dir, debounce_ms: args.debounce_ms }
  }
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let config = Config::load();
  let settings = Settings::resolve(args.into(), &config, std::env::var(API_KEY_ENV).ok());

  let _log_guard = logging::init_logging(&settings.data_dir.join("logs"))?;
  info!(version = env!("CARGO_PKG_VERSION"), data_dir = %settings.data_dir.display(), "starting");

  let client = OmdbClient::new(&settings)?;
  let store = FileStore::new(&settings.data_dir);
  let theme_index = config.theme_name.as_deref().map(theme::theme_index).unwrap_or(0);
  let mut app = App::new(client, store, settings.debounce, theme_index);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app);
  ratatui::restore();
  if let Err(ref e) = result {
    error!(err = %format!("{:#}", e), "exited with error");
  }
  result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  let mut shown_title = String::new();

  loop {
    app.tick();

    let title = app.title.current();
    if title != shown_title {
      execute!(std::io::stdout(), SetTitle(&title)).context("Failed to set window title")?;
      shown_title = title;
    }

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(50))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  execute!(std::io::stdout(), SetTitle(app.title.default_title())).context("Failed to reset window title")?;
  info!(watched = app.watched.len(), "quit");
  Ok(())
}
