use ratatui::widgets::ListState;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::keys::{KeyBinding, KeyBindings};
use crate::models::SearchResultSummary;
use crate::omdb::{MovieSource, OmdbClient};
use crate::search::SearchEngine;
use crate::selection::Selection;
use crate::store::{FileStore, KeyValueStore};
use crate::theme::THEMES;
use crate::title::ViewTitle;
use crate::watched::WatchedList;

/// Which pane has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
  Detail,
  Watched,
}

/// Deferred work queued by key binding actions and applied after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  CloseDetail,
  FocusSearch,
}

/// Open/closed state of the two collapsible panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panes {
  pub results_open: bool,
  pub side_open: bool,
}

impl Default for Panes {
  fn default() -> Self {
    Self { results_open: true, side_open: true }
  }
}

pub struct App<S: MovieSource = OmdbClient, K: KeyValueStore = FileStore> {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub panes: Panes,
  pub search: SearchEngine<S>,
  pub selection: Selection<S>,
  pub watched: WatchedList<K>,
  pub list_state: ListState,
  pub watched_state: ListState,
  pub title: ViewTitle,
  pub keys: KeyBindings,
  pub last_error: Option<String>,
  pub should_quit: bool,
  commands_tx: mpsc::UnboundedSender<Command>,
  commands_rx: mpsc::UnboundedReceiver<Command>,
  enter_binding: Option<KeyBinding>,
  escape_binding: Option<KeyBinding>,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl<S: MovieSource, K: KeyValueStore> App<S, K> {
  pub fn new(source: S, store: K, debounce: Duration, theme_index: usize) -> Self {
    let c = constants();
    let (watched, load_error) = WatchedList::load(store, c.watched_store_key.as_str());
    let title = ViewTitle::new(c.app_title.as_str());
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();

    let mut app = Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      theme_index: theme_index.min(THEMES.len() - 1),
      panes: Panes::default(),
      search: SearchEngine::new(source.clone(), debounce, c.min_query_chars),
      selection: Selection::new(source, title.clone()),
      watched,
      list_state: ListState::default(),
      watched_state: ListState::default(),
      title,
      keys: KeyBindings::new(),
      last_error: None,
      should_quit: false,
      commands_tx,
      commands_rx,
      enter_binding: None,
      escape_binding: None,
      error_time: None,
    };

    let tx = app.commands_tx.clone();
    app.keys.rebind(&mut app.enter_binding, "Enter", move || {
      let _ = tx.send(Command::FocusSearch);
    });
    if let Some(e) = load_error {
      app.set_error(format!("Could not load watched list: {:#}", e));
    }
    app
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index is clamped in new() and kept in range by next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    let mut config = Config::load();
    config.theme_name = Some(self.theme().name.to_string());
    config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_display_secs)
    {
      self.clear_error();
    }
  }

  // --- Per-frame ---

  /// Apply finished background work. Called once per frame.
  pub fn tick(&mut self) {
    if self.search.poll() {
      let selected = if self.search.results().is_empty() { None } else { Some(0) };
      self.list_state.select(selected);
    }
    self.selection.poll();
    self.sync_bindings();
    self.expire_error();
  }

  /// Install the Escape binding while a detail is open, drop it otherwise.
  fn sync_bindings(&mut self) {
    match (self.selection.is_open(), self.escape_binding.is_some()) {
      (true, false) => {
        let tx = self.commands_tx.clone();
        self.keys.rebind(&mut self.escape_binding, "Escape", move || {
          let _ = tx.send(Command::CloseDetail);
        });
      }
      (false, true) => {
        self.escape_binding = None;
      }
      _ => {}
    }
    if !self.selection.is_open() && self.mode == AppMode::Detail {
      self.mode = AppMode::Results;
    }
  }

  /// Run commands queued by binding actions.
  pub fn drain_commands(&mut self) {
    while let Ok(command) = self.commands_rx.try_recv() {
      debug!(?command, "command");
      match command {
        Command::CloseDetail => self.close_detail(),
        Command::FocusSearch => self.focus_search(),
      }
    }
  }

  // --- Search ---

  /// Re-run the search for the current input text.
  pub fn on_input_changed(&mut self) {
    let query = self.input.clone();
    self.search.set_query(query, || self.selection.close());
    if self.search.results().is_empty() {
      self.list_state.select(None);
    }
    self.sync_bindings();
  }

  /// Focus the search box and clear it, unless it is already focused.
  pub fn focus_search(&mut self) {
    if self.mode == AppMode::Input {
      return;
    }
    self.mode = AppMode::Input;
    self.input.clear();
    self.cursor_position = 0;
    self.input_scroll = 0;
    self.on_input_changed();
  }

  pub fn selected_result(&self) -> Option<&SearchResultSummary> {
    self.list_state.selected().and_then(|i| self.search.results().get(i))
  }

  // --- Detail ---

  /// Open the highlighted result, or close it if it is already open.
  pub fn toggle_selected_result(&mut self) {
    let Some(id) = self.selected_result().map(|r| r.id.clone()) else { return };
    self.clear_error();
    self.selection.select(&id);
    self.mode = if self.selection.is_open() { AppMode::Detail } else { AppMode::Results };
    self.sync_bindings();
  }

  pub fn close_detail(&mut self) {
    self.selection.close();
    self.sync_bindings();
  }

  pub fn set_rating(&mut self, rating: u8) {
    if !self.selection.is_watched(&self.watched) {
      self.selection.set_rating(rating);
    }
  }

  pub fn adjust_rating(&mut self, delta: i8) {
    if !self.selection.is_watched(&self.watched) {
      self.selection.adjust_rating(delta);
    }
  }

  pub fn add_to_watched(&mut self) {
    match self.selection.confirm_add(&mut self.watched) {
      Ok(true) => {
        info!(count = self.watched.len(), "watched list updated");
        self.watched_state.select(Some(self.watched.len().saturating_sub(1)));
        self.sync_bindings();
        self.mode = AppMode::Watched;
      }
      Ok(false) => {}
      Err(e) => {
        warn!(err = %e, "failed to add watched movie");
        self.set_error(format!("Could not save: {:#}", e));
      }
    }
  }

  // --- Watched list ---

  pub fn delete_selected_watched(&mut self) {
    let Some(index) = self.watched_state.selected() else { return };
    let Some(id) = self.watched.get(index).map(|m| m.id.clone()) else { return };
    if let Err(e) = self.watched.remove(&id) {
      warn!(err = %e, "failed to remove watched movie");
      self.set_error(format!("Could not save: {:#}", e));
    }
    let selected = if self.watched.is_empty() { None } else { Some(index.min(self.watched.len() - 1)) };
    self.watched_state.select(selected);
  }

  // --- Focus ---

  pub fn next_focus(&mut self) {
    self.mode = match self.mode {
      AppMode::Input => AppMode::Results,
      AppMode::Results if self.selection.is_open() => AppMode::Detail,
      AppMode::Results => AppMode::Watched,
      AppMode::Detail | AppMode::Watched => AppMode::Input,
    };
    if self.mode == AppMode::Watched && self.watched_state.selected().is_none() && !self.watched.is_empty() {
      self.watched_state.select(Some(0));
    }
  }

  pub fn toggle_results_pane(&mut self) {
    self.panes.results_open = !self.panes.results_open;
  }

  pub fn toggle_side_pane(&mut self) {
    self.panes.side_open = !self.panes.side_open;
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::omdb::fake::{FakeSource, Reply, detail, summary};
  use crate::store::MemoryStore;

  pub(crate) fn test_app(source: &FakeSource) -> App<FakeSource, MemoryStore> {
    App::new(source.clone(), MemoryStore::default(), Duration::ZERO, 0)
  }

  pub(crate) async fn settle(app: &mut App<FakeSource, MemoryStore>) {
    for _ in 0..200 {
      app.tick();
      if !app.search.is_loading() && !app.selection.is_loading() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("app never settled");
  }

  pub(crate) fn matrix_source() -> FakeSource {
    let source = FakeSource::default();
    source.on_search("matrix", Reply::Found(vec![summary("tt1", "The Matrix"), summary("tt2", "The Matrix Reloaded")]));
    source.on_details("tt1", Reply::Found(detail("tt1", "The Matrix")));
    source.on_details("tt2", Reply::Found(detail("tt2", "The Matrix Reloaded")));
    source
  }

  #[tokio::test]
  async fn search_results_select_first_row() {
    let source = matrix_source();
    let mut app = test_app(&source);
    app.input = "matrix".into();
    app.on_input_changed();
    settle(&mut app).await;
    assert_eq!(app.list_state.selected(), Some(0));
    assert_eq!(app.selected_result().map(|r| r.id.as_str()), Some("tt1"));
  }

  #[tokio::test]
  async fn new_search_closes_open_detail() {
    let source = matrix_source();
    source.on_search("heat", Reply::Found(vec![summary("tt9", "Heat")]));
    let mut app = test_app(&source);
    app.input = "matrix".into();
    app.on_input_changed();
    settle(&mut app).await;
    app.toggle_selected_result();
    settle(&mut app).await;
    assert!(app.selection.is_open());

    app.input = "heat".into();
    app.on_input_changed();
    assert!(!app.selection.is_open());
    assert_eq!(app.keys.len(), 1);
  }

  #[tokio::test]
  async fn escape_binding_tracks_selection() {
    let source = matrix_source();
    let mut app = test_app(&source);
    assert_eq!(app.keys.len(), 1);

    app.input = "matrix".into();
    app.on_input_changed();
    settle(&mut app).await;
    app.toggle_selected_result();
    assert_eq!(app.keys.len(), 2);

    app.toggle_selected_result();
    assert!(!app.selection.is_open());
    assert_eq!(app.keys.len(), 1);
    assert_eq!(app.mode, AppMode::Results);
  }

  #[tokio::test]
  async fn add_moves_focus_to_watched_list() {
    let source = matrix_source();
    let mut app = test_app(&source);
    app.input = "matrix".into();
    app.on_input_changed();
    settle(&mut app).await;
    app.toggle_selected_result();
    settle(&mut app).await;

    app.set_rating(8);
    app.add_to_watched();
    assert_eq!(app.mode, AppMode::Watched);
    assert_eq!(app.watched.len(), 1);
    assert_eq!(app.watched_state.selected(), Some(0));
    assert_eq!(app.title.current(), constants().app_title);

    // Reopening a watched title ignores rating input.
    app.mode = AppMode::Results;
    app.toggle_selected_result();
    settle(&mut app).await;
    app.set_rating(2);
    assert_eq!(app.selection.draft().rating, None);
    assert_eq!(app.selection.existing_rating(&app.watched), Some(8));
  }

  #[tokio::test]
  async fn delete_keeps_selection_in_range() {
    let source = matrix_source();
    let mut app = test_app(&source);
    for id in ["tt1", "tt2"] {
      app.watched.add(crate::models::WatchedMovie::from_detail(&detail(id, id), 7, 1)).unwrap();
    }
    app.watched_state.select(Some(1));
    app.delete_selected_watched();
    assert_eq!(app.watched_state.selected(), Some(0));
    app.delete_selected_watched();
    assert_eq!(app.watched_state.selected(), None);
    assert!(app.watched.is_empty());
  }

  #[tokio::test]
  async fn focus_cycle_skips_detail_when_closed() {
    let source = FakeSource::default();
    let mut app = test_app(&source);
    app.next_focus();
    assert_eq!(app.mode, AppMode::Results);
    app.next_focus();
    assert_eq!(app.mode, AppMode::Watched);
    app.next_focus();
    assert_eq!(app.mode, AppMode::Input);
  }

  #[tokio::test]
  async fn unreadable_watched_list_starts_empty_with_error() {
    let store = MemoryStore::default();
    store.set("watched", &"not a list").unwrap();
    let app = App::new(FakeSource::default(), store, Duration::ZERO, 0);
    assert!(app.watched.is_empty());
    assert!(app.last_error.as_deref().is_some_and(|e| e.starts_with("Could not load watched list")));
  }

  #[tokio::test]
  async fn failed_save_reports_error_and_allows_retry() {
    let source = matrix_source();
    let store = MemoryStore::default();
    let mut app = App::new(source.clone(), store.clone(), Duration::ZERO, 0);
    app.input = "matrix".into();
    app.on_input_changed();
    settle(&mut app).await;
    app.toggle_selected_result();
    settle(&mut app).await;
    app.set_rating(8);

    store.fail_writes();
    app.add_to_watched();
    assert!(app.last_error.is_some());
    assert_eq!(app.mode, AppMode::Detail);
    assert!(app.selection.is_open());
    assert!(app.watched.is_empty());
  }
}
