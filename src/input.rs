use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode};
use crate::omdb::MovieSource;
use crate::store::KeyValueStore;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

fn next_index(selected: Option<usize>, count: usize) -> Option<usize> {
  if count == 0 {
    return None;
  }
  Some(selected.map_or(0, |i| (i + 1) % count))
}

fn prev_index(selected: Option<usize>, count: usize) -> Option<usize> {
  if count == 0 {
    return None;
  }
  Some(selected.map_or(0, |i| if i == 0 { count - 1 } else { i - 1 }))
}

// --- Event Handling ---

pub fn handle_key_event<S: MovieSource, K: KeyValueStore>(app: &mut App<S, K>, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.next_theme(),
      KeyCode::Char('r') => app.toggle_results_pane(),
      KeyCode::Char('w') => app.toggle_side_pane(),
      _ => {}
    }
    return;
  }

  // Bound keys take precedence over the focused pane.
  let fired = app.keys.dispatch(&key);
  app.drain_commands();
  if fired > 0 {
    return;
  }

  if key.code == KeyCode::Tab {
    app.next_focus();
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Results => handle_results_key(app, key),
    AppMode::Detail => handle_detail_key(app, key),
    AppMode::Watched => handle_watched_key(app, key),
  }
}

fn handle_input_key<S: MovieSource, K: KeyValueStore>(app: &mut App<S, K>, key: KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
      app.on_input_changed();
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
        app.on_input_changed();
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
        app.on_input_changed();
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
        app.on_input_changed();
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.search.results().is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key<S: MovieSource, K: KeyValueStore>(app: &mut App<S, K>, key: KeyEvent) {
  match key.code {
    KeyCode::Char(' ') | KeyCode::Char('o') | KeyCode::Char('l') | KeyCode::Right => {
      app.toggle_selected_result();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      let i = next_index(app.list_state.selected(), app.search.results().len());
      app.list_state.select(i);
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let i = prev_index(app.list_state.selected(), app.search.results().len());
      app.list_state.select(i);
    }
    KeyCode::Char('/') | KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}

fn handle_detail_key<S: MovieSource, K: KeyValueStore>(app: &mut App<S, K>, key: KeyEvent) {
  match key.code {
    KeyCode::Char('0') => app.set_rating(10),
    KeyCode::Char(c @ '1'..='9') => app.set_rating(c as u8 - b'0'),
    KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('l') => app.adjust_rating(1),
    KeyCode::Left | KeyCode::Char('-') | KeyCode::Char('h') => app.adjust_rating(-1),
    KeyCode::Char('a') => app.add_to_watched(),
    KeyCode::Backspace => app.close_detail(),
    _ => {}
  }
}

fn handle_watched_key<S: MovieSource, K: KeyValueStore>(app: &mut App<S, K>, key: KeyEvent) {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => {
      let i = next_index(app.watched_state.selected(), app.watched.len());
      app.watched_state.select(i);
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let i = prev_index(app.watched_state.selected(), app.watched.len());
      app.watched_state.select(i);
    }
    KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete => {
      app.delete_selected_watched();
    }
    KeyCode::Esc => {
      app.mode = AppMode::Results;
    }
    _ => {}
  }
}
