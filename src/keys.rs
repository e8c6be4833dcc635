//! Process-wide key bindings.
//!
//! A binding maps a key name (`"Escape"`, `"Enter"`, `"a"` ...) to a
//! zero-argument action. [`KeyBindings::bind`] returns a [`KeyBinding`] guard;
//! the listener lives exactly as long as that guard, so a view that goes away
//! takes its bindings with it and nothing fires twice or after the fact.
//!
//! The event loop hands every key press to [`KeyBindings::dispatch`] before the
//! focused pane sees it.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tracing::debug;

type Action = Arc<dyn Fn() + Send + Sync>;

struct Entry {
  id: u64,
  key: String,
  action: Action,
}

#[derive(Default)]
struct Registry {
  next_id: u64,
  entries: Vec<Entry>,
}

/// Shared registry handle. Clones refer to the same set of bindings.
#[derive(Clone, Default)]
pub struct KeyBindings {
  registry: Arc<StdMutex<Registry>>,
}

impl KeyBindings {
  pub fn new() -> Self {
    Self::default()
  }

  /// Install `action` for `key`. Matching is case-insensitive.
  #[must_use = "the binding is removed as soon as the guard is dropped"]
  pub fn bind(&self, key: &str, action: impl Fn() + Send + Sync + 'static) -> KeyBinding {
    let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
    let id = registry.next_id;
    registry.next_id += 1;
    registry.entries.push(Entry { id, key: key.to_lowercase(), action: Arc::new(action) });
    debug!(key = %key, id, "keys: bound");
    KeyBinding { id, registry: Arc::downgrade(&self.registry) }
  }

  /// Release whatever `slot` holds, then bind `action` into it.
  pub fn rebind(&self, slot: &mut Option<KeyBinding>, key: &str, action: impl Fn() + Send + Sync + 'static) {
    *slot = None;
    *slot = Some(self.bind(key, action));
  }

  /// Fire every action bound to the name of `event`. Returns how many fired.
  pub fn dispatch(&self, event: &KeyEvent) -> usize {
    match key_name(event.code) {
      Some(name) => self.dispatch_name(&name),
      None => 0,
    }
  }

  pub fn dispatch_name(&self, name: &str) -> usize {
    let name = name.to_lowercase();
    // Collect first: an action may bind or unbind while running.
    let actions: Vec<Action> = {
      let registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
      registry.entries.iter().filter(|e| e.key == name).map(|e| Arc::clone(&e.action)).collect()
    };
    for action in &actions {
      action();
    }
    actions.len()
  }

  /// Number of live bindings.
  pub fn len(&self) -> usize {
    self.registry.lock().map(|r| r.entries.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Removes its binding from the registry when dropped.
pub struct KeyBinding {
  id: u64,
  registry: Weak<StdMutex<Registry>>,
}

impl Drop for KeyBinding {
  fn drop(&mut self) {
    if let Some(registry) = self.registry.upgrade() {
      let mut registry = registry.lock().unwrap_or_else(|e| e.into_inner());
      registry.entries.retain(|e| e.id != self.id);
      debug!(id = self.id, "keys: unbound");
    }
  }
}

/// Browser-style name of a key code.
pub fn key_name(code: KeyCode) -> Option<String> {
  let name = match code {
    KeyCode::Esc => "Escape",
    KeyCode::Enter => "Enter",
    KeyCode::Tab | KeyCode::BackTab => "Tab",
    KeyCode::Backspace => "Backspace",
    KeyCode::Delete => "Delete",
    KeyCode::Up => "ArrowUp",
    KeyCode::Down => "ArrowDown",
    KeyCode::Left => "ArrowLeft",
    KeyCode::Right => "ArrowRight",
    KeyCode::Home => "Home",
    KeyCode::End => "End",
    KeyCode::PageUp => "PageUp",
    KeyCode::PageDown => "PageDown",
    KeyCode::Char(' ') => "Space",
    KeyCode::Char(c) => return Some(c.to_string()),
    KeyCode::F(n) => return Some(format!("F{}", n)),
    _ => return None,
  };
  Some(name.to_string())
}
