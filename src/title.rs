use std::sync::{Arc, Mutex as StdMutex};

/// The title shown for the whole view (terminal window title and header).
///
/// Overrides are scoped: [`ViewTitle::override_with`] hands out a guard and the
/// default title comes back when that guard is dropped, whatever the exit path.
#[derive(Debug, Clone)]
pub struct ViewTitle {
  default: Arc<str>,
  current: Arc<StdMutex<String>>,
}

impl ViewTitle {
  pub fn new(default: impl Into<String>) -> Self {
    let default: String = default.into();
    Self { current: Arc::new(StdMutex::new(default.clone())), default: default.into() }
  }

  pub fn current(&self) -> String {
    self.current.lock().map(|t| t.clone()).unwrap_or_else(|_| self.default.to_string())
  }

  pub fn default_title(&self) -> &str {
    &self.default
  }

  fn set(&self, title: String) {
    if let Ok(mut current) = self.current.lock() {
      *current = title;
    }
  }

  #[must_use = "the override ends when the guard is dropped"]
  pub fn override_with(&self, title: impl Into<String>) -> TitleOverride {
    self.set(title.into());
    TitleOverride { title: self.clone() }
  }
}

/// Restores the default title on drop.
#[derive(Debug)]
pub struct TitleOverride {
  title: ViewTitle,
}

impl Drop for TitleOverride {
  fn drop(&mut self) {
    self.title.set(self.title.default.to_string());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn override_lasts_for_guard_lifetime() {
    let title = ViewTitle::new("usePopcorn");
    assert_eq!(title.current(), "usePopcorn");
    {
      let _guard = title.override_with("Movie | Heat");
      assert_eq!(title.current(), "Movie | Heat");
    }
    assert_eq!(title.current(), "usePopcorn");
  }

  #[test]
  fn clones_observe_the_same_title() {
    let title = ViewTitle::new("usePopcorn");
    let observer = title.clone();
    let guard = title.override_with("Movie | Alien");
    assert_eq!(observer.current(), "Movie | Alien");
    drop(guard);
    assert_eq!(observer.current(), observer.default_title());
  }
}
