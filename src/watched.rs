use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::models::WatchedMovie;
use crate::store::KeyValueStore;

/// Aggregates shown above the watched list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WatchedSummary {
  pub count: usize,
  pub avg_imdb_rating: f64,
  pub avg_user_rating: f64,
  pub avg_runtime_minutes: f64,
}

/// Arithmetic mean, `0.0` for an empty input.
fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
  let n = values.len();
  if n == 0 {
    return 0.0;
  }
  values.sum::<f64>() / n as f64
}

/// The user's watched movies in the order they were added, mirrored into a
/// [`KeyValueStore`] after every change.
pub struct WatchedList<S: KeyValueStore> {
  store: S,
  key: String,
  movies: Vec<WatchedMovie>,
}

impl<S: KeyValueStore> WatchedList<S> {
  /// Rebuild the list from `store`. Nothing stored yet means an empty list.
  ///
  /// An unreadable entry is not fatal: the list starts empty and the load
  /// error is handed back for the caller to report.
  pub fn load(store: S, key: impl Into<String>) -> (Self, Option<anyhow::Error>) {
    let key = key.into();
    let (movies, err) = match store.get::<Vec<WatchedMovie>>(&key) {
      Ok(movies) => (movies.unwrap_or_default(), None),
      Err(e) => {
        warn!(key = %key, err = %format!("{:#}", e), "watched: load failed, starting empty");
        (Vec::new(), Some(e.context(format!("Failed to load watched list '{}'", key))))
      }
    };
    info!(count = movies.len(), "watched: loaded");
    (Self { store, key, movies }, err)
  }

  /// Append to the end. An id that is already present is refused.
  ///
  /// Memory only changes once the store has accepted the new list.
  pub fn add(&mut self, movie: WatchedMovie) -> Result<()> {
    if self.contains(&movie.id) {
      warn!(id = %movie.id, "watched: duplicate add ignored");
      return Ok(());
    }
    let mut next = self.movies.clone();
    info!(id = %movie.id, rating = movie.user_rating, "watched: add");
    next.push(movie);
    self.commit(next)
  }

  /// Remove the entry with `id`; a missing id is a no-op but still persists.
  pub fn remove(&mut self, id: &str) -> Result<()> {
    let next: Vec<WatchedMovie> = self.movies.iter().filter(|m| m.id != id).cloned().collect();
    if next.len() != self.movies.len() {
      info!(id = %id, "watched: remove");
    }
    self.commit(next)
  }

  fn commit(&mut self, movies: Vec<WatchedMovie>) -> Result<()> {
    self.store.set(&self.key, &movies).context("Failed to save watched list")?;
    self.movies = movies;
    Ok(())
  }

  pub fn contains(&self, id: &str) -> bool {
    self.movies.iter().any(|m| m.id == id)
  }

  pub fn user_rating(&self, id: &str) -> Option<u8> {
    self.movies.iter().find(|m| m.id == id).map(|m| m.user_rating)
  }

  pub fn get(&self, index: usize) -> Option<&WatchedMovie> {
    self.movies.get(index)
  }

  pub fn iter(&self) -> impl Iterator<Item = &WatchedMovie> {
    self.movies.iter()
  }

  pub fn len(&self) -> usize {
    self.movies.len()
  }

  pub fn is_empty(&self) -> bool {
    self.movies.is_empty()
  }

  pub fn summary(&self) -> WatchedSummary {
    WatchedSummary {
      count: self.movies.len(),
      avg_imdb_rating: mean(self.movies.iter().map(|m| m.imdb_rating)),
      avg_user_rating: mean(self.movies.iter().map(|m| f64::from(m.user_rating))),
      avg_runtime_minutes: mean(self.movies.iter().map(|m| f64::from(m.runtime_minutes))),
    }
  }
}
