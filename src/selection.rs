use anyhow::Result;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{FetchError, GENERIC_MESSAGE};
use crate::models::{MovieDetail, WatchedMovie};
use crate::omdb::MovieSource;
use crate::store::KeyValueStore;
use crate::title::{TitleOverride, ViewTitle};
use crate::watched::WatchedList;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

type DetailReply = (String, Result<MovieDetail, FetchError>);

struct PendingDetail {
  handle: JoinHandle<()>,
  rx: oneshot::Receiver<DetailReply>,
}

impl Drop for PendingDetail {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// The user's rating for the open title, before it is confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingDraft {
  pub rating: Option<u8>,
  /// Times the rating changed value.
  pub revisions: u32,
}

impl RatingDraft {
  pub fn set(&mut self, rating: u8) {
    let rating = rating.clamp(MIN_RATING, MAX_RATING);
    if self.rating != Some(rating) {
      self.rating = Some(rating);
      self.revisions += 1;
    }
  }

  pub fn adjust(&mut self, delta: i8) {
    let base = i16::from(self.rating.unwrap_or(0));
    let next = (base + i16::from(delta)).clamp(i16::from(MIN_RATING), i16::from(MAX_RATING));
    self.set(next as u8);
  }
}

/// Latch selection of one search result plus the detail record fetched for it.
///
/// `select` on the open id closes it; on any other id it switches straight
/// over. Leaving a selection, by any route, drops its detail, its pending
/// fetch, its rating draft and its title override.
pub struct Selection<S: MovieSource> {
  source: S,
  title: ViewTitle,
  selected: Option<String>,
  detail: Option<MovieDetail>,
  pending: Option<PendingDetail>,
  error: Option<String>,
  draft: RatingDraft,
  title_override: Option<TitleOverride>,
}

impl<S: MovieSource> Selection<S> {
  pub fn new(source: S, title: ViewTitle) -> Self {
    Self {
      source,
      title,
      selected: None,
      detail: None,
      pending: None,
      error: None,
      draft: RatingDraft::default(),
      title_override: None,
    }
  }

  pub fn selected_id(&self) -> Option<&str> {
    self.selected.as_deref()
  }

  pub fn is_open(&self) -> bool {
    self.selected.is_some()
  }

  pub fn detail(&self) -> Option<&MovieDetail> {
    self.detail.as_ref()
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn is_loading(&self) -> bool {
    self.pending.is_some()
  }

  pub fn draft(&self) -> RatingDraft {
    self.draft
  }

  pub fn select(&mut self, id: &str) {
    if self.selected.as_deref() == Some(id) {
      debug!(id = %id, "selection: toggle off");
      self.close();
      return;
    }
    self.leave();
    info!(id = %id, "selection: open");
    self.selected = Some(id.to_string());
    self.fetch(id.to_string());
  }

  pub fn close(&mut self) {
    if self.selected.is_some() {
      debug!("selection: close");
    }
    self.leave();
    self.selected = None;
  }

  fn leave(&mut self) {
    self.pending = None;
    self.detail = None;
    self.error = None;
    self.draft = RatingDraft::default();
    self.title_override = None;
  }

  fn fetch(&mut self, id: String) {
    let source = self.source.clone();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let result = source.details(&id).await;
      let _ = tx.send((id, result));
    });
    self.pending = Some(PendingDetail { handle, rx });
  }

  /// Apply a finished detail fetch. Returns `true` when state changed.
  pub fn poll(&mut self) -> bool {
    let Some(pending) = self.pending.as_mut() else { return false };
    match pending.rx.try_recv() {
      Ok((id, result)) => {
        self.pending = None;
        if self.selected.as_deref() != Some(id.as_str()) {
          debug!(id = %id, "selection: stale detail dropped");
          return false;
        }
        match result {
          Ok(detail) => {
            self.title_override = None;
            self.title_override = Some(self.title.override_with(format!("Movie | {}", detail.title)));
            self.detail = Some(detail);
          }
          Err(e) => {
            warn!(id = %id, err = %e, "selection: detail failed");
            self.error = Some(GENERIC_MESSAGE.to_string());
          }
        }
        true
      }
      Err(oneshot::error::TryRecvError::Empty) => false,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.pending = None;
        self.error = Some(GENERIC_MESSAGE.to_string());
        true
      }
    }
  }

  pub fn set_rating(&mut self, rating: u8) {
    self.draft.set(rating);
  }

  pub fn adjust_rating(&mut self, delta: i8) {
    self.draft.adjust(delta);
  }

  pub fn is_watched<K: KeyValueStore>(&self, watched: &WatchedList<K>) -> bool {
    self.selected.as_deref().is_some_and(|id| watched.contains(id))
  }

  /// The rating stored for the open title, if it is already on the list.
  pub fn existing_rating<K: KeyValueStore>(&self, watched: &WatchedList<K>) -> Option<u8> {
    self.selected.as_deref().and_then(|id| watched.user_rating(id))
  }

  /// Add the open title with the drafted rating, then close.
  ///
  /// Returns `Ok(false)` without touching the list when there is nothing to
  /// add: no detail yet, no rating yet, or the title is already watched.
  pub fn confirm_add<K: KeyValueStore>(&mut self, watched: &mut WatchedList<K>) -> Result<bool> {
    let (Some(detail), Some(rating)) = (self.detail.as_ref(), self.draft.rating) else {
      return Ok(false);
    };
    if watched.contains(&detail.id) {
      return Ok(false);
    }
    let movie = WatchedMovie::from_detail(detail, rating, self.draft.revisions);
    watched.add(movie)?;
    self.close();
    Ok(true)
  }
}
