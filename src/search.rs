use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{FetchError, GENERIC_MESSAGE};
use crate::models::SearchResultSummary;
use crate::omdb::MovieSource;

type SearchReply = Result<Vec<SearchResultSummary>, FetchError>;

/// One in-flight request. Dropping it aborts the task, and because the
/// receiver goes with it a late reply has nowhere to land.
struct PendingSearch {
  query: String,
  handle: JoinHandle<()>,
  rx: oneshot::Receiver<SearchReply>,
}

impl Drop for PendingSearch {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// Live search over a [`MovieSource`].
///
/// Every query change supersedes the previous request: the old task is
/// aborted before the new one is spawned, so only the latest query can ever
/// write `results` or `error`. Completed work is applied by [`poll`], which the
/// UI loop calls once per frame.
///
/// [`poll`]: SearchEngine::poll
pub struct SearchEngine<S: MovieSource> {
  source: S,
  debounce: Duration,
  min_chars: usize,
  query: String,
  results: Vec<SearchResultSummary>,
  error: Option<String>,
  pending: Option<PendingSearch>,
}

impl<S: MovieSource> SearchEngine<S> {
  pub fn new(source: S, debounce: Duration, min_chars: usize) -> Self {
    Self {
      source,
      debounce,
      min_chars,
      query: String::new(),
      results: Vec::new(),
      error: None,
      pending: None,
    }
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn results(&self) -> &[SearchResultSummary] {
    &self.results
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// True exactly while a request that has not been superseded is outstanding.
  pub fn is_loading(&self) -> bool {
    self.pending.is_some()
  }

  /// Replace the query. `on_new_search` runs right before a request is issued,
  /// never for queries below the length gate.
  pub fn set_query(&mut self, query: impl Into<String>, on_new_search: impl FnOnce()) {
    let query = query.into();
    if query == self.query {
      return;
    }
    self.query = query;
    self.cancel();

    let trimmed = self.query.trim();
    if trimmed.chars().count() < self.min_chars {
      self.results.clear();
      self.error = None;
      return;
    }

    on_new_search();
    self.error = None;

    let query = trimmed.to_string();
    info!(query = %query, "search: issued");
    let source = self.source.clone();
    let debounce = self.debounce;
    let task_query = query.clone();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      if !debounce.is_zero() {
        tokio::time::sleep(debounce).await;
      }
      let _ = tx.send(source.search(&task_query).await);
    });
    self.pending = Some(PendingSearch { query, handle, rx });
  }

  /// Abort the outstanding request, if any. Never reported as an error.
  pub fn cancel(&mut self) {
    if let Some(pending) = self.pending.take() {
      debug!(query = %pending.query, "search: superseded");
    }
  }

  /// Apply a finished request. Returns `true` when state changed.
  pub fn poll(&mut self) -> bool {
    let Some(pending) = self.pending.as_mut() else { return false };
    match pending.rx.try_recv() {
      Ok(reply) => {
        let query = self.pending.take().map(|p| p.query.clone()).unwrap_or_default();
        match reply {
          Ok(results) => {
            info!(query = %query, count = results.len(), "search: results");
            self.results = results;
            self.error = None;
          }
          Err(e) => {
            warn!(query = %query, err = %e, "search: failed");
            self.results.clear();
            self.error = Some(e.user_message().to_string());
          }
        }
        true
      }
      Err(oneshot::error::TryRecvError::Empty) => false,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.pending = None;
        self.results.clear();
        self.error = Some(GENERIC_MESSAGE.to_string());
        true
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::NOT_FOUND_MESSAGE;
  use crate::omdb::fake::{FakeSource, Reply, summary};

  fn engine(source: &FakeSource) -> SearchEngine<FakeSource> {
    SearchEngine::new(source.clone(), Duration::ZERO, 3)
  }

  async fn settle(engine: &mut SearchEngine<FakeSource>) {
    for _ in 0..200 {
      engine.poll();
      if !engine.is_loading() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("search never settled");
  }

  #[tokio::test]
  async fn short_queries_reset_without_calling() {
    let source = FakeSource::default();
    let mut engine = engine(&source);
    let mut notified = 0;
    for q in ["", "a", "ab", "  ab  ", "x "] {
      engine.set_query(q, || notified += 1);
      assert!(engine.results().is_empty());
      assert!(engine.error().is_none());
      assert!(!engine.is_loading());
    }
    assert_eq!(notified, 0);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(source.calls().is_empty());
  }

  #[tokio::test]
  async fn found_populates_results() {
    let source = FakeSource::default();
    source.on_search("matrix", Reply::Found(vec![summary("tt1", "The Matrix"), summary("tt2", "The Matrix Reloaded")]));
    let mut engine = engine(&source);

    let mut notified = 0;
    engine.set_query("matrix", || notified += 1);
    assert!(engine.is_loading());
    assert_eq!(notified, 1);

    settle(&mut engine).await;
    assert_eq!(engine.results().iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["tt1", "tt2"]);
    assert!(engine.error().is_none());
    assert_eq!(source.calls(), ["search:matrix"]);
  }

  #[tokio::test]
  async fn poll_applies_a_reply_once() {
    let source = FakeSource::default();
    source.on_search("heat", Reply::Found(vec![summary("tt9", "Heat")]));
    let mut engine = engine(&source);
    engine.set_query("heat", || {});

    let mut applied = 0;
    for _ in 0..200 {
      if engine.poll() {
        applied += 1;
      }
      if !engine.is_loading() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(applied, 1);
    assert!(!engine.poll());
    assert_eq!(engine.results().len(), 1);
  }

  #[tokio::test]
  async fn not_found_sets_message_and_empties_results() {
    let source = FakeSource::default();
    source.on_search("matrix", Reply::Found(vec![summary("tt1", "The Matrix")]));
    source.on_search("zzzzqqq", Reply::NotFound);
    let mut engine = engine(&source);

    engine.set_query("matrix", || {});
    settle(&mut engine).await;
    assert_eq!(engine.results().len(), 1);

    engine.set_query("zzzzqqq", || {});
    settle(&mut engine).await;
    assert!(engine.results().is_empty());
    assert_eq!(engine.error(), Some(NOT_FOUND_MESSAGE));
  }

  #[tokio::test]
  async fn transport_failure_is_generic() {
    let source = FakeSource::default();
    source.on_search("broken", Reply::Broken);
    let mut engine = engine(&source);
    engine.set_query("broken", || {});
    settle(&mut engine).await;
    assert_eq!(engine.error(), Some(GENERIC_MESSAGE));
    assert!(!engine.is_loading());
  }

  #[tokio::test]
  async fn superseded_reply_never_lands() {
    let source = FakeSource::default();
    source.on_search("alien", Reply::Found(vec![summary("tt-alien", "Alien")]));
    source.on_search("aliens", Reply::Found(vec![summary("tt-aliens", "Aliens")]));
    let alien_gate = source.hold("alien");
    let mut engine = engine(&source);

    engine.set_query("alien", || {});
    tokio::task::yield_now().await;
    engine.set_query("aliens", || {});
    settle(&mut engine).await;
    assert_eq!(engine.results()[0].id, "tt-aliens");

    // Release the stale request; its task is gone, so nothing changes.
    alien_gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!engine.poll());
    assert_eq!(engine.results().len(), 1);
    assert_eq!(engine.results()[0].id, "tt-aliens");
    assert!(engine.error().is_none());
  }

  #[tokio::test]
  async fn shortening_query_aborts_in_flight_request() {
    let source = FakeSource::default();
    source.on_search("heat", Reply::Found(vec![summary("tt-heat", "Heat")]));
    let gate = source.hold("heat");
    let mut engine = engine(&source);

    engine.set_query("heat", || {});
    assert!(engine.is_loading());
    engine.set_query("he", || {});
    assert!(!engine.is_loading());

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    engine.poll();
    assert!(engine.results().is_empty());
    assert!(engine.error().is_none());
  }

  #[tokio::test]
  async fn same_query_is_not_reissued() {
    let source = FakeSource::default();
    source.on_search("fargo", Reply::Found(vec![summary("tt-f", "Fargo")]));
    let mut engine = engine(&source);
    let mut notified = 0;
    engine.set_query("fargo", || notified += 1);
    settle(&mut engine).await;
    engine.set_query("fargo", || notified += 1);
    assert!(!engine.is_loading());
    assert_eq!(notified, 1);
  }

  #[tokio::test]
  async fn debounce_coalesces_fast_typing() {
    let source = FakeSource::default();
    source.on_search("jaws", Reply::Found(vec![summary("tt-j", "Jaws")]));
    let mut engine = SearchEngine::new(source.clone(), Duration::from_millis(30), 3);

    engine.set_query("jaw", || {});
    engine.set_query("jaws", || {});
    settle(&mut engine).await;

    assert_eq!(source.calls(), ["search:jaws"]);
    assert_eq!(engine.results()[0].title, "Jaws");
  }
}
