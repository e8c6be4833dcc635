use reqwest::StatusCode;
use thiserror::Error;

/// Shown when the API answers but has no match for the request.
pub const NOT_FOUND_MESSAGE: &str = "Movie not found";

/// Shown for every transport or protocol failure.
pub const GENERIC_MESSAGE: &str = "Something went wrong";

/// Failure of a single OMDb request.
///
/// Cancellation has no variant: an aborted task never reports back.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The envelope's `Response` field was `"False"`.
  #[error("no match: {0}")]
  NotFound(String),
  #[error("unexpected HTTP status {0}")]
  Status(StatusCode),
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("malformed response body: {0}")]
  Malformed(#[from] serde_json::Error),
}

impl FetchError {
  /// The text the view shows for this failure.
  pub fn user_message(&self) -> &'static str {
    match self {
      FetchError::NotFound(_) => NOT_FOUND_MESSAGE,
      _ => GENERIC_MESSAGE,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn not_found_has_its_own_wording() {
    assert_eq!(FetchError::NotFound("Movie not found!".into()).user_message(), NOT_FOUND_MESSAGE);
  }

  #[test]
  fn protocol_failures_share_generic_wording() {
    assert_eq!(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR).user_message(), GENERIC_MESSAGE);
    let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert_eq!(FetchError::from(bad_json).user_message(), GENERIC_MESSAGE);
  }
}
