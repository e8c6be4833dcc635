use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::future::Future;
use tracing::debug;

use crate::config::Settings;
use crate::error::FetchError;
use crate::models::{MovieDetail, SearchResultSummary};

/// Where search listings and detail records come from.
///
/// Implementations are cheap to clone; the engines clone one into every
/// spawned request task.
pub trait MovieSource: Clone + Send + Sync + 'static {
  fn search(&self, query: &str) -> impl Future<Output = Result<Vec<SearchResultSummary>, FetchError>> + Send;
  fn details(&self, id: &str) -> impl Future<Output = Result<MovieDetail, FetchError>> + Send;
}

/// HTTP client for the OMDb API. Key and base URL are fixed at construction.
#[derive(Debug, Clone)]
pub struct OmdbClient {
  http: Client,
  base_url: Url,
  api_key: String,
}

impl OmdbClient {
  pub fn new(settings: &Settings) -> Result<Self> {
    let base_url =
      Url::parse(&settings.base_url).with_context(|| format!("Invalid OMDb base URL: {}", settings.base_url))?;
    let http = Client::builder().timeout(settings.http_timeout).build().context("Failed to build HTTP client")?;
    Ok(Self { http, base_url, api_key: settings.api_key.clone() })
  }

  fn url_with(&self, param: &str, value: &str) -> Url {
    let mut url = self.base_url.clone();
    url.query_pairs_mut().append_pair("apikey", &self.api_key).append_pair(param, value);
    url
  }

  async fn get_body(&self, url: Url) -> Result<String, FetchError> {
    let response = self.http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status(status));
    }
    Ok(response.text().await?)
  }
}

impl MovieSource for OmdbClient {
  async fn search(&self, query: &str) -> Result<Vec<SearchResultSummary>, FetchError> {
    debug!(query = %query, "omdb: search request");
    let body = self.get_body(self.url_with("s", query)).await?;
    parse_search_envelope(&body)
  }

  async fn details(&self, id: &str) -> Result<MovieDetail, FetchError> {
    debug!(id = %id, "omdb: detail request");
    let body = self.get_body(self.url_with("i", id)).await?;
    parse_detail(id, &body)
  }
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
  #[serde(rename = "Response")]
  response: String,
  #[serde(rename = "Search", default)]
  search: Vec<SearchItem>,
  #[serde(rename = "Error")]
  error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  #[serde(rename = "imdbID")]
  imdb_id: String,
  #[serde(rename = "Title")]
  title: String,
  #[serde(rename = "Year", default)]
  year: String,
  #[serde(rename = "Poster", default)]
  poster: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct DetailBody {
  response: Option<String>,
  error: Option<String>,
  title: String,
  year: String,
  poster: String,
  runtime: String,
  #[serde(rename = "imdbRating")]
  imdb_rating: String,
  plot: String,
  released: String,
  actors: String,
  director: String,
  genre: String,
}

fn is_false(flag: &str) -> bool {
  flag.eq_ignore_ascii_case("false")
}

/// Decode a search envelope. `Response: "False"` is a miss, not a transport error.
pub fn parse_search_envelope(body: &str) -> Result<Vec<SearchResultSummary>, FetchError> {
  let envelope: SearchEnvelope = serde_json::from_str(body)?;
  if is_false(&envelope.response) {
    return Err(FetchError::NotFound(envelope.error.unwrap_or_default()));
  }
  Ok(
    envelope
      .search
      .into_iter()
      .map(|item| SearchResultSummary {
        id: item.imdb_id,
        title: item.title,
        year: item.year,
        poster_url: item.poster,
      })
      .collect(),
  )
}

/// Decode a detail record for `id`.
pub fn parse_detail(id: &str, body: &str) -> Result<MovieDetail, FetchError> {
  let detail: DetailBody = serde_json::from_str(body)?;
  if detail.response.as_deref().is_some_and(is_false) {
    return Err(FetchError::NotFound(detail.error.unwrap_or_default()));
  }
  Ok(MovieDetail {
    id: id.to_string(),
    runtime_minutes: parse_runtime(&detail.runtime),
    imdb_rating: parse_rating(&detail.imdb_rating),
    title: detail.title,
    year: detail.year,
    poster_url: detail.poster,
    plot: detail.plot,
    release_date: detail.released,
    actors: detail.actors,
    director: detail.director,
    genre: detail.genre,
  })
}

/// Leading numeric token of a runtime such as `"148 min"`; `0` when absent.
pub fn parse_runtime(raw: &str) -> u32 {
  raw.split_whitespace().next().and_then(|token| token.parse().ok()).unwrap_or(0)
}

/// IMDb rating as a number; `"N/A"` and other junk become `0`.
pub fn parse_rating(raw: &str) -> f64 {
  raw.trim().parse::<f64>().ok().filter(|r| r.is_finite()).unwrap_or(0.0)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn runtime_takes_leading_number() {
    assert_eq!(parse_runtime("148 min"), 148);
    assert_eq!(parse_runtime("90"), 90);
    assert_eq!(parse_runtime("N/A"), 0);
    assert_eq!(parse_runtime(""), 0);
  }

  #[test]
  fn rating_parses_or_zero() {
    assert_eq!(parse_rating("8.8"), 8.8);
    assert_eq!(parse_rating(" 7 "), 7.0);
    assert_eq!(parse_rating("N/A"), 0.0);
  }

  #[test]
  fn envelope_false_is_not_found() {
    let err = parse_search_envelope(r#"{"Response":"False","Error":"Movie not found!"}"#).unwrap_err();
    assert!(matches!(err, FetchError::NotFound(ref msg) if msg == "Movie not found!"));
    assert_eq!(err.user_message(), crate::error::NOT_FOUND_MESSAGE);
  }

  #[test]
  fn envelope_true_yields_results_in_order() {
    let body = r#"{
      "Response": "True",
      "totalResults": "2",
      "Search": [
        {"imdbID":"tt0133093","Title":"The Matrix","Year":"1999","Poster":"https://img/1.jpg","Type":"movie"},
        {"imdbID":"tt0234215","Title":"The Matrix Reloaded","Year":"2003","Poster":"N/A","Type":"movie"}
      ]
    }"#;
    let results = parse_search_envelope(body).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "tt0133093");
    assert_eq!(results[0].title, "The Matrix");
    assert_eq!(results[1].year, "2003");
    assert_eq!(results[1].poster_url, "N/A");
  }

  #[test]
  fn envelope_true_without_list_is_empty() {
    assert!(parse_search_envelope(r#"{"Response":"True"}"#).unwrap().is_empty());
  }

  #[test]
  fn malformed_envelope_is_generic_error() {
    let err = parse_search_envelope("<html>oops</html>").unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
    assert_eq!(err.user_message(), crate::error::GENERIC_MESSAGE);
  }

  #[test]
  fn detail_fields_are_mapped() {
    let body = r#"{
      "Title":"Inception","Year":"2010","Released":"16 Jul 2010","Runtime":"148 min",
      "Genre":"Action, Adventure, Sci-Fi","Director":"Christopher Nolan",
      "Actors":"Leonardo DiCaprio, Joseph Gordon-Levitt","Plot":"A thief...",
      "Poster":"https://img/inception.jpg","imdbRating":"8.8","Response":"True"
    }"#;
    let detail = parse_detail("tt1375666", body).unwrap();
    assert_eq!(detail.id, "tt1375666");
    assert_eq!(detail.title, "Inception");
    assert_eq!(detail.runtime_minutes, 148);
    assert_eq!(detail.imdb_rating, 8.8);
    assert_eq!(detail.release_date, "16 Jul 2010");
    assert_eq!(detail.director, "Christopher Nolan");
    assert_eq!(detail.genre, "Action, Adventure, Sci-Fi");
  }

  #[test]
  fn detail_response_false_is_not_found() {
    let err = parse_detail("tt0", r#"{"Response":"False","Error":"Incorrect IMDb ID."}"#).unwrap_err();
    assert!(matches!(err, FetchError::NotFound(_)));
  }

  #[test]
  fn request_url_carries_key_and_param() {
    let settings = crate::config::Settings {
      api_key: "k3y".into(),
      base_url: "https://www.omdbapi.com/".into(),
      data_dir: std::path::PathBuf::from("."),
      debounce: std::time::Duration::ZERO,
      http_timeout: std::time::Duration::from_secs(1),
    };
    let client = OmdbClient::new(&settings).unwrap();
    let url = client.url_with("s", "star wars");
    assert_eq!(url.as_str(), "https://www.omdbapi.com/?apikey=k3y&s=star+wars");
  }

  #[test]
  fn invalid_base_url_is_rejected() {
    let settings = crate::config::Settings {
      api_key: "k".into(),
      base_url: "not a url".into(),
      data_dir: std::path::PathBuf::from("."),
      debounce: std::time::Duration::ZERO,
      http_timeout: std::time::Duration::from_secs(1),
    };
    assert!(OmdbClient::new(&settings).is_err());
  }
}
