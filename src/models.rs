use serde::{Deserialize, Serialize};

/// A single row of a search listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultSummary {
  pub id: String,
  pub title: String,
  pub year: String,
  pub poster_url: String,
}

/// Full record for one title, fetched when it is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
  pub id: String,
  pub title: String,
  pub year: String,
  pub poster_url: String,
  pub runtime_minutes: u32,
  pub imdb_rating: f64,
  pub plot: String,
  pub release_date: String,
  pub actors: String,
  pub director: String,
  pub genre: String,
}

/// An entry of the watched list. Field names on disk match the layout the
/// list has always been stored with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedMovie {
  #[serde(rename = "imdbID")]
  pub id: String,
  pub title: String,
  pub year: String,
  #[serde(rename = "poster")]
  pub poster_url: String,
  #[serde(rename = "imdbRating")]
  pub imdb_rating: f64,
  #[serde(rename = "runtime")]
  pub runtime_minutes: u32,
  #[serde(rename = "userRating")]
  pub user_rating: u8,
  /// How many times the rating changed before it was confirmed.
  #[serde(rename = "countRatingDecisions", default)]
  pub rating_revision_count: u32,
}

impl WatchedMovie {
  pub fn from_detail(detail: &MovieDetail, user_rating: u8, rating_revision_count: u32) -> Self {
    Self {
      id: detail.id.clone(),
      title: detail.title.clone(),
      year: detail.year.clone(),
      poster_url: detail.poster_url.clone(),
      imdb_rating: detail.imdb_rating,
      runtime_minutes: detail.runtime_minutes,
      user_rating,
      rating_revision_count,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn watched_movie_uses_stored_field_names() {
    let movie = WatchedMovie {
      id: "tt1375666".into(),
      title: "Inception".into(),
      year: "2010".into(),
      poster_url: "https://example.com/p.jpg".into(),
      imdb_rating: 8.8,
      runtime_minutes: 148,
      user_rating: 9,
      rating_revision_count: 2,
    };
    let value = serde_json::to_value(&movie).unwrap();
    assert_eq!(value["imdbID"], "tt1375666");
    assert_eq!(value["poster"], "https://example.com/p.jpg");
    assert_eq!(value["runtime"], 148);
    assert_eq!(value["userRating"], 9);
    assert_eq!(value["countRatingDecisions"], 2);
  }

  #[test]
  fn watched_movie_without_revision_count_loads() {
    let json = r#"{"imdbID":"tt1","title":"T","year":"1999","poster":"N/A","imdbRating":7.1,"runtime":90,"userRating":6}"#;
    let movie: WatchedMovie = serde_json::from_str(json).unwrap();
    assert_eq!(movie.rating_revision_count, 0);
    assert_eq!(movie.user_rating, 6);
  }
}
