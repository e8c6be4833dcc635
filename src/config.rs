use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::constants;

/// Environment variable consulted for the OMDb API key when no flag is given.
pub const API_KEY_ENV: &str = "OMDB_API_KEY";

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "popcorn")
}

/// User preferences persisted as `prefs.toml` in the platform config dir.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub api_key: Option<String>,
  pub base_url: Option<String>,
  pub debounce_ms: Option<u64>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }
}

/// Values supplied on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
  pub api_key: Option<String>,
  pub base_url: Option<String>,
  pub data_dir: Option<PathBuf>,
  pub debounce_ms: Option<u64>,
}

/// Fully resolved runtime settings, built once at startup and handed to the
/// components that need them.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub api_key: String,
  pub base_url: String,
  pub data_dir: PathBuf,
  pub debounce: Duration,
  pub http_timeout: Duration,
}

impl Settings {
  /// Precedence: command line, then `OMDB_API_KEY` (api key only), then
  /// `prefs.toml`, then the embedded constants.
  pub fn resolve(overrides: Overrides, config: &Config, env_api_key: Option<String>) -> Self {
    let c = constants();
    let api_key = overrides
      .api_key
      .or(env_api_key)
      .or_else(|| config.api_key.clone())
      .filter(|k| !k.trim().is_empty())
      .unwrap_or_else(|| c.omdb_default_api_key.clone());
    let base_url = overrides.base_url.or_else(|| config.base_url.clone()).unwrap_or_else(|| c.omdb_base_url.clone());
    let data_dir = overrides.data_dir.unwrap_or_else(default_data_dir);
    let debounce_ms = overrides.debounce_ms.or(config.debounce_ms).unwrap_or(c.search_debounce_ms);

    Self {
      api_key,
      base_url,
      data_dir,
      debounce: Duration::from_millis(debounce_ms),
      http_timeout: Duration::from_secs(c.http_timeout_secs),
    }
  }
}

/// Platform data dir (`~/.local/share/popcorn` on Linux), or `./.popcorn`
/// when no home directory can be determined.
pub fn default_data_dir() -> PathBuf {
  project_dirs().map(|d| d.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from(".popcorn"))
}
