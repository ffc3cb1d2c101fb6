use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration. Every field has a default, so the tool runs
/// with no config file at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub github: GithubConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
  /// API base URL; point at a GitHub Enterprise host if needed
  pub url: String,
  /// Search term used when the query is blank
  pub default_query: String,
  /// Result-count cap per search (the API caps this at 100)
  pub per_page: u32,
}

impl Default for GithubConfig {
  fn default() -> Self {
    Self {
      url: "https://api.github.com".to_string(),
      default_query: "rust".to_string(),
      per_page: 100,
    }
  }
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided (an error if missing)
  /// 2. ./reposcope.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/reposcope/config.yaml
  ///
  /// Falls back to the built-in defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("reposcope.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("reposcope").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// GitHub token from the environment, if any. Searches work without one,
  /// just with a lower rate limit.
  ///
  /// Checks RS_GITHUB_TOKEN first, then GITHUB_TOKEN as fallback.
  pub fn get_api_token() -> Option<String> {
    std::env::var("RS_GITHUB_TOKEN")
      .or_else(|_| std::env::var("GITHUB_TOKEN"))
      .ok()
  }
}
