use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default API base used when nothing is configured.
const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub network: NetworkConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the PolicyVault API (e.g., "https://api.policyvault.app")
  pub url: String,
  /// Request timeout in seconds
  #[serde(default = "default_request_timeout")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: DEFAULT_API_URL.to_string(),
      timeout_secs: default_request_timeout(),
    }
  }
}

fn default_request_timeout() -> u64 {
  15
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Set to false to run without an offline cache
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Database location (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
  /// Probe the API host before fetching; when false the client assumes it is online
  #[serde(default = "default_true")]
  pub probe: bool,
  #[serde(default = "default_probe_timeout")]
  pub probe_timeout_ms: u64,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      probe: true,
      probe_timeout_ms: default_probe_timeout(),
    }
  }
}

fn default_probe_timeout() -> u64 {
  1500
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
  /// Default filter directive when RUST_LOG is unset (e.g., "info", "policyvault=debug")
  pub level: Option<String>,
  /// Directory for log files (defaults to the user data directory)
  pub dir: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./policyvault.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/policyvault/config.yaml
  ///
  /// Without a config file the defaults are used. `POLICYVAULT_API_URL`
  /// overrides the API URL either way.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(url) = std::env::var("POLICYVAULT_API_URL") {
      config.api.url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("policyvault.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("policyvault").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_full_config() {
    let config = Config::parse(
      r#"
api:
  url: https://api.policyvault.app
  timeout_secs: 5
cache:
  enabled: false
  path: /tmp/pv/offline.db
network:
  probe: false
log:
  level: debug
"#,
    )
    .unwrap();

    assert_eq!(config.api.url, "https://api.policyvault.app");
    assert_eq!(config.api.timeout_secs, 5);
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/pv/offline.db")));
    assert!(!config.network.probe);
    assert_eq!(config.network.probe_timeout_ms, 1500);
    assert_eq!(config.log.level.as_deref(), Some("debug"));
  }

  #[test]
  fn test_missing_sections_use_defaults() {
    let config = Config::parse("api:\n  url: http://example.test\n").unwrap();
    assert_eq!(config.api.timeout_secs, 15);
    assert!(config.cache.enabled);
    assert!(config.cache.path.is_none());
    assert!(config.network.probe);
  }

  #[test]
  fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(Config::load(Some(missing.as_path())).is_err());
  }
}
