//! Application configuration with persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sync::SyncOptions;

const CONFIG_DIR: &str = "mpvsync";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("Invalid config file: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("{0}")]
  Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
  /// Custom MPV executable path (None = auto-detect).
  #[serde(default)]
  pub mpv_path: Option<String>,

  /// Additional MPV command-line arguments.
  #[serde(default)]
  pub mpv_args: Vec<String>,

  /// Base directory for relative media references (None = working directory).
  #[serde(default)]
  pub media_root: Option<String>,

  /// Remote seeks closer than this many seconds are ignored.
  #[serde(default = "default_seek_threshold")]
  pub seek_threshold_secs: u32,

  /// Drift-correction broadcast interval in seconds.
  #[serde(default = "default_sync_interval")]
  pub sync_interval_secs: u32,

  /// Give up on a single outbound message after this many milliseconds.
  #[serde(default = "default_send_timeout")]
  pub send_timeout_ms: u64,
}

fn default_seek_threshold() -> u32 {
  1
}

fn default_sync_interval() -> u32 {
  5
}

fn default_send_timeout() -> u64 {
  2000
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      mpv_path: None,
      mpv_args: Vec::new(),
      media_root: None,
      seek_threshold_secs: default_seek_threshold(),
      sync_interval_secs: default_sync_interval(),
      send_timeout_ms: default_send_timeout(),
    }
  }
}

impl AppConfig {
  /// Where the config lives when no path is given.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
  }

  /// Read a config file. A missing file yields the defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = match std::fs::read_to_string(path) {
      Ok(text) => text,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Self::default());
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        })
      }
    };

    let config: Self = toml::from_str(&text)?;
    config.validate()?;
    Ok(config)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.sync_interval_secs < 1 || self.sync_interval_secs > 60 {
      return Err(ConfigError::Invalid(
        "Sync interval must be between 1 and 60 seconds".to_string(),
      ));
    }
    if self.send_timeout_ms == 0 {
      return Err(ConfigError::Invalid(
        "Send timeout must be greater than zero".to_string(),
      ));
    }
    if self.mpv_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
      return Err(ConfigError::Invalid("MPV path cannot be empty".to_string()));
    }
    Ok(())
  }

  /// Media root as a path, defaulting to the working directory.
  pub fn media_root(&self) -> PathBuf {
    match &self.media_root {
      Some(root) if !root.is_empty() => PathBuf::from(root),
      _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
  }

  /// Session tunables for the given local media reference.
  pub fn sync_options(&self, local_reference: Option<String>) -> SyncOptions {
    SyncOptions {
      seek_threshold_secs: i64::from(self.seek_threshold_secs),
      sync_interval: Duration::from_secs(u64::from(self.sync_interval_secs)),
      send_timeout: Duration::from_millis(self.send_timeout_ms),
      media_root: self.media_root(),
      local_reference,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_defaults_match_protocol_constants() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
    let options = config.sync_options(None);
    assert_eq!(options.seek_threshold_secs, 1);
    assert_eq!(options.sync_interval, Duration::from_secs(5));
  }

  #[test]
  fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, AppConfig::default());
  }

  #[test]
  fn test_partial_file_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "media_root = \"/srv/media\"\nsync_interval_secs = 10").unwrap();

    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.media_root(), PathBuf::from("/srv/media"));
    assert_eq!(config.sync_interval_secs, 10);
    assert_eq!(config.seek_threshold_secs, 1);
    assert_eq!(config.send_timeout_ms, 2000);
  }

  #[test]
  fn test_out_of_range_interval_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "sync_interval_secs = 0").unwrap();
    assert!(matches!(
      AppConfig::load(file.path()),
      Err(ConfigError::Invalid(_))
    ));
  }

  #[test]
  fn test_garbage_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "sync_interval_secs = \"often\"").unwrap();
    assert!(matches!(AppConfig::load(file.path()), Err(ConfigError::Parse(_))));
  }
}
