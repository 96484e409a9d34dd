// Configuration - config.json, environment overrides and tuning constants

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::services::{AutoPickSettings, PollIntervals};

pub const CONFIG_ENV: &str = "LOL_TOOLKIT_CONFIG";
pub const API_KEY_ENV: &str = "RIOT_API_KEY";
pub const REGION_ENV: &str = "LOL_REGION";
const APP_DIR: &str = "lol-toolkit";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid config: {0}")]
  Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutoAcceptConfig {
  pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutoPickConfig {
  pub enabled: bool,
  pub auto_accept: bool,
  pub auto_pick: bool,
  pub auto_lock: bool,
  /// Name wins over `champion_id` when both are set.
  pub champion: Option<String>,
  pub champion_id: Option<i64>,
}

impl Default for AutoPickConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      auto_accept: true,
      auto_pick: true,
      auto_lock: true,
      champion: None,
      champion_id: None,
    }
  }
}

impl AutoPickConfig {
  /// Toggles for the engine. A champion given by name is resolved later against the client.
  pub fn settings(&self) -> AutoPickSettings {
    AutoPickSettings {
      auto_accept: self.auto_accept,
      auto_pick: self.auto_pick,
      auto_lock: self.auto_lock,
      champion_id: self.champion_id.filter(|id| *id > 0),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Tuning {
  pub very_fast_poll_ms: u64,
  pub fast_poll_ms: u64,
  pub slow_poll_ms: u64,
  pub pick_poll_ms: u64,
  pub accept_cooldown_secs: u64,
  pub connection_ttl_secs: u64,
  pub health_check_secs: u64,
  pub request_timeout_secs: u64,
}

impl Default for Tuning {
  fn default() -> Self {
    Self {
      very_fast_poll_ms: 200,
      fast_poll_ms: 500,
      slow_poll_ms: 3000,
      pick_poll_ms: 500,
      accept_cooldown_secs: 10,
      connection_ttl_secs: 30,
      health_check_secs: 2,
      request_timeout_secs: 5,
    }
  }
}

impl Tuning {
  pub fn poll_intervals(&self) -> PollIntervals {
    PollIntervals {
      very_fast: Duration::from_millis(self.very_fast_poll_ms),
      fast: Duration::from_millis(self.fast_poll_ms),
      slow: Duration::from_millis(self.slow_poll_ms),
    }
  }

  pub fn pick_interval(&self) -> Duration {
    Duration::from_millis(self.pick_poll_ms)
  }

  pub fn accept_cooldown(&self) -> Duration {
    Duration::from_secs(self.accept_cooldown_secs)
  }

  pub fn connection_ttl(&self) -> Duration {
    Duration::from_secs(self.connection_ttl_secs)
  }

  pub fn health_check(&self) -> Duration {
    Duration::from_secs(self.health_check_secs)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    let non_zero = [
      ("very_fast_poll_ms", self.very_fast_poll_ms),
      ("fast_poll_ms", self.fast_poll_ms),
      ("slow_poll_ms", self.slow_poll_ms),
      ("pick_poll_ms", self.pick_poll_ms),
      ("connection_ttl_secs", self.connection_ttl_secs),
      ("health_check_secs", self.health_check_secs),
      ("request_timeout_secs", self.request_timeout_secs),
    ];
    if let Some((name, _)) = non_zero.iter().find(|(_, v)| *v == 0) {
      return Err(ConfigError::Validation(format!("tuning.{} must be greater than zero", name)));
    }
    if !(self.very_fast_poll_ms <= self.fast_poll_ms && self.fast_poll_ms <= self.slow_poll_ms) {
      return Err(ConfigError::Validation(
        "poll intervals must satisfy very_fast <= fast <= slow".to_string(),
      ));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
  pub riot_api_key: String,
  pub region: String,
  pub auto_accept: AutoAcceptConfig,
  pub auto_pick: AutoPickConfig,
  pub tuning: Tuning,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      riot_api_key: String::new(),
      region: crate::riot::client::DEFAULT_REGION.to_string(),
      auto_accept: AutoAcceptConfig::default(),
      auto_pick: AutoPickConfig::default(),
      tuning: Tuning::default(),
    }
  }
}

impl Config {
  pub fn from_json(content: &str, path: &Path) -> Result<Self, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&content, path)
  }

  /// `%APPDATA%/lol-toolkit/config.json`, or `./config.json` without `APPDATA`.
  pub fn user_config_path(appdata: Option<&str>) -> PathBuf {
    match appdata.filter(|dir| !dir.is_empty()) {
      Some(dir) => Path::new(dir).join(APP_DIR).join(CONFIG_FILE),
      None => PathBuf::from(CONFIG_FILE),
    }
  }

  /// Explicit path (argument, then `LOL_TOOLKIT_CONFIG`), else the user config if present,
  /// else defaults. Environment overrides are applied last.
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let from_env = std::env::var(CONFIG_ENV).ok().filter(|p| !p.is_empty()).map(PathBuf::from);
    let explicit = explicit.map(Path::to_path_buf).or(from_env);
    let appdata = std::env::var("APPDATA").ok();

    let mut config = Self::load_from(explicit.as_deref(), appdata.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
  }

  fn load_from(explicit: Option<&Path>, appdata: Option<&str>) -> Result<Self, ConfigError> {
    if let Some(path) = explicit {
      tracing::info!(path = %path.display(), "loading config");
      return Self::from_file(path);
    }

    let user = Self::user_config_path(appdata);
    if user.is_file() {
      tracing::info!(path = %user.display(), "loading user config");
      return Self::from_file(&user);
    }

    tracing::debug!("no config file found, using defaults");
    Ok(Self::default())
  }

  /// Apply `RIOT_API_KEY` and `LOL_REGION` from `lookup`. Empty values are ignored.
  pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
      self.riot_api_key = key.trim().to_string();
    }
    if let Some(region) = lookup(REGION_ENV).filter(|v| !v.trim().is_empty()) {
      self.region = region.trim().to_ascii_lowercase();
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    self.tuning.validate()
  }

  pub fn has_api_key(&self) -> bool {
    !self.riot_api_key.trim().is_empty()
  }

  /// Auto-pick toggles with ready-check accepting left to the auto-accept engine when it runs.
  pub fn auto_pick_settings(&self) -> AutoPickSettings {
    let mut settings = self.auto_pick.settings();
    if self.auto_accept.enabled && settings.auto_accept {
      tracing::info!("auto-accept engine enabled, auto-pick will not accept ready checks");
      settings.auto_accept = false;
    }
    settings
  }
}
