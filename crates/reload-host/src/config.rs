//! # Host Configuration
//!
//! Loaded in two layers:
//!
//! 1. Optional JSON file named by `SKIN_RELOAD_CONFIG`
//! 2. Environment overrides: `SKIN_RELOAD_HOST`, `SKIN_RELOAD_PORT`,
//!    `SKIN_RELOAD_TICK_RATE`, `SKIN_RELOAD_SESSIONS`
//!
//! Unparseable overrides are logged and ignored.

use serde::{Deserialize, Serialize};
use skin_reload::{ConfigError, ReloadConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_PATH_ENV: &str = "SKIN_RELOAD_CONFIG";
pub const HOST_ENV: &str = "SKIN_RELOAD_HOST";
pub const PORT_ENV: &str = "SKIN_RELOAD_PORT";
pub const TICK_RATE_ENV: &str = "SKIN_RELOAD_TICK_RATE";
pub const SESSIONS_ENV: &str = "SKIN_RELOAD_SESSIONS";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum HostConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("tick_rate must be between 1 and 1000 Hz, got {0}")]
    InvalidTickRate(u32),

    #[error(transparent)]
    Reload(#[from] ConfigError),
}

/// A player connected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSession {
    pub steam_id: String,
    pub name: String,
}

/// Complete host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Frames per second of the host loop (default: 64)
    pub tick_rate: u32,
    /// How long the network runtime gets to wind down on exit
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
    /// Players connected at startup
    pub sessions: Vec<SeedSession>,
    /// Reload listener settings
    pub reload: ReloadConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate: 64,
            shutdown_grace: Duration::from_secs(2),
            sessions: Vec::new(),
            reload: ReloadConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, HostConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HostConfigError> {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env_overrides(&lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, HostConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| HostConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| HostConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded host configuration file");
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(HOST_ENV) {
            match host.parse() {
                Ok(addr) => self.reload.host = addr,
                Err(_) => warn!(value = %host, "SKIN_RELOAD_HOST is not an IP address"),
            }
        }

        if let Some(port) = lookup(PORT_ENV) {
            match port.parse() {
                Ok(p) => self.reload.port = p,
                Err(_) => warn!(value = %port, "SKIN_RELOAD_PORT is not a valid port"),
            }
        }

        if let Some(rate) = lookup(TICK_RATE_ENV) {
            match rate.parse() {
                Ok(r) => self.tick_rate = r,
                Err(_) => warn!(value = %rate, "SKIN_RELOAD_TICK_RATE is not a number"),
            }
        }

        if let Some(sessions) = lookup(SESSIONS_ENV) {
            self.sessions = parse_sessions(&sessions);
        }
    }

    pub fn validate(&self) -> Result<(), HostConfigError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(HostConfigError::InvalidTickRate(self.tick_rate));
        }
        self.reload.validate()?;
        Ok(())
    }

    /// Time between frames.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

/// Parse `steamid:name,steamid:name`. A missing name falls back to the id.
pub fn parse_sessions(raw: &str) -> Vec<SeedSession> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let (steam_id, name) = match entry.split_once(':') {
                Some((id, name)) => (id.trim(), name.trim()),
                None => (entry, entry),
            };
            if steam_id.is_empty() {
                warn!(entry = entry, "Ignoring session seed without a steam id");
                return None;
            }
            let name = if name.is_empty() { steam_id } else { name };
            Some(SeedSession {
                steam_id: steam_id.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}
