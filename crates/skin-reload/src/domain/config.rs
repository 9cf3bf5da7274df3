//! Listener configuration with validation.

use crate::domain::error::ConfigError;
use crate::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Reload listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Bind address (all interfaces by default)
    pub host: IpAddr,
    /// Port (default: 8080, 0 picks an ephemeral port)
    pub port: u16,
    /// Upper bound on handling a single request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// How long `stop()` waits for the server task to release the socket
    #[serde(with = "humantime_serde")]
    pub stop_timeout: Duration,
    /// Pending-queue length at which a warning is logged.
    ///
    /// The queue itself is unbounded; this only makes sustained overload visible.
    pub queue_warn_threshold: usize,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(5),
            queue_warn_threshold: 10_000,
        }
    }
}

impl ReloadConfig {
    /// Config bound to localhost on an ephemeral port.
    pub fn ephemeral() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout cannot be 0".into(),
            ));
        }

        if self.stop_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("stop_timeout cannot be 0".into()));
        }

        if self.queue_warn_threshold == 0 {
            return Err(ConfigError::InvalidLimit(
                "queue_warn_threshold cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get listener bind address
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
