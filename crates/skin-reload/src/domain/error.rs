//! Error types for the reload control plane.
//!
//! - [`ReloadError`]: listener lifecycle failures surfaced to the operator.
//! - [`RequestError`]: a single HTTP request failed; recovered locally.
//! - [`RefreshError`]: a refresh action reported failure for one session.
//!
//! A token that matches no live session is not an error and has no variant here.

use crate::domain::state::ListenerState;
use std::net::SocketAddr;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}

/// Listener lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Listening socket could not be created. Fatal to the feature, not retried.
    #[error("failed to bind reload listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// `start()` called while not stopped
    #[error("reload listener is already {0}")]
    AlreadyRunning(ListenerState),
}

/// Per-request errors, answered with an HTTP status and a plain-text body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// `steamid` absent or empty
    #[error("Missing steamid parameter.")]
    MissingIdentity,

    /// The dispatcher side of the queue is gone
    #[error("Reload queue is closed.")]
    QueueClosed,
}

/// Failure reported by a refresh action for one session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// Session handle went stale between lookup and refresh
    #[error("session {0} is no longer valid")]
    SessionGone(String),

    /// Any other failure inside the host's refresh logic
    #[error("refresh failed: {0}")]
    Failed(String),
}
