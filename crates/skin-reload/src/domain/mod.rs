//! Domain types for the reload control plane.
//!
//! Configuration, error taxonomy, the queued request and the lifecycle state.
//! Nothing in here performs I/O.

pub mod config;
pub mod error;
pub mod request;
pub mod session;
pub mod state;

pub use config::ReloadConfig;
pub use error::{ConfigError, RefreshError, ReloadError, RequestError};
pub use request::PendingRequest;
pub use session::ConnectionState;
pub use state::ListenerState;
