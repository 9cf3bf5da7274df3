//! # Skin Reload - HTTP-triggered refreshes replayed on the host tick
//!
//! Lets an external caller ask a running host to re-apply a player's skin
//! loadout. Requests arrive on a background network runtime, but the host's
//! session state may only be touched from its own tick loop, so the two sides
//! meet at a single hand-off queue.
//!
//! ## Architecture
//!
//! ```text
//!  caller ──GET /update_skins?steamid=..──→ ┌──────────────────┐
//!                                           │  ReloadListener  │  tokio runtime
//!                                           │  (axum, 1 task   │  (background)
//!                                           │   per connection)│
//!                                           └────────┬─────────┘
//!                                                    │ enqueue()
//!                                           ┌────────▼─────────┐
//!                                           │   Handoff queue  │  unbounded MPSC
//!                                           └────────┬─────────┘
//!                                                    │ drain_pending()
//!                                           ┌────────▼─────────┐
//!                                           │  TickDispatcher  │  host thread,
//!                                           │  SessionRegistry │  once per frame
//!                                           │  RefreshAction   │
//!                                           └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! - The listener never calls into host state; it only enqueues.
//! - The queue has exactly one consumer, the dispatcher, which runs on the
//!   host execution context and never blocks.
//! - A fault while handling one request or one token never stops the accept
//!   loop or the rest of the tick's batch.
//!
//! ## Usage
//!
//! ```ignore
//! use skin_reload::{ReloadConfig, ReloadListener};
//!
//! let mut listener = ReloadListener::new(ReloadConfig::default(), runtime.handle().clone())?;
//! listener.start(&mut host_scheduler, sessions, refresher)?;
//! // ... host runs its frames ...
//! listener.stop();
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod dispatcher;
pub mod domain;
pub mod handoff;
pub mod listener;
pub mod ports;

// Re-exports for public API
pub use dispatcher::{TickDispatcher, TickReport};
pub use domain::config::ReloadConfig;
pub use domain::error::{ConfigError, RefreshError, ReloadError, RequestError};
pub use domain::request::PendingRequest;
pub use domain::session::ConnectionState;
pub use domain::state::ListenerState;
pub use handoff::{HandoffReceiver, HandoffSender, QueueStats};
pub use listener::ReloadListener;
pub use ports::{HostSession, RefreshAction, SessionRegistry, TickScheduler};

/// Path served by the listener.
pub const UPDATE_SKINS_PATH: &str = "/update_skins";

/// Query parameter carrying the identity token.
pub const IDENTITY_PARAM: &str = "steamid";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;
