//! # Reload Host
//!
//! Reference host for the skin reload listener.
//!
//! ## Threads
//!
//! ```text
//! main thread                           skin-reload-net workers
//! ───────────                           ───────────────────────
//! FrameScheduler::run_until             axum accept loop
//!   └─ TickDispatcher::on_tick  ◀─queue─  └─ GET /update_skins
//!        ├─ PlayerTable (Rc)
//!        └─ LoadoutRefresher
//! ```
//!
//! Player state is `Rc`-based and never leaves the main thread.

pub mod config;
pub mod frames;
pub mod players;
pub mod refresh;

pub use config::{HostConfig, HostConfigError, SeedSession};
pub use frames::FrameScheduler;
pub use players::{PlayerSession, PlayerTable};
pub use refresh::LoadoutRefresher;
