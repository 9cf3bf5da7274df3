//! Outbound ports into the host application.
//!
//! All three are called from the host execution context only, so none of them
//! require `Send`. Hosts can back them with `Rc<RefCell<_>>` state.

mod host;

pub use host::{HostSession, RefreshAction, SessionRegistry, TickScheduler};
