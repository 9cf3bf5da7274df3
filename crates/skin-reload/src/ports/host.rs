use crate::domain::error::RefreshError;
use crate::domain::session::ConnectionState;

/// Host per-frame scheduler.
pub trait TickScheduler {
    /// Register a callback invoked with no arguments once per host frame.
    fn register_tick_callback(&mut self, callback: Box<dyn FnMut()>);
}

/// A live session as seen by the dispatcher.
pub trait HostSession {
    /// Identity compared against queued tokens by exact string equality.
    fn identity(&self) -> &str;

    fn connection_state(&self) -> ConnectionState;

    /// Human-readable name, used in log lines only.
    fn display_name(&self) -> &str;

    /// False when the underlying host handle has gone stale.
    fn is_valid(&self) -> bool {
        true
    }
}

/// Read access to the host's current sessions.
pub trait SessionRegistry {
    type Session: HostSession;

    fn live_sessions(&self) -> Vec<Self::Session>;
}

/// The host's refresh logic for one session.
pub trait RefreshAction<S> {
    fn apply_refresh(&mut self, session: &S) -> Result<(), RefreshError>;
}

impl<S, F> RefreshAction<S> for F
where
    F: FnMut(&S) -> Result<(), RefreshError>,
{
    fn apply_refresh(&mut self, session: &S) -> Result<(), RefreshError> {
        self(session)
    }
}
