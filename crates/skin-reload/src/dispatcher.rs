//! # Tick Dispatcher
//!
//! Runs once per host frame on the host execution context. Drains the requests
//! queued at the start of the tick and applies the refresh action to the
//! matching connected session.
//!
//! ## Per-token flow
//!
//! ```text
//! token ──→ live_sessions() ──→ valid && Connected && identity == token ?
//!                                   │ yes                     │ no
//!                                   ▼                         ▼
//!                             apply_refresh()          log, discard
//! ```
//!
//! Each token is processed under `catch_unwind`, so an error or a panic in the
//! host's refresh logic for one session does not abort the rest of the batch.
//! This relies on the default `panic = "unwind"` strategy.

use crate::domain::error::RefreshError;
use crate::domain::request::PendingRequest;
use crate::handoff::HandoffReceiver;
use crate::ports::{HostSession, RefreshAction, SessionRegistry};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, info};

/// Summary of one dispatcher invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Requests taken off the queue
    pub drained: usize,
    /// Refresh actions that completed
    pub refreshed: usize,
    /// Tokens with no connected session
    pub unresolved: usize,
    /// Refresh actions that returned an error or panicked
    pub failed: usize,
}

/// Result of processing a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DispatchOutcome {
    Refreshed,
    Unresolved,
    Failed(String),
}

/// Single consumer of the hand-off queue.
pub struct TickDispatcher<R, A> {
    queue: HandoffReceiver,
    registry: R,
    refresh: A,
    ticks: u64,
}

impl<R, A> TickDispatcher<R, A>
where
    R: SessionRegistry,
    A: RefreshAction<R::Session>,
{
    pub fn new(queue: HandoffReceiver, registry: R, refresh: A) -> Self {
        Self {
            queue,
            registry,
            refresh,
            ticks: 0,
        }
    }

    /// Per-frame entry point. Never blocks; returns immediately on an empty queue.
    pub fn on_tick(&mut self) -> TickReport {
        self.ticks += 1;

        let batch: Vec<PendingRequest> = self.queue.drain_pending().collect();
        let mut report = TickReport {
            drained: batch.len(),
            ..TickReport::default()
        };
        if batch.is_empty() {
            return report;
        }

        for request in &batch {
            match self.dispatch(request) {
                DispatchOutcome::Refreshed => report.refreshed += 1,
                DispatchOutcome::Unresolved => report.unresolved += 1,
                DispatchOutcome::Failed(reason) => {
                    error!(
                        identity = request.identity(),
                        error = %reason,
                        "Skin refresh failed"
                    );
                    report.failed += 1;
                }
            }
        }

        debug!(
            tick = self.ticks,
            drained = report.drained,
            refreshed = report.refreshed,
            unresolved = report.unresolved,
            failed = report.failed,
            "Reload tick complete"
        );

        report
    }

    /// Ticks processed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Requests still waiting for a tick.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn dispatch(&mut self, request: &PendingRequest) -> DispatchOutcome {
        let registry = &self.registry;
        let refresh = &mut self.refresh;

        let result = catch_unwind(AssertUnwindSafe(|| {
            refresh_identity(registry, refresh, request.identity())
        }));

        match result {
            Ok(Ok(true)) => DispatchOutcome::Refreshed,
            Ok(Ok(false)) => DispatchOutcome::Unresolved,
            Ok(Err(e)) => DispatchOutcome::Failed(e.to_string()),
            Err(payload) => DispatchOutcome::Failed(panic_message(payload.as_ref())),
        }
    }
}

/// Resolve `identity` to a connected session and refresh it.
///
/// Returns `Ok(false)` when no session matches.
fn refresh_identity<R, A>(registry: &R, refresh: &mut A, identity: &str) -> Result<bool, RefreshError>
where
    R: SessionRegistry,
    A: RefreshAction<R::Session>,
{
    let session = registry.live_sessions().into_iter().find(|session| {
        session.is_valid()
            && session.connection_state().is_connected()
            && session.identity() == identity
    });

    let Some(session) = session else {
        info!(identity = identity, "No connected session found for identity");
        return Ok(false);
    };

    info!(
        identity = identity,
        session = session.display_name(),
        "Executing skin refresh"
    );
    refresh.apply_refresh(&session)?;
    Ok(true)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
