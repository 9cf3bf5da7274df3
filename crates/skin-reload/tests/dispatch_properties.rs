//! Property tests for the queue → dispatcher path.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use skin_reload::handoff;
use skin_reload::{
    ConnectionState, HostSession, PendingRequest, RefreshError, SessionRegistry, TickDispatcher,
};

#[derive(Clone)]
struct Session(String);

impl HostSession for Session {
    fn identity(&self) -> &str {
        &self.0
    }
    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }
    fn display_name(&self) -> &str {
        &self.0
    }
}

struct Registry(Vec<Session>);

impl SessionRegistry for Registry {
    type Session = Session;

    fn live_sessions(&self) -> Vec<Session> {
        self.0.clone()
    }
}

proptest! {
    /// Whatever one producer enqueues is refreshed in that order, once each.
    #[test]
    fn prop_single_producer_fifo(ids in prop::collection::vec("[0-9]{1,17}", 0..64)) {
        let (tx, rx) = handoff::channel(1_000);
        let seen: Rc<RefCell<Vec<String>>> = Rc::default();
        let log = Rc::clone(&seen);
        let refresh = move |s: &Session| -> Result<(), RefreshError> {
            log.borrow_mut().push(s.0.clone());
            Ok(())
        };
        let registry = Registry(ids.iter().cloned().map(Session).collect());
        let mut dispatcher = TickDispatcher::new(rx, registry, refresh);

        for id in &ids {
            tx.enqueue(PendingRequest::new(id.clone()).unwrap()).unwrap();
        }
        let report = dispatcher.on_tick();

        prop_assert_eq!(report.drained, ids.len());
        prop_assert_eq!(report.refreshed, ids.len());
        prop_assert_eq!(&*seen.borrow(), &ids);
        prop_assert_eq!(dispatcher.pending(), 0);
    }

    /// Tokens with no session are drained and discarded without refreshing anyone.
    #[test]
    fn prop_unknown_identities_never_refresh(
        known in "[0-9]{5}",
        unknown in prop::collection::vec("[a-z]{1,8}", 1..32),
    ) {
        let (tx, rx) = handoff::channel(1_000);
        let count = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&count);
        let refresh = move |_: &Session| -> Result<(), RefreshError> {
            *counter.borrow_mut() += 1;
            Ok(())
        };
        let mut dispatcher = TickDispatcher::new(rx, Registry(vec![Session(known)]), refresh);

        for id in &unknown {
            tx.enqueue(PendingRequest::new(id.clone()).unwrap()).unwrap();
        }
        let report = dispatcher.on_tick();

        prop_assert_eq!(report.unresolved, unknown.len());
        prop_assert_eq!(*count.borrow(), 0);
    }
}
