//! # Player Table
//!
//! All player state lives here and is owned by the host thread. The table is an
//! `Rc<RefCell<_>>` handle, so it cannot be sent to the network runtime; the
//! only way in from there is the reload queue.

use crate::config::SeedSession;
use skin_reload::{ConnectionState, HostSession, SessionRegistry};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Snapshot of one player slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSession {
    pub slot: u32,
    pub steam_id: String,
    pub name: String,
    pub state: ConnectionState,
    /// Cleared when the slot is recycled; snapshots taken earlier go stale.
    pub valid: bool,
    /// Incremented every time the loadout is re-applied.
    pub loadout_version: u32,
}

impl HostSession for PlayerSession {
    fn identity(&self) -> &str {
        &self.steam_id
    }

    fn connection_state(&self) -> ConnectionState {
        self.state
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Shared handle to the host's player slots.
#[derive(Debug, Clone, Default)]
pub struct PlayerTable {
    slots: Rc<RefCell<Vec<PlayerSession>>>,
}

impl PlayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every seed already connected.
    pub fn seeded(seeds: &[SeedSession]) -> Self {
        let table = Self::new();
        for seed in seeds {
            table.connect(&seed.steam_id, &seed.name);
        }
        table
    }

    /// Occupy the next free slot with a connected player. Returns the slot.
    pub fn connect(&self, steam_id: &str, name: &str) -> u32 {
        let mut slots = self.slots.borrow_mut();
        let slot = slots.len() as u32;
        slots.push(PlayerSession {
            slot,
            steam_id: steam_id.to_string(),
            name: name.to_string(),
            state: ConnectionState::Connected,
            valid: true,
            loadout_version: 0,
        });
        debug!(slot = slot, steam_id = steam_id, name = name, "Player connected");
        slot
    }

    /// Mark a slot disconnected and invalidate its handle.
    pub fn disconnect(&self, slot: u32) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.get_mut(slot as usize) {
            Some(player) => {
                player.state = ConnectionState::Disconnected;
                player.valid = false;
                true
            }
            None => false,
        }
    }

    pub fn set_state(&self, slot: u32, state: ConnectionState) {
        if let Some(player) = self.slots.borrow_mut().get_mut(slot as usize) {
            player.state = state;
        }
    }

    pub fn get(&self, slot: u32) -> Option<PlayerSession> {
        self.slots.borrow().get(slot as usize).cloned()
    }

    /// Apply `f` to the live entry for `slot`, if it is still valid.
    pub fn with_player_mut<T>(
        &self,
        slot: u32,
        f: impl FnOnce(&mut PlayerSession) -> T,
    ) -> Option<T> {
        let mut slots = self.slots.borrow_mut();
        slots
            .get_mut(slot as usize)
            .filter(|player| player.valid)
            .map(f)
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

impl SessionRegistry for PlayerTable {
    type Session = PlayerSession;

    fn live_sessions(&self) -> Vec<PlayerSession> {
        self.slots.borrow().clone()
    }
}
