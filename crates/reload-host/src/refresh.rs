//! Loadout refresh, the host-side action behind `!wp`.

use crate::players::{PlayerSession, PlayerTable};
use skin_reload::{RefreshAction, RefreshError};
use tracing::info;

/// Re-applies a player's skin loadout.
///
/// The real game host would reload skin data and re-equip weapons here; the
/// reference host records the refresh by bumping the slot's loadout version.
pub struct LoadoutRefresher {
    players: PlayerTable,
}

impl LoadoutRefresher {
    pub fn new(players: PlayerTable) -> Self {
        Self { players }
    }
}

impl RefreshAction<PlayerSession> for LoadoutRefresher {
    fn apply_refresh(&mut self, session: &PlayerSession) -> Result<(), RefreshError> {
        let version = self
            .players
            .with_player_mut(session.slot, |player| {
                player.loadout_version += 1;
                player.loadout_version
            })
            .ok_or_else(|| RefreshError::SessionGone(session.steam_id.clone()))?;

        info!(
            slot = session.slot,
            player = %session.name,
            loadout_version = version,
            "Loadout refreshed"
        );
        Ok(())
    }
}
