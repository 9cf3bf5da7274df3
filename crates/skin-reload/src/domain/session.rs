//! Host session connection state.

use serde::{Deserialize, Serialize};

/// Connection state of a host session. Only `Connected` sessions are refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    NeverConnected,
    Connecting,
    Connected,
    Reconnecting,
    Disconnecting,
    Disconnected,
}

impl ConnectionState {
    /// Fully connected and in-game
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}
