// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection state of the realtime notification client.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Authenticating -> Authenticated
//!       ^              |             |              |                |
//!       +--------------+-------------+--------------+----------------+
//! ```
//!
//! Any transport-level disconnect returns to `Disconnected`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Authenticating,
    Authenticated,
}

impl ConnectionState {
    /// Whether a socket is currently open.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected
                | ConnectionState::Authenticating
                | ConnectionState::Authenticated
        )
    }

    /// Domain events are only delivered in this state.
    pub fn accepts_events(self) -> bool {
        self == ConnectionState::Authenticated
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Authenticating => write!(f, "authenticating"),
            ConnectionState::Authenticated => write!(f, "authenticated"),
        }
    }
}
