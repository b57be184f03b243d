// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime assessment notifications over WebSocket.

pub mod client;
pub mod protocol;
pub mod state;

pub use client::{NotificationClient, RealtimeEvent, RealtimeSettings};
pub use state::ConnectionState;
