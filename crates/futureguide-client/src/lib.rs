// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client context for the FutureGuide API.
//!
//! One context owns one session token ([`TokenStore`]), one realtime socket
//! ([`NotificationClient`]), and the polling fallback used to observe
//! assessment jobs ([`StatusPoller`], [`JobTracker`]).

pub mod api;
pub mod poller;
pub mod realtime;
pub mod session;
pub mod tracker;

pub use api::{ApiClient, ApiStatusSource, AuthSession, AuthUser, LoginRequest, RegisterRequest, TokenBalance};
pub use poller::{PollOutcome, PollSchedule, StatusPoller, StatusSource};
pub use realtime::{ConnectionState, NotificationClient, RealtimeEvent, RealtimeSettings};
pub use session::TokenStore;
pub use tracker::{JobTracker, ObservedVia, TrackedOutcome};
