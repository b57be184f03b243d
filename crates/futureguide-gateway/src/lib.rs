// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the FutureGuide web client.
//!
//! Every `/api/proxy/...` route forwards to the upstream REST API with header
//! passthrough and a bounded wait, and every failure comes back as a
//! `{success: false, error: {code, message}}` envelope. `/api/mock/auth/...`
//! routes answer without the upstream for local development.

pub mod auth;
pub mod error;
pub mod forwarder;
pub mod handlers;
pub mod mock;
pub mod proxy;
pub mod server;

pub use error::ApiError;
pub use forwarder::Forwarder;
pub use server::{
    router, start_server, GatewayState, HealthState, MockSettings, RouteTimeouts, ServerConfig,
};
