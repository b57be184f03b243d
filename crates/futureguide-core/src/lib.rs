// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types shared by the FutureGuide gateway and client.
//!
//! This crate owns the error taxonomy every local route reports through,
//! the `{success, data, error}` response envelope, and the data model for
//! assessment jobs and their server-pushed notifications.

pub mod envelope;
pub mod error;
pub mod types;

pub use envelope::{Envelope, ErrorBody};
pub use error::{classify_transport_error, ErrorCode, FutureGuideError};
pub use types::{AnalysisNotification, JobState, JobStatus, NotificationEvent};
