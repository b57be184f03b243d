// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for FutureGuide.
//!
//! Failures are classified where they happen, from the structure of the
//! underlying error, and carried as a [`FutureGuideError`] variant. Route
//! handlers turn the variant into an [`ErrorCode`] and HTTP status; nothing
//! downstream re-derives the category from message text.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Wire-level error code carried in `error.code` of every failure envelope.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or malformed input.
    Validation,
    /// Missing or rejected credential.
    Unauthorized,
    /// Upstream exceeded the bounded wait.
    Timeout,
    /// Transport or DNS failure before a response arrived.
    NetworkError,
    /// Upstream answered with something the gateway cannot relay.
    UpstreamError,
    /// No local route matches.
    NotFound,
    /// Anything not classified above.
    UnknownError,
}

/// The primary error type used across the gateway and the client.
#[derive(Debug, Error)]
pub enum FutureGuideError {
    /// Configuration errors (invalid TOML, bad URLs, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Request input failed validation.
    #[error("{message}")]
    Validation { message: String },

    /// A credential was required and absent, or the upstream rejected it.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The upstream call was abandoned after the bounded wait.
    #[error("request timeout: upstream did not respond within {}s", duration.as_secs())]
    Timeout { duration: Duration },

    /// Connection refused, DNS failure, reset, or similar transport failure.
    #[error("network error: unable to reach upstream ({message})")]
    Network {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Upstream was reachable but returned an unusable or non-success response.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Realtime socket failures (handshake, framing, closed channel).
    #[error("realtime error: {message}")]
    Realtime {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local persistence failures (session token file).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No local route or resource matches.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unclassified failure.
    #[error("unknown error: {message}")]
    Unknown {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl FutureGuideError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a missing or rejected credential.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Error for an answered request that failed with `status`, when nothing
    /// more specific is known: 401 and 400 keep their meaning, anything else
    /// is an upstream failure.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Self::Validation { message },
            401 => Self::Unauthorized { message },
            _ => Self::Upstream { status, message },
        }
    }

    /// The wire code reported in the failure envelope.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::Validation,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Network { .. } => ErrorCode::NetworkError,
            Self::Upstream { .. } => ErrorCode::UpstreamError,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Config(_) | Self::Realtime { .. } | Self::Storage { .. } | Self::Unknown { .. } => {
                ErrorCode::UnknownError
            }
        }
    }

    /// HTTP status a local route answers with for this error.
    ///
    /// Transport failures (timeout, network, unclassified) are `503`. Upstream
    /// errors keep the upstream status when it is an error status and fall
    /// back to `502` otherwise.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::NotFound(_) => 404,
            Self::Timeout { .. } | Self::Network { .. } | Self::Unknown { .. } => 503,
            Self::Upstream { status, .. } if (400..=599).contains(status) => *status,
            Self::Upstream { .. } => 502,
            Self::Config(_) | Self::Realtime { .. } | Self::Storage { .. } => 500,
        }
    }

    /// Whether a caller that polls may keep going after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } | Self::Unknown { .. } => true,
            Self::Upstream { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Classify a failed reqwest call.
///
/// `timeout` is the bound that was applied to the call and is reported back
/// in [`FutureGuideError::Timeout`].
pub fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> FutureGuideError {
    if err.is_timeout() {
        FutureGuideError::Timeout { duration: timeout }
    } else if err.is_connect() || err.is_request() {
        FutureGuideError::Network {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    } else {
        FutureGuideError::Unknown {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
