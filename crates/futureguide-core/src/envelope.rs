// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `{success, data, error}` response envelope.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FutureGuideError};

/// Standard response shape returned by every local route.
///
/// `T` defaults to an untyped JSON value so the gateway can relay upstream
/// payloads without knowing their schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = serde_json::Value> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    /// Free-form message some upstream routes attach next to `data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error detail of a failure envelope.
///
/// `code` stays a string so envelopes produced by the upstream, which has its
/// own code vocabulary, still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Rebuild the error a failure envelope answered with `status` reports.
    ///
    /// Codes outside [`ErrorCode`] fall back to
    /// [`FutureGuideError::from_status`]. The envelope does not carry the
    /// bound a timed-out call ran under, so `bound` stands in for it.
    pub fn into_error(self, status: u16, bound: Duration) -> FutureGuideError {
        let message = self.message;
        match ErrorCode::from_str(&self.code) {
            Ok(ErrorCode::Validation) => FutureGuideError::Validation { message },
            Ok(ErrorCode::Unauthorized) => FutureGuideError::Unauthorized { message },
            Ok(ErrorCode::Timeout) => FutureGuideError::Timeout { duration: bound },
            Ok(ErrorCode::NetworkError) => FutureGuideError::Network {
                message,
                source: None,
            },
            Ok(ErrorCode::UnknownError) => FutureGuideError::Unknown {
                message,
                source: None,
            },
            Ok(ErrorCode::NotFound) => FutureGuideError::NotFound(message),
            Ok(ErrorCode::UpstreamError) | Err(_) => FutureGuideError::from_status(status, message),
        }
    }
}

impl<T> Envelope<T> {
    /// A success envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// A failure envelope.
    pub fn fail(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody::new(code, message)),
            message: None,
        }
    }

    /// Attach a top-level message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Best available human-readable failure text.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .map(|e| e.message.as_str())
            .or(self.message.as_deref())
    }
}

impl<T> From<&FutureGuideError> for Envelope<T> {
    fn from(err: &FutureGuideError) -> Self {
        Envelope::fail(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error() {
        let env = Envelope::ok(serde_json::json!({"token": "t1"}));
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": {"token": "t1"}}));
    }

    #[test]
    fn failure_envelope_from_error() {
        let err = FutureGuideError::unauthorized("Authorization header is required");
        let env: Envelope = (&err).into();
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
        assert_eq!(json["error"]["message"], "Authorization header is required");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn upstream_envelope_with_foreign_code_decodes() {
        let raw = r#"{"success":false,"error":{"code":"INVALID_CREDENTIALS","message":"wrong password"}}"#;
        let env: Envelope = serde_json::from_str(raw).unwrap();
        assert!(!env.success);
        assert_eq!(env.error_message(), Some("wrong password"));
    }

    #[test]
    fn gateway_codes_rebuild_their_variant() {
        let bound = Duration::from_secs(5);
        let body = |code: &str| ErrorBody {
            code: code.to_string(),
            message: "detail".to_string(),
        };

        let timeout = body("TIMEOUT").into_error(503, bound);
        assert!(matches!(timeout, FutureGuideError::Timeout { duration } if duration == bound));

        let network = body("NETWORK_ERROR").into_error(503, bound);
        assert_eq!(network.code(), ErrorCode::NetworkError);
        assert!(network.is_transient());

        assert_eq!(body("UNKNOWN_ERROR").into_error(503, bound).code(), ErrorCode::UnknownError);
        assert_eq!(body("VALIDATION").into_error(400, bound).code(), ErrorCode::Validation);
        assert!(matches!(
            body("UPSTREAM_ERROR").into_error(502, bound),
            FutureGuideError::Upstream { status: 502, .. }
        ));
    }

    #[test]
    fn foreign_codes_fall_back_to_status() {
        let body = ErrorBody {
            code: "INVALID_CREDENTIALS".to_string(),
            message: "wrong password".to_string(),
        };
        let err = body.into_error(401, Duration::from_secs(1));
        assert!(matches!(err, FutureGuideError::Unauthorized { ref message } if message == "wrong password"));
    }

    #[test]
    fn error_message_falls_back_to_top_level_message() {
        let raw = r#"{"success":false,"message":"Service unavailable"}"#;
        let env: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(env.error_message(), Some("Service unavailable"));
    }
}
