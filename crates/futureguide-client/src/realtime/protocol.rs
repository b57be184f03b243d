// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification channel wire format.
//!
//! Every frame is a JSON text message `{"event": <name>, "data": <payload>}`.
//!
//! Client -> Server:
//! ```json
//! {"event": "authenticate", "data": {"token": "..."}}
//! ```
//!
//! Server -> Client:
//! ```json
//! {"event": "authenticated", "data": {...}}
//! {"event": "auth_error", "data": {"message": "Invalid token"}}
//! {"event": "analysis-complete", "data": {"jobId": "...", "resultId": "...", "timestamp": "..."}}
//! ```

use futureguide_core::{AnalysisNotification, FutureGuideError, NotificationEvent};
use serde::{Deserialize, Serialize};

pub const AUTHENTICATE: &str = "authenticate";
pub const AUTHENTICATED: &str = "authenticated";
pub const AUTH_ERROR: &str = "auth_error";

/// Frames the client sends.
#[derive(Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientFrame<'a> {
    #[serde(rename = "authenticate")]
    Authenticate { token: &'a str },
}

impl ClientFrame<'_> {
    pub fn encode(&self) -> Result<String, FutureGuideError> {
        serde_json::to_string(self).map_err(|e| FutureGuideError::Realtime {
            message: "failed to encode client frame".to_string(),
            source: Some(Box::new(e)),
        })
    }
}

/// Frames the server sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    Authenticated,
    AuthError { message: String },
    Notification(NotificationEvent),
    /// An event name this client does not handle.
    Unknown(String),
}

#[derive(Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ServerFrame {
    pub fn parse(text: &str) -> Result<Self, FutureGuideError> {
        let raw: RawFrame = serde_json::from_str(text).map_err(malformed)?;

        let frame = match raw.event.as_str() {
            AUTHENTICATED => ServerFrame::Authenticated,
            AUTH_ERROR => ServerFrame::AuthError {
                message: auth_error_message(&raw.data),
            },
            "analysis-started" => {
                ServerFrame::Notification(NotificationEvent::AnalysisStarted(payload(raw.data)?))
            }
            "analysis-complete" => {
                ServerFrame::Notification(NotificationEvent::AnalysisComplete(payload(raw.data)?))
            }
            "analysis-failed" => {
                ServerFrame::Notification(NotificationEvent::AnalysisFailed(payload(raw.data)?))
            }
            _ => ServerFrame::Unknown(raw.event),
        };
        Ok(frame)
    }
}

fn payload(data: serde_json::Value) -> Result<AnalysisNotification, FutureGuideError> {
    serde_json::from_value(data).map_err(malformed)
}

fn auth_error_message(data: &serde_json::Value) -> String {
    data.as_str()
        .or_else(|| data.get("message").and_then(|m| m.as_str()))
        .filter(|m| !m.is_empty())
        .unwrap_or("authentication failed")
        .to_string()
}

fn malformed(e: serde_json::Error) -> FutureGuideError {
    FutureGuideError::Realtime {
        message: format!("malformed server frame: {e}"),
        source: Some(Box::new(e)),
    }
}
