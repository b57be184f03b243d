// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway-local handlers: health and the not-found and wrong-method
//! fallbacks.

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use futureguide_core::{Envelope, ErrorCode, FutureGuideError};
use serde::Serialize;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub upstream: String,
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        upstream: state.forwarder.base_url().to_string(),
    })
}

/// Fallback for unmatched paths.
pub async fn not_found(uri: Uri) -> Response {
    ApiError(FutureGuideError::NotFound(format!("no route for {}", uri.path()))).into_response()
}

/// Fallback for a known path requested with a method it does not serve.
pub async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    let envelope: Envelope = Envelope::fail(
        ErrorCode::NotFound,
        format!("method {method} is not allowed for {}", uri.path()),
    );
    (StatusCode::METHOD_NOT_ALLOWED, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            upstream: "https://api.futureguide.id/".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["uptime_secs"], 42);
        assert_eq!(json["upstream"], "https://api.futureguide.id/");
    }
}
