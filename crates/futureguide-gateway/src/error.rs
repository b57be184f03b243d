// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of [`FutureGuideError`] into failure envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futureguide_core::{Envelope, FutureGuideError};

/// Route-boundary error: every failure leaves a handler as an envelope.
#[derive(Debug)]
pub struct ApiError(pub FutureGuideError);

impl From<FutureGuideError> for ApiError {
    fn from(err: FutureGuideError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope: Envelope = (&self.0).into();
        (status, Json(envelope)).into_response()
    }
}
