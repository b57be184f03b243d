// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-presence middleware for authenticated routes.
//!
//! The gateway does not validate tokens; the upstream does. This layer only
//! turns a missing `Authorization: Bearer <token>` into a local 401 so the
//! request never leaves the gateway.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futureguide_core::FutureGuideError;

use crate::error::ApiError;

/// Extract a non-empty bearer token from `Authorization`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Reject requests without a bearer token.
pub async fn require_bearer(request: Request, next: Next) -> Response {
    if bearer_token(request.headers()).is_some() {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "rejected request without bearer token");
    ApiError(FutureGuideError::unauthorized(
        "Authorization header with a Bearer token is required",
    ))
    .into_response()
}
