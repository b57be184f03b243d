// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock auth responder.
//!
//! Fabricates login, registration, and password-change responses without
//! contacting any identity provider, so front-ends keep working while the
//! upstream is unreachable. Nothing is persisted: every call mints fresh
//! identifiers from the input and the current time.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use futureguide_core::{Envelope, FutureGuideError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Token balance granted to every fabricated account.
const MOCK_TOKEN_BALANCE: u32 = 5;

/// Login / registration body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Change-password body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub user_type: String,
    pub is_active: bool,
    pub token_balance: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockSession {
    pub token: String,
    pub user: MockUser,
}

/// POST /api/mock/auth/login
pub async fn login(
    State(state): State<GatewayState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    respond(&state, payload, "Login successful (mock)", StatusCode::OK).await
}

/// POST /api/mock/auth/register
pub async fn register(
    State(state): State<GatewayState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    respond(
        &state,
        payload,
        "Registration successful (mock)",
        StatusCode::CREATED,
    )
    .await
}

/// POST /api/mock/auth/change-password
pub async fn change_password(
    State(state): State<GatewayState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return invalid_json(rejection),
    };

    if is_blank(&body.current_password) || is_blank(&body.new_password) {
        return ApiError(FutureGuideError::validation(
            "currentPassword and newPassword are required",
        ))
        .into_response();
    }

    tokio::time::sleep(state.mock.delay).await;
    (StatusCode::OK, Json(change_password_envelope(false))).into_response()
}

/// Success envelope for a password change. `mocked` marks a response that
/// stood in for an unreachable upstream.
pub fn change_password_envelope(mocked: bool) -> serde_json::Value {
    let mut body = serde_json::json!({
        "success": true,
        "message": "Password changed successfully (mock)",
    });
    if mocked {
        body["mocked"] = serde_json::Value::Bool(true);
    }
    body
}

async fn respond(
    state: &GatewayState,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
    message: &str,
    status: StatusCode,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return invalid_json(rejection),
    };

    let session = match fabricate_session(&body, Utc::now()) {
        Ok(session) => session,
        Err(err) => return ApiError(err).into_response(),
    };

    tokio::time::sleep(state.mock.delay).await;
    tracing::debug!(user_id = %session.user.id, "issued mock session");

    (status, Json(Envelope::ok(session).with_message(message))).into_response()
}

/// Validate credentials and mint a session.
///
/// The token is `mock-` followed by the hex SHA-256 of `email:millis`; the
/// user id embeds the same millisecond timestamp.
pub fn fabricate_session(
    body: &CredentialsRequest,
    now: DateTime<Utc>,
) -> Result<MockSession, FutureGuideError> {
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();

    match (email.is_empty(), password.is_empty()) {
        (true, true) => return Err(FutureGuideError::validation("Email and password are required")),
        (true, false) => return Err(FutureGuideError::validation("Email is required")),
        (false, true) => return Err(FutureGuideError::validation("Password is required")),
        (false, false) => {}
    }

    let millis = now.timestamp_millis();
    let digest = Sha256::digest(format!("{email}:{millis}").as_bytes());
    let username = body
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());

    Ok(MockSession {
        token: format!("mock-{}", hex::encode(digest)),
        user: MockUser {
            id: format!("mock-user-{millis}"),
            email: email.to_string(),
            username,
            user_type: "user".to_string(),
            is_active: true,
            token_balance: MOCK_TOKEN_BALANCE,
            created_at: now,
        },
    })
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

fn invalid_json(rejection: JsonRejection) -> Response {
    ApiError(FutureGuideError::validation(format!(
        "Invalid request body: {}",
        rejection.body_text()
    )))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(email: Option<&str>, password: Option<&str>) -> CredentialsRequest {
        CredentialsRequest {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
            username: None,
        }
    }

    #[test]
    fn missing_fields_are_named() {
        let err = fabricate_session(&creds(None, Some("x")), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Email is required");

        let err = fabricate_session(&creds(Some("a@b.com"), None), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Password is required");

        let err = fabricate_session(&creds(Some("  "), Some("")), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Email and password are required");
    }

    #[test]
    fn session_is_derived_from_email_and_time() {
        let now = Utc::now();
        let a = fabricate_session(&creds(Some("a@b.com"), Some("x")), now).unwrap();
        let b = fabricate_session(&creds(Some("a@b.com"), Some("x")), now).unwrap();
        assert_eq!(a.token, b.token);
        assert!(a.token.starts_with("mock-"));
        assert_eq!(a.token.len(), "mock-".len() + 64);
        assert_eq!(a.user.username, "a");
        assert_eq!(a.user.id, format!("mock-user-{}", now.timestamp_millis()));

        let later = now + chrono::Duration::milliseconds(1);
        let c = fabricate_session(&creds(Some("a@b.com"), Some("x")), later).unwrap();
        assert_ne!(a.token, c.token);
    }

    #[test]
    fn explicit_username_wins() {
        let mut body = creds(Some("someone@example.com"), Some("pw"));
        body.username = Some("nick".to_string());
        let session = fabricate_session(&body, Utc::now()).unwrap();
        assert_eq!(session.user.username, "nick");
    }

    #[test]
    fn fallback_envelope_is_marked() {
        assert_eq!(change_password_envelope(true)["mocked"], true);
        assert!(change_password_envelope(false).get("mocked").is_none());
    }
}
