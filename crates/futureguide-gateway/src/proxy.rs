// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proxy route handlers.
//!
//! Each `/api/proxy/...` route maps one-to-one onto an upstream path. The
//! handler reads the inbound request, hands it to the [`Forwarder`], and
//! relays the upstream JSON and status with forwarding metadata headers.
//!
//! [`Forwarder`]: crate::forwarder::Forwarder

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futureguide_core::FutureGuideError;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::forwarder::{UpstreamRequest, UpstreamResponse, REQUEST_ID_HEADER};
use crate::mock;
use crate::server::{GatewayState, RouteTimeouts};

/// Largest inbound body the gateway will buffer before forwarding.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Which of the two configured bounds a route waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTimeout {
    Short,
    Long,
}

impl RouteTimeout {
    fn resolve(self, timeouts: &RouteTimeouts) -> std::time::Duration {
        match self {
            RouteTimeout::Short => timeouts.short,
            RouteTimeout::Long => timeouts.long,
        }
    }
}

/// Static description of a forwarded route.
#[derive(Debug, Clone, Copy)]
pub struct ProxyRoute {
    /// Name used in logs.
    pub name: &'static str,
    /// Upstream path segments; a route parameter, if any, is appended.
    pub upstream: &'static [&'static str],
    pub timeout: RouteTimeout,
}

pub const LOGIN: ProxyRoute = ProxyRoute {
    name: "auth.login",
    upstream: &["api", "auth", "login"],
    timeout: RouteTimeout::Short,
};

pub const REGISTER: ProxyRoute = ProxyRoute {
    name: "auth.register",
    upstream: &["api", "auth", "register"],
    timeout: RouteTimeout::Short,
};

pub const PROFILE: ProxyRoute = ProxyRoute {
    name: "auth.profile",
    upstream: &["api", "auth", "profile"],
    timeout: RouteTimeout::Short,
};

pub const TOKEN_BALANCE: ProxyRoute = ProxyRoute {
    name: "auth.token_balance",
    upstream: &["api", "auth", "token-balance"],
    timeout: RouteTimeout::Short,
};

pub const CHANGE_PASSWORD: ProxyRoute = ProxyRoute {
    name: "auth.change_password",
    upstream: &["api", "auth", "change-password"],
    timeout: RouteTimeout::Short,
};

pub const SCHOOLS: ProxyRoute = ProxyRoute {
    name: "auth.schools",
    upstream: &["api", "auth", "schools"],
    timeout: RouteTimeout::Short,
};

pub const ARCHIVE_RESULTS: ProxyRoute = ProxyRoute {
    name: "archive.results",
    upstream: &["api", "archive", "results"],
    timeout: RouteTimeout::Long,
};

pub const ARCHIVE_RESULT: ProxyRoute = ProxyRoute {
    name: "archive.result",
    upstream: &["api", "archive", "results"],
    timeout: RouteTimeout::Long,
};

pub const SUBMIT_ASSESSMENT: ProxyRoute = ProxyRoute {
    name: "assessment.submit",
    upstream: &["api", "assessment", "submit"],
    timeout: RouteTimeout::Long,
};

pub const ASSESSMENT_STATUS: ProxyRoute = ProxyRoute {
    name: "assessment.status",
    upstream: &["api", "assessment", "status"],
    timeout: RouteTimeout::Short,
};

/// POST /api/proxy/auth/login
pub async fn login(State(state): State<GatewayState>, request: Request) -> Response {
    relay(&state, &LOGIN, None, request).await
}

/// POST /api/proxy/auth/register
pub async fn register(State(state): State<GatewayState>, request: Request) -> Response {
    relay(&state, &REGISTER, None, request).await
}

/// GET|PUT /api/proxy/auth/profile
pub async fn profile(State(state): State<GatewayState>, request: Request) -> Response {
    relay(&state, &PROFILE, None, request).await
}

/// GET /api/proxy/auth/token-balance
pub async fn token_balance(State(state): State<GatewayState>, request: Request) -> Response {
    relay(&state, &TOKEN_BALANCE, None, request).await
}

/// GET /api/proxy/auth/schools
pub async fn schools(State(state): State<GatewayState>, request: Request) -> Response {
    relay(&state, &SCHOOLS, None, request).await
}

/// POST /api/proxy/auth/change-password
///
/// With `fallback_on_upstream_failure` set, a transport failure is answered
/// with a fabricated success marked `"mocked": true`.
pub async fn change_password(State(state): State<GatewayState>, request: Request) -> Response {
    let request_id = request_id(request.headers());
    match forward(&state, &CHANGE_PASSWORD, None, request, &request_id).await {
        Ok(upstream) => relay_response(upstream, &request_id),
        Err(err)
            if state.mock.fallback_on_upstream_failure
                && matches!(
                    err,
                    FutureGuideError::Timeout { .. }
                        | FutureGuideError::Network { .. }
                        | FutureGuideError::Unknown { .. }
                ) =>
        {
            warn!(
                %request_id,
                code = %err.code(),
                "upstream unreachable, answering change-password with mocked success"
            );
            (StatusCode::OK, Json(mock::change_password_envelope(true))).into_response()
        }
        Err(err) => ApiError(err).into_response(),
    }
}

/// GET /api/proxy/archive/results
pub async fn archive_results(State(state): State<GatewayState>, request: Request) -> Response {
    relay(&state, &ARCHIVE_RESULTS, None, request).await
}

/// GET|PUT|DELETE /api/proxy/archive/results/{id}
pub async fn archive_result(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    relay(&state, &ARCHIVE_RESULT, Some(&id), request).await
}

/// POST /api/proxy/assessment/submit
pub async fn submit_assessment(State(state): State<GatewayState>, request: Request) -> Response {
    relay(&state, &SUBMIT_ASSESSMENT, None, request).await
}

/// GET /api/proxy/assessment/status/{job_id}
pub async fn assessment_status(
    State(state): State<GatewayState>,
    Path(job_id): Path<String>,
    request: Request,
) -> Response {
    relay(&state, &ASSESSMENT_STATUS, Some(&job_id), request).await
}

/// Forward and convert the outcome into a response.
async fn relay(
    state: &GatewayState,
    route: &ProxyRoute,
    param: Option<&str>,
    request: Request,
) -> Response {
    let request_id = request_id(request.headers());
    match forward(state, route, param, request, &request_id).await {
        Ok(upstream) => relay_response(upstream, &request_id),
        Err(err) => ApiError(err).into_response(),
    }
}

async fn forward(
    state: &GatewayState,
    route: &ProxyRoute,
    param: Option<&str>,
    request: Request,
    request_id: &str,
) -> Result<UpstreamResponse, FutureGuideError> {
    let (parts, body) = request.into_parts();
    let body = read_body(body).await?;

    let mut segments: Vec<&str> = route.upstream.to_vec();
    if let Some(param) = param {
        segments.push(param);
    }

    let upstream = state
        .forwarder
        .forward(UpstreamRequest {
            method: parts.method.clone(),
            segments,
            query: parts.uri.query(),
            headers: &parts.headers,
            body,
            timeout: route.timeout.resolve(&state.timeouts),
            request_id,
        })
        .await;

    match &upstream {
        Ok(resp) => info!(
            route = route.name,
            %request_id,
            method = %parts.method,
            status = resp.status.as_u16(),
            "proxied request"
        ),
        Err(err) => warn!(
            route = route.name,
            %request_id,
            method = %parts.method,
            code = %err.code(),
            "proxy request failed"
        ),
    }

    upstream
}

async fn read_body(body: Body) -> Result<axum::body::Bytes, FutureGuideError> {
    axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| FutureGuideError::validation(format!("request body could not be read: {e}")))
}

/// Relay the upstream JSON body and status, adding forwarding metadata headers.
fn relay_response(upstream: UpstreamResponse, request_id: &str) -> Response {
    let mut response = (upstream.status, Json(upstream.body)).into_response();
    let headers = response.headers_mut();
    headers.insert("x-proxied-by", HeaderValue::from_static("futureguide-gateway"));
    headers.insert("x-upstream-status", HeaderValue::from(upstream.status.as_u16()));
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Reuse the caller's request id when it sent a usable one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
