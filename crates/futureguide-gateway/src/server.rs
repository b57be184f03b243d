// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use futureguide_core::FutureGuideError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_bearer;
use crate::forwarder::Forwarder;
use crate::{handlers, mock, proxy};

/// Health state for the unauthenticated health endpoint.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

/// Bounded waits applied to upstream calls.
#[derive(Debug, Clone, Copy)]
pub struct RouteTimeouts {
    /// Auth and status routes.
    pub short: Duration,
    /// Archive and submission routes.
    pub long: Duration,
}

/// Mock responder behaviour (mirrors `MockConfig` from futureguide-config).
#[derive(Debug, Clone)]
pub struct MockSettings {
    /// Artificial latency before each mock response.
    pub delay: Duration,
    /// Fabricate change-password success when the upstream is unreachable.
    pub fallback_on_upstream_failure: bool,
}

/// Shared state for axum request handlers.
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub forwarder: Arc<Forwarder>,
    pub timeouts: RouteTimeouts,
    pub mock: MockSettings,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(
        upstream_base_url: &str,
        timeouts: RouteTimeouts,
        mock: MockSettings,
    ) -> Result<Self, FutureGuideError> {
        Ok(Self {
            forwarder: Arc::new(Forwarder::new(upstream_base_url)?),
            timeouts,
            mock,
            health: HealthState {
                start_time: Instant::now(),
            },
        })
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from futureguide-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mount the `/api/mock/auth/*` routes.
    pub mock_routes: bool,
}

/// CORS policy shared by every route. Any `OPTIONS` request is answered
/// with `200` and these headers before routing.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build the gateway router.
///
/// - `GET /health` (public)
/// - `/api/proxy/auth/{login,register,schools}` (public, forwarded)
/// - `/api/proxy/...` remaining routes (bearer required, forwarded)
/// - `/api/mock/auth/*` (when `mock_routes` is set)
pub fn router(state: GatewayState, mock_routes: bool) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/proxy/auth/login", post(proxy::login))
        .route("/api/proxy/auth/register", post(proxy::register))
        .route("/api/proxy/auth/schools", get(proxy::schools))
        .with_state(state.clone());

    let authed_routes = Router::new()
        .route(
            "/api/proxy/auth/profile",
            get(proxy::profile).put(proxy::profile),
        )
        .route("/api/proxy/auth/token-balance", get(proxy::token_balance))
        .route(
            "/api/proxy/auth/change-password",
            post(proxy::change_password),
        )
        .route("/api/proxy/archive/results", get(proxy::archive_results))
        .route(
            "/api/proxy/archive/results/{id}",
            get(proxy::archive_result)
                .put(proxy::archive_result)
                .delete(proxy::archive_result),
        )
        .route("/api/proxy/assessment/submit", post(proxy::submit_assessment))
        .route(
            "/api/proxy/assessment/status/{job_id}",
            get(proxy::assessment_status),
        )
        .route_layer(axum_middleware::from_fn(require_bearer))
        .with_state(state.clone());

    let mut app = Router::new().merge(public_routes).merge(authed_routes);

    if mock_routes {
        let mock_public = Router::new()
            .route("/api/mock/auth/login", post(mock::login))
            .route("/api/mock/auth/register", post(mock::register))
            .with_state(state.clone());
        let mock_authed = Router::new()
            .route(
                "/api/mock/auth/change-password",
                post(mock::change_password),
            )
            .route_layer(axum_middleware::from_fn(require_bearer))
            .with_state(state);
        app = app.merge(mock_public).merge(mock_authed);
    }

    app.method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), FutureGuideError> {
    let upstream = state.forwarder.base_url().to_string();
    let app = router(state, config.mock_routes);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FutureGuideError::Network {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(%addr, %upstream, mock_routes = config.mock_routes, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| FutureGuideError::Unknown {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway stopped");
    Ok(())
}
