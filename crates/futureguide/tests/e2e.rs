// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end: client -> gateway -> stub upstream.
//!
//! Each test serves its own gateway on an ephemeral port in front of its own
//! wiremock upstream.

use std::sync::Arc;
use std::time::Duration;

use futureguide_client::{
    ApiClient, ApiStatusSource, LoginRequest, PollOutcome, PollSchedule, StatusPoller, TokenStore,
};
use futureguide_core::{ErrorCode, FutureGuideError, JobState};
use futureguide_gateway::{router, GatewayState, MockSettings, RouteTimeouts};
use secrecy::SecretString;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve a gateway for `upstream` and return its base URL.
async fn spawn_gateway(upstream: &str) -> String {
    let state = GatewayState::new(
        upstream,
        RouteTimeouts {
            short: Duration::from_secs(2),
            long: Duration::from_secs(3),
        },
        MockSettings {
            delay: Duration::ZERO,
            fallback_on_upstream_failure: false,
        },
    )
    .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state, true)).await.unwrap();
    });
    format!("http://{addr}")
}

fn fast_schedule() -> PollSchedule {
    PollSchedule {
        interval: Duration::from_millis(50),
        slow_interval: Duration::from_millis(100),
        slow_after: Duration::from_secs(5),
        max_duration: Duration::from_secs(5),
        max_consecutive_errors: 2,
    }
}

#[tokio::test]
async fn login_persists_token_used_for_status() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"token": "upstream-token", "user": {"id": "u1", "email": "a@b.com"}}
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/assessment/status/job-1"))
        .and(header("authorization", "Bearer upstream-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"jobId": "job-1", "status": "queued"}
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(&upstream.uri()).await;
    let api = ApiClient::new(&gateway, Duration::from_secs(5)).unwrap();

    let session = api
        .login(&LoginRequest {
            email: "a@b.com".into(),
            password: "x".into(),
        })
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");
    TokenStore::new(&token_path)
        .save(SecretString::from(session.token))
        .unwrap();

    let store = TokenStore::open(&token_path).unwrap();
    let status = api
        .job_status(store.token().unwrap(), "job-1")
        .await
        .unwrap();
    assert_eq!(status.state, JobState::Queued);
}

#[tokio::test]
async fn poller_follows_job_through_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/assessment/status/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"jobId": "job-2", "status": "processing"}
        })))
        .up_to_n_times(2)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/assessment/status/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"jobId": "job-2", "status": "completed", "resultId": "res-2"}
        })))
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(&upstream.uri()).await;
    let api = ApiClient::new(&gateway, Duration::from_secs(5)).unwrap();
    let source = Arc::new(ApiStatusSource::new(api, SecretString::from("tok")));

    let outcome = StatusPoller::new(source, fast_schedule())
        .poll("job-2", &CancellationToken::new())
        .await
        .unwrap();

    let PollOutcome::Completed(status) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(status.result_id.as_deref(), Some("res-2"));
}

#[tokio::test]
async fn unreachable_upstream_exhausts_poller_error_budget() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let gateway = spawn_gateway(&dead).await;
    let api = ApiClient::new(&gateway, Duration::from_secs(5)).unwrap();
    let source = Arc::new(ApiStatusSource::new(api, SecretString::from("tok")));

    let err = StatusPoller::new(source, fast_schedule())
        .poll("job-3", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, FutureGuideError::Network { .. }),
        "expected relayed network failure, got {err:?}"
    );
    assert_eq!(err.code(), ErrorCode::NetworkError);
}

#[tokio::test]
async fn expired_token_stops_polling_immediately() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/assessment/status/job-4"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "error": {"code": "UNAUTHORIZED", "message": "Token expired"}
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let gateway = spawn_gateway(&upstream.uri()).await;
    let api = ApiClient::new(&gateway, Duration::from_secs(5)).unwrap();
    let source = Arc::new(ApiStatusSource::new(api, SecretString::from("stale")));

    let err = StatusPoller::new(source, fast_schedule())
        .poll("job-4", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FutureGuideError::Unauthorized { .. }));
}
