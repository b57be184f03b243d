// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-attempt request forwarding to the upstream REST API.
//!
//! The forwarder copies method, a fixed set of headers, query string, and
//! body onto a request against `base_url + path`, bounds it with a timeout,
//! and returns the upstream's JSON body and status untouched. Transport
//! failures come back already classified; there are no retries.

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use futureguide_core::{classify_transport_error, FutureGuideError};
use reqwest::Url;
use tracing::{debug, warn};

/// Inbound headers copied onto the upstream request.
const PASSTHROUGH_HEADERS: &[header::HeaderName] = &[header::AUTHORIZATION, header::ACCEPT];

/// Header carrying the per-request correlation id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// One outbound call, assembled by a route handler.
#[derive(Debug)]
pub struct UpstreamRequest<'a> {
    pub method: Method,
    /// Path segments appended to the base URL, unencoded.
    pub segments: Vec<&'a str>,
    pub query: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub body: Bytes,
    pub timeout: Duration,
    pub request_id: &'a str,
}

/// What the upstream answered.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

/// HTTP client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    base_url: Url,
}

impl Forwarder {
    pub fn new(base_url: &str) -> Result<Self, FutureGuideError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            FutureGuideError::Config(format!("invalid upstream base URL `{base_url}`: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FutureGuideError::Config(format!(
                "upstream base URL `{base_url}` cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("futureguide-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FutureGuideError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build `base_url + segments + ?query`. Segments are percent-encoded.
    pub fn upstream_url(&self, segments: &[&str], query: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.set_query(query.filter(|q| !q.is_empty()));
        url
    }

    /// Forward one request. Exactly one upstream attempt is made.
    pub async fn forward(
        &self,
        request: UpstreamRequest<'_>,
    ) -> Result<UpstreamResponse, FutureGuideError> {
        let url = self.upstream_url(&request.segments, request.query);
        let started = Instant::now();

        let content_type = request
            .headers
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));

        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .timeout(request.timeout)
            .header(header::CONTENT_TYPE, content_type)
            .header(REQUEST_ID_HEADER, request.request_id);

        for name in PASSTHROUGH_HEADERS {
            if let Some(value) = request.headers.get(name) {
                builder = builder.header(name, value.clone());
            }
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        debug!(
            request_id = request.request_id,
            method = %request.method,
            url = %url,
            has_auth = request.headers.contains_key(header::AUTHORIZATION),
            "forwarding request upstream"
        );

        let response = builder.send().await.map_err(|e| {
            let err = classify_transport_error(e, request.timeout);
            warn!(
                request_id = request.request_id,
                url = %url,
                code = %err.code(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "upstream call failed: {err}"
            );
            err
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(e, request.timeout))?;

        debug!(
            request_id = request.request_id,
            status = status.as_u16(),
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        let body = decode_body(status, &bytes)?;
        Ok(UpstreamResponse { status, body })
    }
}

/// Decode the upstream body as JSON. An empty body becomes a bare envelope;
/// anything that is not JSON is an upstream error.
fn decode_body(status: StatusCode, bytes: &[u8]) -> Result<serde_json::Value, FutureGuideError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::json!({ "success": status.is_success() }));
    }

    serde_json::from_slice(bytes).map_err(|_| FutureGuideError::Upstream {
        status: status.as_u16(),
        message: format!("upstream returned a non-JSON response (status {})", status.as_u16()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_segments_and_query() {
        let fwd = Forwarder::new("https://api.futureguide.id").unwrap();
        let url = fwd.upstream_url(&["api", "archive", "results"], Some("page=2&limit=10"));
        assert_eq!(
            url.as_str(),
            "https://api.futureguide.id/api/archive/results?page=2&limit=10"
        );
    }

    #[test]
    fn url_handles_trailing_slash_and_encodes_params() {
        let fwd = Forwarder::new("https://api.futureguide.id/").unwrap();
        let url = fwd.upstream_url(&["api", "assessment", "status", "job 1/x"], None);
        assert_eq!(
            url.as_str(),
            "https://api.futureguide.id/api/assessment/status/job%201%2Fx"
        );
    }

    #[test]
    fn empty_query_is_dropped() {
        let fwd = Forwarder::new("http://localhost:9000").unwrap();
        let url = fwd.upstream_url(&["api", "auth", "schools"], Some(""));
        assert_eq!(url.as_str(), "http://localhost:9000/api/auth/schools");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = Forwarder::new("not a url").unwrap_err();
        assert!(matches!(err, FutureGuideError::Config(_)));
    }

    #[test]
    fn non_json_body_is_upstream_error() {
        let err = decode_body(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.http_status(), 502);
        assert_eq!(err.code().to_string(), "UPSTREAM_ERROR");
    }

    #[test]
    fn empty_body_becomes_bare_envelope() {
        let body = decode_body(StatusCode::NO_CONTENT, b"").unwrap();
        assert_eq!(body, serde_json::json!({"success": true}));
    }
}
