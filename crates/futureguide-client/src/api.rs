// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the FutureGuide API as exposed by the gateway.
//!
//! Every call returns the `data` of a success envelope. Transport failures go
//! through [`classify_transport_error`] exactly as the gateway classifies
//! them. Answered failures keep the gateway's classification: the envelope's
//! `error.code` is turned back into its [`FutureGuideError`] variant, and
//! bodies without a known code fall back to the HTTP status.

use std::time::Duration;

use async_trait::async_trait;
use futureguide_config::model::ClientConfig;
use futureguide_core::{classify_transport_error, Envelope, FutureGuideError, JobStatus};
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::poller::StatusSource;

/// Credentials for `login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
}

/// Body for `register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// User record returned alongside a token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "tokenBalance")]
    pub token_balance: Option<i64>,
}

/// Token and user returned by login and registration.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TokenBalance {
    #[serde(alias = "tokenBalance")]
    pub token_balance: i64,
}

/// Client bound to one API base URL (normally the local gateway).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FutureGuideError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            FutureGuideError::Config(format!("invalid API base URL `{base_url}`: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FutureGuideError::Config(format!(
                "API base URL `{base_url}` cannot carry a path"
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("futureguide-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FutureGuideError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, FutureGuideError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession, FutureGuideError> {
        require_credentials(&request.email, request.password.expose_secret())?;
        let builder = self
            .http
            .post(self.url(&["api", "proxy", "auth", "login"]))
            .json(request);
        self.send(builder).await
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<AuthSession, FutureGuideError> {
        require_credentials(&request.email, request.password.expose_secret())?;
        let builder = self
            .http
            .post(self.url(&["api", "proxy", "auth", "register"]))
            .json(request);
        self.send(builder).await
    }

    pub async fn token_balance(
        &self,
        token: &SecretString,
    ) -> Result<TokenBalance, FutureGuideError> {
        let builder = self
            .http
            .get(self.url(&["api", "proxy", "auth", "token-balance"]))
            .bearer_auth(token.expose_secret());
        self.send(builder).await
    }

    pub async fn job_status(
        &self,
        token: &SecretString,
        job_id: &str,
    ) -> Result<JobStatus, FutureGuideError> {
        if job_id.trim().is_empty() {
            return Err(FutureGuideError::validation("job id is required"));
        }
        let builder = self
            .http
            .get(self.url(&["api", "proxy", "assessment", "status", job_id]))
            .bearer_auth(token.expose_secret());
        self.send(builder).await
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, FutureGuideError> {
        let response = builder
            .send()
            .await
            .map_err(|e| classify_transport_error(e, self.timeout))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(e, self.timeout))?;
        debug!(status = status.as_u16(), bytes = bytes.len(), "api response");

        if !status.is_success() {
            return Err(error_from_body(status, &bytes, self.timeout));
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes).map_err(|e| {
            FutureGuideError::Upstream {
                status: status.as_u16(),
                message: format!("unexpected response shape: {e}"),
            }
        })?;

        match envelope {
            Envelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            Envelope { success: true, .. } => Err(FutureGuideError::Upstream {
                status: status.as_u16(),
                message: "response carried no data".to_string(),
            }),
            Envelope {
                error: Some(body), ..
            } => Err(body.into_error(status.as_u16(), self.timeout)),
            failed => Err(FutureGuideError::Upstream {
                status: status.as_u16(),
                message: failed
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            }),
        }
    }
}

/// Status source that polls through an [`ApiClient`] with a fixed token.
#[derive(Debug)]
pub struct ApiStatusSource {
    api: ApiClient,
    token: SecretString,
}

impl ApiStatusSource {
    pub fn new(api: ApiClient, token: SecretString) -> Self {
        Self { api, token }
    }
}

#[async_trait]
impl StatusSource for ApiStatusSource {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, FutureGuideError> {
        self.api.job_status(&self.token, job_id).await
    }
}

/// The password leaves its wrapper only on the way into the request body.
fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn require_credentials(email: &str, password: &str) -> Result<(), FutureGuideError> {
    match (email.trim().is_empty(), password.is_empty()) {
        (true, true) => Err(FutureGuideError::validation("Email and password are required")),
        (true, false) => Err(FutureGuideError::validation("Email is required")),
        (false, true) => Err(FutureGuideError::validation("Password is required")),
        (false, false) => Ok(()),
    }
}

/// `bound` fills in for a relayed `TIMEOUT`, see [`futureguide_core::ErrorBody::into_error`].
fn error_from_body(status: StatusCode, bytes: &[u8], bound: Duration) -> FutureGuideError {
    match serde_json::from_slice::<Envelope>(bytes) {
        Ok(Envelope {
            error: Some(body), ..
        }) => body.into_error(status.as_u16(), bound),
        Ok(Envelope {
            message: Some(message),
            ..
        }) => FutureGuideError::from_status(status.as_u16(), message),
        _ => FutureGuideError::from_status(
            status.as_u16(),
            status.canonical_reason().unwrap_or("request failed"),
        ),
    }
}
