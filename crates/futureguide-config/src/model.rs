// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup with a suggestion instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level FutureGuide configuration.
///
/// Every section is optional and defaults to values suitable for running the
/// gateway locally against the production upstream.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FutureGuideConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Local HTTP gateway bind settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Upstream REST API the proxy routes forward to.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Mock auth responder settings.
    #[serde(default)]
    pub mock: MockConfig,

    /// Realtime notification socket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Fallback status poller settings.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Client-side session token persistence.
    #[serde(default)]
    pub session: SessionConfig,

    /// Client API settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for FutureGuide crates (trace, debug, info, warn, error).
    /// `RUST_LOG` overrides this when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Local gateway bind configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Upstream REST API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL every proxy path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bounded wait for auth and status routes.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bounded wait for archive and submission routes.
    #[serde(default = "default_long_timeout_secs")]
    pub long_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn long_timeout(&self) -> Duration {
        Duration::from_secs(self.long_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            long_timeout_secs: default_long_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.futureguide.id".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_long_timeout_secs() -> u64 {
    15
}

/// Mock auth responder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MockConfig {
    /// Mount the `/api/mock/auth/*` routes.
    #[serde(default = "default_mock_enabled")]
    pub enabled: bool,

    /// Artificial latency applied to every mock response.
    #[serde(default = "default_mock_delay_ms")]
    pub delay_ms: u64,

    /// Answer a transport failure on change-password with a fabricated
    /// success. Development only.
    #[serde(default)]
    pub fallback_on_upstream_failure: bool,
}

impl MockConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            enabled: default_mock_enabled(),
            delay_ms: default_mock_delay_ms(),
            fallback_on_upstream_failure: false,
        }
    }
}

fn default_mock_enabled() -> bool {
    true
}

fn default_mock_delay_ms() -> u64 {
    500
}

/// Realtime notification socket configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    /// WebSocket URL of the notification gateway (`ws://` or `wss://`).
    #[serde(default = "default_realtime_url")]
    pub url: String,

    /// Automatic reconnection attempts before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Delay before the first reconnection attempt; doubles per attempt.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Upper bound for the reconnection delay.
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Bound on the TCP connect plus WebSocket upgrade. An elapsed bound
    /// counts as a failed attempt.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Capacity of the event channel handed to the subscriber.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: default_realtime_url(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_realtime_url() -> String {
    "wss://api.futureguide.id/notifications".to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_max_reconnect_delay_ms() -> u64 {
    5000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_event_buffer() -> usize {
    64
}

/// Fallback status poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Interval between status checks while the job is young.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Interval once the job has been non-terminal for `slow_after_secs`.
    #[serde(default = "default_slow_interval_secs")]
    pub slow_interval_secs: u64,

    #[serde(default = "default_slow_after_secs")]
    pub slow_after_secs: u64,

    /// Give up and report a timeout after this long.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,

    /// Consecutive transient failures tolerated before polling aborts.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    /// How long the job tracker waits on realtime before it starts polling.
    #[serde(default = "default_realtime_grace_secs")]
    pub realtime_grace_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            slow_interval_secs: default_slow_interval_secs(),
            slow_after_secs: default_slow_after_secs(),
            max_duration_secs: default_max_duration_secs(),
            max_consecutive_errors: default_max_consecutive_errors(),
            realtime_grace_secs: default_realtime_grace_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    3
}

fn default_slow_interval_secs() -> u64 {
    10
}

fn default_slow_after_secs() -> u64 {
    60
}

fn default_max_duration_secs() -> u64 {
    600
}

fn default_max_consecutive_errors() -> u32 {
    5
}

fn default_realtime_grace_secs() -> u64 {
    20
}

/// Session token persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// File holding the current session token.
    #[serde(default = "default_token_path")]
    pub token_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
        }
    }
}

fn default_token_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("futureguide").join("session.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("futureguide-session.json"))
        .to_string_lossy()
        .to_string()
}

/// Client API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the gateway the CLI talks to.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}
