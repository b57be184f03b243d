// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: URL schemes, non-zero
//! timeouts, and the ordering between poller intervals.

use crate::diagnostic::ConfigError;
use crate::model::FutureGuideConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &FutureGuideConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "logging.level `{}` must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        fail(format!(
            "gateway.host `{host}` is not a valid IP address or hostname"
        ));
    }

    if !has_scheme(&config.upstream.base_url, &["http://", "https://"]) {
        fail(format!(
            "upstream.base_url `{}` must start with http:// or https://",
            config.upstream.base_url
        ));
    }
    if config.upstream.timeout_secs == 0 {
        fail("upstream.timeout_secs must be greater than 0".to_string());
    }
    if config.upstream.long_timeout_secs < config.upstream.timeout_secs {
        fail(format!(
            "upstream.long_timeout_secs ({}) must not be shorter than upstream.timeout_secs ({})",
            config.upstream.long_timeout_secs, config.upstream.timeout_secs
        ));
    }

    if !has_scheme(&config.realtime.url, &["ws://", "wss://"]) {
        fail(format!(
            "realtime.url `{}` must start with ws:// or wss://",
            config.realtime.url
        ));
    }
    if config.realtime.reconnect_delay_ms > config.realtime.max_reconnect_delay_ms {
        fail(format!(
            "realtime.reconnect_delay_ms ({}) exceeds realtime.max_reconnect_delay_ms ({})",
            config.realtime.reconnect_delay_ms, config.realtime.max_reconnect_delay_ms
        ));
    }
    if config.realtime.connect_timeout_ms == 0 {
        fail("realtime.connect_timeout_ms must be greater than 0".to_string());
    }
    if config.realtime.event_buffer == 0 {
        fail("realtime.event_buffer must be at least 1".to_string());
    }

    let poller = &config.poller;
    if poller.interval_secs == 0 {
        fail("poller.interval_secs must be greater than 0".to_string());
    }
    if poller.slow_interval_secs < poller.interval_secs {
        fail(format!(
            "poller.slow_interval_secs ({}) must not be shorter than poller.interval_secs ({})",
            poller.slow_interval_secs, poller.interval_secs
        ));
    }
    if poller.max_duration_secs <= poller.interval_secs {
        fail(format!(
            "poller.max_duration_secs ({}) must be longer than poller.interval_secs ({})",
            poller.max_duration_secs, poller.interval_secs
        ));
    }
    if poller.max_consecutive_errors == 0 {
        fail("poller.max_consecutive_errors must be at least 1".to_string());
    }

    if config.session.token_path.trim().is_empty() {
        fail("session.token_path must not be empty".to_string());
    }

    if !has_scheme(&config.client.api_base_url, &["http://", "https://"]) {
        fail(format!(
            "client.api_base_url `{}` must start with http:// or https://",
            config.client.api_base_url
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}
