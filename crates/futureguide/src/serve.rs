// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `futureguide serve` command implementation.

use futureguide_config::FutureGuideConfig;
use futureguide_core::FutureGuideError;
use futureguide_gateway::{start_server, GatewayState, MockSettings, RouteTimeouts, ServerConfig};
use tracing::{info, warn};

use crate::shutdown;

/// Build gateway state from configuration.
pub fn gateway_state(config: &FutureGuideConfig) -> Result<GatewayState, FutureGuideError> {
    GatewayState::new(
        &config.upstream.base_url,
        RouteTimeouts {
            short: config.upstream.timeout(),
            long: config.upstream.long_timeout(),
        },
        MockSettings {
            delay: config.mock.delay(),
            fallback_on_upstream_failure: config.mock.fallback_on_upstream_failure,
        },
    )
}

/// Runs the gateway until SIGINT or SIGTERM.
pub async fn run_serve(config: FutureGuideConfig) -> Result<(), FutureGuideError> {
    info!(version = env!("CARGO_PKG_VERSION"), "starting futureguide gateway");

    if config.mock.fallback_on_upstream_failure {
        warn!("change-password upstream failures will be answered with mocked success");
    }

    let state = gateway_state(&config)?;
    let server = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
        mock_routes: config.mock.enabled,
    };

    let cancel = shutdown::install_signal_handler();
    start_server(&server, state, cancel).await
}
