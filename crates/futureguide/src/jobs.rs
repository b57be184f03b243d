// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `futureguide status` and `futureguide watch`.

use std::sync::Arc;

use futureguide_client::{
    ApiClient, ApiStatusSource, JobTracker, NotificationClient, ObservedVia, PollOutcome,
    PollSchedule, RealtimeSettings, StatusPoller, TokenStore, TrackedOutcome,
};
use futureguide_config::FutureGuideConfig;
use futureguide_core::{FutureGuideError, JobStatus};
use secrecy::{ExposeSecret, SecretString};

use crate::account::require_session;
use crate::shutdown;

pub async fn run_status(
    config: &FutureGuideConfig,
    job_id: &str,
    json: bool,
) -> Result<(), FutureGuideError> {
    let store = TokenStore::from_config(&config.session)?;
    let token = require_session(&store)?;
    let api = ApiClient::from_config(&config.client)?;
    let status = api.job_status(token, job_id).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&status)
            .map_err(|e| FutureGuideError::Unknown {
                message: "failed to render status".to_string(),
                source: Some(Box::new(e)),
            })?;
        println!("{rendered}");
    } else {
        println!("{}", describe_status(&status));
    }
    Ok(())
}

/// Follow a job until it finishes, via realtime notifications with polling
/// as the fallback.
pub async fn run_watch(
    config: &FutureGuideConfig,
    job_id: &str,
    realtime: bool,
) -> Result<(), FutureGuideError> {
    let store = TokenStore::from_config(&config.session)?;
    let token = require_session(&store)?;
    let api = ApiClient::from_config(&config.client)?;

    let source = Arc::new(ApiStatusSource::new(api, copy_secret(token)));
    let poller = StatusPoller::new(source, PollSchedule::from(&config.poller));
    let tracker = JobTracker::from_config(poller, &config.poller);
    let cancel = shutdown::install_signal_handler();

    println!("watching job {job_id}");

    let tracked = if realtime {
        let (mut client, mut events) = NotificationClient::connect(
            RealtimeSettings::from(&config.realtime),
            copy_secret(token),
        );
        let tracked = tracker.track(job_id, Some(&mut events), &cancel).await;
        client.disconnect().await;
        tracked
    } else {
        tracker.track(job_id, None, &cancel).await
    };
    cancel.cancel();

    let tracked = tracked?;
    println!("{}", describe_outcome(job_id, &tracked));
    match tracked.outcome {
        PollOutcome::TimedOut { elapsed, .. } => Err(FutureGuideError::Timeout { duration: elapsed }),
        _ => Ok(()),
    }
}

fn copy_secret(token: &SecretString) -> SecretString {
    SecretString::from(token.expose_secret().to_string())
}

fn describe_status(status: &JobStatus) -> String {
    match &status.result_id {
        Some(result_id) => format!("job {}: {} (result {result_id})", status.job_id, status.state),
        None => format!("job {}: {}", status.job_id, status.state),
    }
}

fn describe_outcome(job_id: &str, tracked: &TrackedOutcome) -> String {
    let via = match tracked.via {
        ObservedVia::Realtime => "realtime",
        ObservedVia::Polling => "polling",
    };
    match &tracked.outcome {
        PollOutcome::Completed(status) | PollOutcome::Failed(status) => {
            format!("{} [via {via}]", describe_status(status))
        }
        PollOutcome::TimedOut { elapsed, last } => match last {
            Some(status) => format!(
                "job {job_id}: still {} after {}s, giving up",
                status.state,
                elapsed.as_secs()
            ),
            None => format!("job {job_id}: no status after {}s, giving up", elapsed.as_secs()),
        },
        PollOutcome::Cancelled => format!("job {job_id}: watch cancelled"),
    }
}
