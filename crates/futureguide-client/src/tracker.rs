// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observe one assessment job until it finishes.
//!
//! The tracker listens to realtime notifications first. It starts polling
//! when the grace period passes without a terminal event, or as soon as the
//! realtime side reports an auth error, gives up reconnecting, or goes away.
//! Realtime events keep being watched while polling runs; whichever source
//! sees a terminal state first decides the outcome.
//!
//! The poller's `max_duration` bounds the whole run, grace period included.

use std::time::Duration;

use futureguide_config::model::PollerConfig;
use futureguide_core::FutureGuideError;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::poller::{PollOutcome, StatusPoller};
use crate::realtime::RealtimeEvent;

/// Which source produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedVia {
    Realtime,
    Polling,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedOutcome {
    pub outcome: PollOutcome,
    pub via: ObservedVia,
}

pub struct JobTracker {
    poller: StatusPoller,
    realtime_grace: Duration,
}

impl JobTracker {
    pub fn new(poller: StatusPoller, realtime_grace: Duration) -> Self {
        Self {
            poller,
            realtime_grace,
        }
    }

    pub fn from_config(poller: StatusPoller, config: &PollerConfig) -> Self {
        Self::new(poller, Duration::from_secs(config.realtime_grace_secs))
    }

    /// Track `job_id`. Without an event receiver this is plain polling.
    ///
    /// Times out once the poller's `max_duration`, counted from this call,
    /// runs out; the reported `elapsed` is measured from here too.
    pub async fn track(
        &self,
        job_id: &str,
        events: Option<&mut mpsc::Receiver<RealtimeEvent>>,
        cancel: &CancellationToken,
    ) -> Result<TrackedOutcome, FutureGuideError> {
        let mut events = events;
        let started = Instant::now();
        let deadline = started + self.poller.schedule().max_duration;

        if events.is_some() {
            let grace = tokio::time::sleep_until((started + self.realtime_grace).min(deadline));
            tokio::pin!(grace);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Ok(TrackedOutcome {
                            outcome: PollOutcome::Cancelled,
                            via: ObservedVia::Realtime,
                        });
                    }
                    event = next_event(&mut events) => match event {
                        Some(RealtimeEvent::AuthError { message }) => {
                            warn!(job_id, %message, "realtime auth failed, falling back to polling");
                            break;
                        }
                        Some(RealtimeEvent::ReconnectFailed { attempts }) => {
                            warn!(job_id, attempts, "realtime unavailable, falling back to polling");
                            break;
                        }
                        Some(event) => {
                            if let Some(outcome) = terminal_for(job_id, &event) {
                                return Ok(TrackedOutcome { outcome, via: ObservedVia::Realtime });
                            }
                        }
                        None => {
                            debug!(job_id, "realtime channel closed, falling back to polling");
                            events = None;
                            break;
                        }
                    },
                    _ = &mut grace => {
                        info!(
                            job_id,
                            grace_secs = self.realtime_grace.as_secs(),
                            "no realtime result within grace period, falling back to polling"
                        );
                        break;
                    }
                }
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let poll = self.poller.poll_within(job_id, remaining, cancel);
        tokio::pin!(poll);

        loop {
            tokio::select! {
                result = &mut poll => {
                    return result.map(|outcome| TrackedOutcome {
                        outcome: match outcome {
                            PollOutcome::TimedOut { last, .. } => PollOutcome::TimedOut {
                                elapsed: started.elapsed(),
                                last,
                            },
                            other => other,
                        },
                        via: ObservedVia::Polling,
                    });
                }
                event = next_event(&mut events) => match event {
                    Some(event) => {
                        if let Some(outcome) = terminal_for(job_id, &event) {
                            return Ok(TrackedOutcome { outcome, via: ObservedVia::Realtime });
                        }
                    }
                    None => events = None,
                },
            }
        }
    }
}

/// Next realtime event, or never when there is no receiver.
async fn next_event(
    events: &mut Option<&mut mpsc::Receiver<RealtimeEvent>>,
) -> Option<RealtimeEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn terminal_for(job_id: &str, event: &RealtimeEvent) -> Option<PollOutcome> {
    let RealtimeEvent::Notification(notification) = event else {
        debug!(job_id, event = event.name(), "realtime event");
        return None;
    };
    if notification.job_id() != job_id {
        return None;
    }

    let outcome = PollOutcome::from_terminal(notification.to_job_status());
    match &outcome {
        Some(_) => info!(job_id, event = notification.name(), "job finished (realtime)"),
        None => debug!(job_id, event = notification.name(), "job progress (realtime)"),
    }
    outcome
}
