// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallback status poller.
//!
//! Repeatedly asks a [`StatusSource`] for a job's status until the job is
//! terminal, the time budget runs out, or the caller cancels. The interval
//! widens once the job has been running for a while. Transient failures are
//! tolerated up to a limit of consecutive errors; anything else aborts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futureguide_config::model::PollerConfig;
use futureguide_core::{FutureGuideError, JobState, JobStatus};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where job status comes from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, FutureGuideError>;
}

/// Timing and error budget for one polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub slow_interval: Duration,
    /// Elapsed time after which `slow_interval` applies.
    pub slow_after: Duration,
    pub max_duration: Duration,
    pub max_consecutive_errors: u32,
}

impl PollSchedule {
    /// Interval to wait after a check made `elapsed` into the run.
    pub fn interval_at(&self, elapsed: Duration) -> Duration {
        if elapsed >= self.slow_after {
            self.slow_interval
        } else {
            self.interval
        }
    }
}

impl From<&PollerConfig> for PollSchedule {
    fn from(config: &PollerConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            slow_interval: Duration::from_secs(config.slow_interval_secs),
            slow_after: Duration::from_secs(config.slow_after_secs),
            max_duration: Duration::from_secs(config.max_duration_secs),
            max_consecutive_errors: config.max_consecutive_errors,
        }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from(&PollerConfig::default())
    }
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(JobStatus),
    Failed(JobStatus),
    /// The time budget ran out. `last` is the most recent status seen.
    TimedOut {
        elapsed: Duration,
        last: Option<JobStatus>,
    },
    Cancelled,
}

impl PollOutcome {
    /// Outcome for a terminal status, `None` for a non-terminal one.
    pub fn from_terminal(status: JobStatus) -> Option<Self> {
        match status.state {
            JobState::Completed => Some(Self::Completed(status)),
            JobState::Failed => Some(Self::Failed(status)),
            JobState::Queued | JobState::Processing => None,
        }
    }
}

pub struct StatusPoller {
    source: Arc<dyn StatusSource>,
    schedule: PollSchedule,
}

impl StatusPoller {
    pub fn new(source: Arc<dyn StatusSource>, schedule: PollSchedule) -> Self {
        Self { source, schedule }
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    /// Poll `job_id` until it is terminal, the budget runs out, or `cancel`
    /// fires.
    ///
    /// Returns `Err` when a non-transient error occurs or when
    /// `max_consecutive_errors` transient errors happen in a row.
    pub async fn poll(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, FutureGuideError> {
        self.poll_within(job_id, self.schedule.max_duration, cancel)
            .await
    }

    /// [`poll`](Self::poll) with the time budget lowered to `budget`. A zero
    /// budget times out before the first check.
    pub async fn poll_within(
        &self,
        job_id: &str,
        budget: Duration,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, FutureGuideError> {
        let budget = budget.min(self.schedule.max_duration);
        let started = Instant::now();
        let deadline = started + budget;
        let mut consecutive_errors = 0u32;
        let mut last: Option<JobStatus> = None;
        let mut checks = 0u32;

        info!(job_id, budget_secs = budget.as_secs(), "polling job status");

        loop {
            if Instant::now() >= deadline {
                let elapsed = started.elapsed();
                warn!(job_id, checks, elapsed_secs = elapsed.as_secs(), "job status polling timed out");
                return Ok(PollOutcome::TimedOut { elapsed, last });
            }

            checks += 1;
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                result = self.source.fetch_status(job_id) => result,
            };

            match fetched {
                Ok(status) => {
                    consecutive_errors = 0;
                    debug!(job_id, checks, state = %status.state, "job status");
                    if let Some(outcome) = PollOutcome::from_terminal(status.clone()) {
                        info!(job_id, checks, state = %status.state, "job reached terminal state");
                        return Ok(outcome);
                    }
                    last = Some(status);
                }
                Err(err) if !err.is_transient() => {
                    warn!(job_id, checks, code = %err.code(), "status check failed, aborting: {err}");
                    return Err(err);
                }
                Err(err) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.schedule.max_consecutive_errors {
                        warn!(
                            job_id,
                            consecutive_errors,
                            code = %err.code(),
                            "too many consecutive status check failures: {err}"
                        );
                        return Err(err);
                    }
                    debug!(job_id, consecutive_errors, code = %err.code(), "transient status check failure: {err}");
                }
            }

            let now = Instant::now();
            let wait = self
                .schedule
                .interval_at(now - started)
                .min(deadline.saturating_duration_since(now));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
