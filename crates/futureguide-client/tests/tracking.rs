// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poller and job tracker timing on a paused clock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futureguide_client::{
    JobTracker, ObservedVia, PollOutcome, PollSchedule, RealtimeEvent, StatusPoller, StatusSource,
};
use futureguide_core::{AnalysisNotification, FutureGuideError, JobState, JobStatus, NotificationEvent};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
enum Step {
    State(JobState),
    NetworkError,
    Unauthorized,
}

/// Answers from a script, then repeats `fallback` forever.
struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    started: Instant,
    calls: Mutex<Vec<Duration>>,
}

impl ScriptedSource {
    fn new(script: impl IntoIterator<Item = Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            started: Instant::now(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Offsets from construction at which each check happened, in seconds.
    fn call_secs(&self) -> Vec<u64> {
        self.calls.lock().unwrap().iter().map(|d| d.as_secs()).collect()
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, FutureGuideError> {
        self.calls.lock().unwrap().push(self.started.elapsed());
        let step = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);
        match step {
            Step::State(state) => Ok(JobStatus {
                job_id: job_id.to_string(),
                state,
                result_id: (state == JobState::Completed).then(|| "res-1".to_string()),
                updated_at: Utc::now(),
            }),
            Step::NetworkError => Err(FutureGuideError::Network {
                message: "connection refused".into(),
                source: None,
            }),
            Step::Unauthorized => Err(FutureGuideError::unauthorized("token expired")),
        }
    }
}

fn schedule() -> PollSchedule {
    PollSchedule {
        interval: Duration::from_secs(3),
        slow_interval: Duration::from_secs(10),
        slow_after: Duration::from_secs(9),
        max_duration: Duration::from_secs(60),
        max_consecutive_errors: 3,
    }
}

fn poller(source: &Arc<ScriptedSource>) -> StatusPoller {
    StatusPoller::new(source.clone(), schedule())
}

fn notification(job_id: &str) -> AnalysisNotification {
    AnalysisNotification {
        job_id: job_id.to_string(),
        result_id: Some("res-rt".to_string()),
        message: None,
        error: None,
        metadata: None,
        timestamp: Utc::now(),
    }
}

#[tokio::test(start_paused = true)]
async fn poller_stops_at_completion() {
    let source = ScriptedSource::new(
        [
            Step::State(JobState::Queued),
            Step::State(JobState::Processing),
            Step::State(JobState::Completed),
        ],
        Step::State(JobState::Processing),
    );

    let outcome = poller(&source)
        .poll("job-1", &CancellationToken::new())
        .await
        .unwrap();

    let PollOutcome::Completed(status) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(status.result_id.as_deref(), Some("res-1"));
    assert_eq!(source.call_secs(), vec![0, 3, 6]);
}

#[tokio::test(start_paused = true)]
async fn poller_reports_failed_job() {
    let source = ScriptedSource::new([Step::State(JobState::Failed)], Step::State(JobState::Failed));
    let outcome = poller(&source)
        .poll("job-1", &CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, PollOutcome::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn poller_widens_interval_after_threshold() {
    let source = ScriptedSource::new([], Step::State(JobState::Processing));
    let mut schedule = schedule();
    schedule.max_duration = Duration::from_secs(30);

    let outcome = StatusPoller::new(source.clone(), schedule)
        .poll("job-1", &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        PollOutcome::TimedOut { elapsed, last } => {
            assert_eq!(elapsed, Duration::from_secs(30));
            assert_eq!(last.unwrap().state, JobState::Processing);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(source.call_secs(), vec![0, 3, 6, 9, 19, 29]);
}

#[tokio::test(start_paused = true)]
async fn poller_tolerates_transient_errors() {
    let source = ScriptedSource::new(
        [
            Step::NetworkError,
            Step::NetworkError,
            Step::State(JobState::Processing),
            Step::NetworkError,
            Step::NetworkError,
            Step::State(JobState::Completed),
        ],
        Step::State(JobState::Processing),
    );

    let outcome = poller(&source)
        .poll("job-1", &CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, PollOutcome::Completed(_)));
    assert_eq!(source.call_secs().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn poller_aborts_after_consecutive_errors() {
    let source = ScriptedSource::new([], Step::NetworkError);
    let err = poller(&source)
        .poll("job-1", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FutureGuideError::Network { .. }));
    assert_eq!(source.call_secs(), vec![0, 3, 6]);
}

#[tokio::test(start_paused = true)]
async fn poller_aborts_immediately_when_unauthorized() {
    let source = ScriptedSource::new([Step::Unauthorized], Step::State(JobState::Completed));
    let err = poller(&source)
        .poll("job-1", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FutureGuideError::Unauthorized { .. }));
    assert_eq!(source.call_secs().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn poller_stops_on_cancel() {
    let source = ScriptedSource::new([], Step::State(JobState::Processing));
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            cancel.cancel();
        })
    };

    let outcome = poller(&source).poll("job-1", &cancel).await.unwrap();
    canceller.await.unwrap();
    assert_eq!(outcome, PollOutcome::Cancelled);
    assert_eq!(source.call_secs(), vec![0, 3]);
}

#[tokio::test(start_paused = true)]
async fn tracker_prefers_realtime_result() {
    let source = ScriptedSource::new([], Step::State(JobState::Processing));
    let tracker = JobTracker::new(poller(&source), Duration::from_secs(20));
    let (tx, mut rx) = mpsc::channel(8);

    tokio::spawn(async move {
        tx.send(RealtimeEvent::Authenticated).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send(RealtimeEvent::Notification(NotificationEvent::AnalysisStarted(
            notification("job-1"),
        )))
        .await
        .unwrap();
        tx.send(RealtimeEvent::Notification(NotificationEvent::AnalysisComplete(
            notification("other-job"),
        )))
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        tx.send(RealtimeEvent::Notification(NotificationEvent::AnalysisComplete(
            notification("job-1"),
        )))
        .await
        .unwrap();
    });

    let tracked = tracker
        .track("job-1", Some(&mut rx), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tracked.via, ObservedVia::Realtime);
    let PollOutcome::Completed(status) = tracked.outcome else {
        panic!("expected completion, got {:?}", tracked.outcome);
    };
    assert_eq!(status.result_id.as_deref(), Some("res-rt"));
    assert!(source.call_secs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn tracker_polls_after_grace_period() {
    let source = ScriptedSource::new(
        [Step::State(JobState::Processing), Step::State(JobState::Completed)],
        Step::State(JobState::Processing),
    );
    let tracker = JobTracker::new(poller(&source), Duration::from_secs(20));
    let (_tx, mut rx) = mpsc::channel::<RealtimeEvent>(8);

    let tracked = tracker
        .track("job-1", Some(&mut rx), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tracked.via, ObservedVia::Polling);
    assert!(matches!(tracked.outcome, PollOutcome::Completed(_)));
    assert_eq!(source.call_secs(), vec![20, 23]);
}

#[tokio::test(start_paused = true)]
async fn tracker_polls_immediately_on_auth_error() {
    let source = ScriptedSource::new([Step::State(JobState::Failed)], Step::State(JobState::Failed));
    let tracker = JobTracker::new(poller(&source), Duration::from_secs(20));
    let (tx, mut rx) = mpsc::channel(8);
    tx.send(RealtimeEvent::AuthError {
        message: "Invalid token".into(),
    })
    .await
    .unwrap();

    let tracked = tracker
        .track("job-1", Some(&mut rx), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tracked.via, ObservedVia::Polling);
    assert!(matches!(tracked.outcome, PollOutcome::Failed(_)));
    assert_eq!(source.call_secs(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn tracker_polls_immediately_when_reconnect_fails() {
    let source = ScriptedSource::new([Step::State(JobState::Completed)], Step::State(JobState::Completed));
    let tracker = JobTracker::new(poller(&source), Duration::from_secs(20));
    let (tx, mut rx) = mpsc::channel(8);
    tx.send(RealtimeEvent::ReconnectFailed { attempts: 5 }).await.unwrap();

    let tracked = tracker
        .track("job-1", Some(&mut rx), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(tracked.via, ObservedVia::Polling);
    assert_eq!(source.call_secs(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn realtime_result_can_win_while_polling() {
    let source = ScriptedSource::new([], Step::State(JobState::Processing));
    let tracker = JobTracker::new(poller(&source), Duration::from_secs(20));
    let (tx, mut rx) = mpsc::channel(8);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(25)).await;
        tx.send(RealtimeEvent::Notification(NotificationEvent::AnalysisFailed(
            notification("job-1"),
        )))
        .await
        .unwrap();
        // Keep the sender alive so the channel does not close first.
        tokio::time::sleep(Duration::from_secs(600)).await;
    });

    let tracked = tracker
        .track("job-1", Some(&mut rx), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tracked.via, ObservedVia::Realtime);
    assert!(matches!(tracked.outcome, PollOutcome::Failed(_)));
    assert_eq!(source.call_secs(), vec![20, 23]);
}

#[tokio::test(start_paused = true)]
async fn grace_period_counts_against_the_time_budget() {
    let source = ScriptedSource::new([], Step::State(JobState::Processing));
    let mut schedule = schedule();
    schedule.max_duration = Duration::from_secs(30);
    let tracker = JobTracker::new(
        StatusPoller::new(source.clone(), schedule),
        Duration::from_secs(20),
    );
    let (_tx, mut rx) = mpsc::channel::<RealtimeEvent>(8);

    let tracked = tracker
        .track("job-1", Some(&mut rx), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tracked.via, ObservedVia::Polling);
    let PollOutcome::TimedOut { elapsed, last } = tracked.outcome else {
        panic!("expected timeout, got {:?}", tracked.outcome);
    };
    assert_eq!(elapsed, Duration::from_secs(30));
    assert_eq!(last.map(|s| s.state), Some(JobState::Processing));
    assert_eq!(source.call_secs(), vec![20, 23, 26, 29]);
}

#[tokio::test(start_paused = true)]
async fn grace_longer_than_budget_times_out_without_polling() {
    let source = ScriptedSource::new([], Step::State(JobState::Processing));
    let mut schedule = schedule();
    schedule.max_duration = Duration::from_secs(15);
    let tracker = JobTracker::new(
        StatusPoller::new(source.clone(), schedule),
        Duration::from_secs(20),
    );
    let (_tx, mut rx) = mpsc::channel::<RealtimeEvent>(8);

    let tracked = tracker
        .track("job-1", Some(&mut rx), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        tracked.outcome,
        PollOutcome::TimedOut {
            elapsed: Duration::from_secs(15),
            last: None
        }
    );
    assert!(source.call_secs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn tracker_without_realtime_is_plain_polling() {
    let source = ScriptedSource::new([Step::State(JobState::Completed)], Step::State(JobState::Completed));
    let tracker = JobTracker::new(poller(&source), Duration::from_secs(20));

    let tracked = tracker
        .track("job-1", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(tracked.via, ObservedVia::Polling);
    assert_eq!(source.call_secs(), vec![0]);
}
