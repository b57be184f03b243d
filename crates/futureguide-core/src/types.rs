// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assessment job status and notification types.
//!
//! Jobs are created and advanced by the upstream analysis service; this side
//! only observes them. Field names follow the upstream's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an assessment analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[serde(alias = "pending")]
    Queued,
    #[serde(alias = "running")]
    Processing,
    Completed,
    Failed,
}

impl JobState {
    /// `completed` and `failed` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Processing => write!(f, "processing"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of a job as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_id: String,
    #[serde(rename = "status")]
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Payload shared by the three analysis notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisNotification {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// A server-pushed analysis event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum NotificationEvent {
    #[serde(rename = "analysis-started")]
    AnalysisStarted(AnalysisNotification),
    #[serde(rename = "analysis-complete")]
    AnalysisComplete(AnalysisNotification),
    #[serde(rename = "analysis-failed")]
    AnalysisFailed(AnalysisNotification),
}

impl NotificationEvent {
    pub fn payload(&self) -> &AnalysisNotification {
        match self {
            NotificationEvent::AnalysisStarted(p)
            | NotificationEvent::AnalysisComplete(p)
            | NotificationEvent::AnalysisFailed(p) => p,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.payload().job_id
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::AnalysisStarted(_) => "analysis-started",
            NotificationEvent::AnalysisComplete(_) => "analysis-complete",
            NotificationEvent::AnalysisFailed(_) => "analysis-failed",
        }
    }

    /// The job state this event implies.
    pub fn job_state(&self) -> JobState {
        match self {
            NotificationEvent::AnalysisStarted(_) => JobState::Processing,
            NotificationEvent::AnalysisComplete(_) => JobState::Completed,
            NotificationEvent::AnalysisFailed(_) => JobState::Failed,
        }
    }

    /// Convert to a status snapshot so realtime and polled observations
    /// can be handled uniformly.
    pub fn to_job_status(&self) -> JobStatus {
        let payload = self.payload();
        JobStatus {
            job_id: payload.job_id.clone(),
            state: self.job_state(),
            result_id: payload.result_id.clone(),
            updated_at: payload.timestamp,
        }
    }
}
