//! Tracked-job domain model.

use chrono::{DateTime, Utc};
use courier_core::{JobEventId, JobId, TenantId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted by the queue, waiting for a worker.
    Queued,
    /// A worker is processing the job.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Running => write!(f, "running"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
            JobState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Error for an unrecognized job state string.
#[derive(Debug, Error)]
#[error("Unknown job state: {0}")]
pub struct UnknownJobState(pub String);

impl FromStr for JobState {
    type Err = UnknownJobState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobState::Queued),
            "running" => Ok(JobState::Running),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            "cancelled" => Ok(JobState::Cancelled),
            other => Err(UnknownJobState(other.to_string())),
        }
    }
}

/// A persisted record of one unit of queued work and its current state.
///
/// Created on job submission; after that, mutated only through
/// [`TrackedJobEvent`] appends.
///
/// [`TrackedJobEvent`]: crate::model::TrackedJobEvent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedJob {
    /// Tenant the job belongs to.
    pub tenant_id: TenantId,

    /// Optional grouping key.
    pub queue_group_id: Option<String>,

    /// Queue the job was submitted to.
    pub queue_id: String,

    /// Unique job ID within the tenant.
    pub job_id: JobId,

    /// Current lifecycle state.
    pub state: JobState,

    /// Payload type discriminator.
    pub data_type: String,

    /// Job payload.
    pub data: serde_json::Value,

    /// Result payload, set on completion.
    pub result: Option<serde_json::Value>,

    /// Ordered log entries.
    pub log: Vec<String>,

    /// When the job row was created.
    pub created_at: DateTime<Utc>,

    /// When the job row was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Immutable record of one state transition of a tracked job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedJobEvent {
    /// Job this event belongs to.
    pub job_id: JobId,

    /// Unique event ID.
    pub job_event_id: JobEventId,

    /// Transition trigger name.
    pub event: String,

    /// Resulting state.
    pub state: JobState,

    /// State the job was in immediately before this event.
    pub state_prev: JobState,

    /// Open metadata.
    pub metadata: serde_json::Value,

    /// Optional log entry recorded with the transition.
    pub log: Option<String>,

    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// A job together with its event history, oldest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedJobWithEvents {
    /// The job row.
    pub job: TrackedJob,

    /// Event history in insertion order.
    pub events: Vec<TrackedJobEvent>,
}

/// Parameters for creating a tracked job.
#[derive(Debug, Clone)]
pub struct CreateJobParams {
    /// Tenant the job belongs to.
    pub tenant_id: TenantId,

    /// Optional grouping key.
    pub queue_group_id: Option<String>,

    /// Queue the job was submitted to.
    pub queue_id: String,

    /// Unique job ID within the tenant.
    pub job_id: JobId,

    /// Initial lifecycle state.
    pub state: JobState,

    /// Payload type discriminator.
    pub data_type: String,

    /// Job payload.
    pub data: serde_json::Value,

    /// Trigger name for an initial job-event, or `None` to create the job
    /// row alone.
    pub initial_event: Option<String>,
}

impl CreateJobParams {
    /// Creates parameters for a freshly queued job with a `created` event.
    pub fn queued(
        tenant_id: impl Into<TenantId>,
        queue_id: impl Into<String>,
        job_id: impl Into<JobId>,
        data_type: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            queue_group_id: None,
            queue_id: queue_id.into(),
            job_id: job_id.into(),
            state: JobState::Queued,
            data_type: data_type.into(),
            data,
            initial_event: Some("created".to_string()),
        }
    }

    /// Sets the grouping key.
    #[must_use]
    pub fn group(mut self, queue_group_id: impl Into<String>) -> Self {
        self.queue_group_id = Some(queue_group_id.into());
        self
    }
}

/// Parameters for appending a job event.
#[derive(Debug, Clone)]
pub struct RecordJobEventParams {
    /// Tenant the job belongs to.
    pub tenant_id: TenantId,

    /// Job to append to.
    pub job_id: JobId,

    /// Transition trigger name.
    pub event: String,

    /// Resulting state.
    pub state: JobState,

    /// State the caller believes the job is currently in.
    pub state_prev: JobState,

    /// Open metadata.
    pub metadata: serde_json::Value,

    /// Optional log entry.
    pub log: Option<String>,
}

impl RecordJobEventParams {
    /// Creates parameters for a plain state transition.
    pub fn transition(
        tenant_id: impl Into<TenantId>,
        job_id: impl Into<JobId>,
        event: impl Into<String>,
        state_prev: JobState,
        state: JobState,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            job_id: job_id.into(),
            event: event.into(),
            state,
            state_prev,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            log: None,
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches a log entry.
    #[must_use]
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_display_and_parse() {
        for state in [
            JobState::Queued,
            JobState::Running,
            JobState::Completed,
            JobState::Failed,
            JobState::Cancelled,
        ] {
            let parsed: JobState = state.to_string().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_unknown_job_state() {
        let err = "done".parse::<JobState>().unwrap_err();
        assert!(err.to_string().contains("done"));
    }

    #[test]
    fn test_job_state_serde_snake_case() {
        let json = serde_json::to_string(&JobState::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }

    #[test]
    fn test_queued_params_default_to_created_event() {
        let params = CreateJobParams::queued("t1", "orders", "j1", "order.placed", serde_json::json!({}));
        assert_eq!(params.state, JobState::Queued);
        assert_eq!(params.initial_event.as_deref(), Some("created"));
        assert!(params.queue_group_id.is_none());

        let grouped = params.group("batch-7");
        assert_eq!(grouped.queue_group_id.as_deref(), Some("batch-7"));
    }

    #[test]
    fn test_transition_params_builder() {
        let params = RecordJobEventParams::transition(
            "t1",
            "j1",
            "started",
            JobState::Queued,
            JobState::Running,
        )
        .with_log("picked up by worker-1");

        assert_eq!(params.state_prev, JobState::Queued);
        assert_eq!(params.state, JobState::Running);
        assert_eq!(params.log.as_deref(), Some("picked up by worker-1"));
    }
}
