//! Queue-engine boundary.
//!
//! The external queue engine is an opaque collaborator. This module defines
//! the two seams the rest of the crate talks through: [`QueueClient`] for
//! producing (enqueue, schedule) and [`QueueConsumer`] for worker-side
//! consumption. Concrete adapters over a real engine implement these traits
//! and are injected where needed; nothing in this crate extends an engine
//! type. Retry and backoff live entirely behind these seams.

use crate::error::{QueueError, QueueResult};
use crate::scheduler::TaskDefinition;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::JobId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for a single enqueue.
#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    /// Caller-supplied job ID for idempotent submission.
    pub job_id: Option<JobId>,

    /// Delay before the job becomes runnable.
    pub delay: Option<Duration>,

    /// Grouping key understood by the engine (FIFO-per-group engines).
    pub group_id: Option<String>,
}

impl EnqueueOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a caller-supplied job ID.
    #[must_use]
    pub fn job_id(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Sets a delay before execution.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the engine-level grouping key.
    #[must_use]
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

/// Producer-side capability of the external queue engine.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Enqueues a job payload onto the named queue.
    async fn enqueue(
        &self,
        queue: &str,
        job_name: &str,
        payload: serde_json::Value,
        opts: EnqueueOptions,
    ) -> QueueResult<JobId>;

    /// Submits a task to run once at a fixed time.
    async fn schedule_at(&self, task: &TaskDefinition, run_at: DateTime<Utc>) -> QueueResult<()>;

    /// Submits a task to run on a recurring interval.
    async fn schedule_every(&self, task: &TaskDefinition, every: Duration) -> QueueResult<()>;
}

/// A job handed to a worker by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredJob {
    /// Engine-assigned job ID.
    pub job_id: JobId,

    /// Queue the job was dequeued from.
    pub queue: String,

    /// Job type name, used for handler dispatch.
    pub name: String,

    /// Job payload.
    pub payload: serde_json::Value,

    /// Attempt number (1-based), as reported by the engine.
    pub attempt: u32,

    /// When the engine accepted the job.
    pub enqueued_at: DateTime<Utc>,
}

/// Consumer-side capability of the external queue engine.
#[async_trait]
pub trait QueueConsumer: Send + Sync {
    /// Fetches the next job from the given queues, or `None` when idle.
    async fn next_job(&self, queues: &[&str], worker_id: &str) -> QueueResult<Option<DeliveredJob>>;

    /// Acknowledges successful processing, with an optional result payload.
    async fn complete(&self, job_id: &JobId, result: Option<serde_json::Value>) -> QueueResult<()>;

    /// Reports a processing failure. The engine decides on retry or burial.
    async fn fail(&self, job_id: &JobId, error: &QueueError) -> QueueResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_options_builder() {
        let opts = EnqueueOptions::new()
            .job_id("j-1")
            .delay(Duration::from_secs(5))
            .group_id("tenant-a");

        assert_eq!(opts.job_id.unwrap().as_str(), "j-1");
        assert_eq!(opts.delay.unwrap(), Duration::from_secs(5));
        assert_eq!(opts.group_id.as_deref(), Some("tenant-a"));
    }

    #[test]
    fn test_delivered_job_roundtrip() {
        let job = DeliveredJob {
            job_id: JobId::from_string("j-1"),
            queue: "default".to_string(),
            name: "order.placed".to_string(),
            payload: serde_json::json!({"order_id": "o-1"}),
            attempt: 1,
            enqueued_at: Utc::now(),
        };

        let json = serde_json::to_string(&job).unwrap();
        let restored: DeliveredJob = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.job_id, job.job_id);
        assert_eq!(restored.name, job.name);
    }
}
