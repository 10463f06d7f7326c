//! In-memory tracked-job repository.
//!
//! Same contract and error semantics as the Postgres implementation, backed
//! by a mutex-guarded map. Intended for tests and embedded use; the mutex
//! serializes the conditional state check with the event append, giving the
//! same guarantee the Postgres transaction gives.

use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{
    CreateJobParams, RecordJobEventParams, TrackedJob, TrackedJobEvent, TrackedJobWithEvents,
};
use crate::traits::TrackedJobRepository;
use async_trait::async_trait;
use chrono::Utc;
use courier_core::{JobEventId, JobId, TenantId};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct StoredJob {
    job: TrackedJob,
    events: Vec<TrackedJobEvent>,
}

/// In-memory implementation of [`TrackedJobRepository`].
#[derive(Debug, Default)]
pub struct InMemoryTrackedJobRepository {
    jobs: Mutex<HashMap<(TenantId, JobId), StoredJob>>,
}

impl InMemoryTrackedJobRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// True when no jobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}

#[async_trait]
impl TrackedJobRepository for InMemoryTrackedJobRepository {
    async fn create_job(&self, params: CreateJobParams) -> RepositoryResult<TrackedJob> {
        let mut jobs = self.jobs.lock();
        let key = (params.tenant_id.clone(), params.job_id.clone());

        if jobs.contains_key(&key) {
            return Err(RepositoryError::DuplicateJobId {
                tenant_id: params.tenant_id,
                job_id: params.job_id,
            });
        }

        let now = Utc::now();
        let job = TrackedJob {
            tenant_id: params.tenant_id,
            queue_group_id: params.queue_group_id,
            queue_id: params.queue_id,
            job_id: params.job_id,
            state: params.state,
            data_type: params.data_type,
            data: params.data,
            result: None,
            log: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let mut events = Vec::new();
        if let Some(event) = params.initial_event {
            events.push(TrackedJobEvent {
                job_id: job.job_id.clone(),
                job_event_id: JobEventId::new(),
                event,
                state: job.state,
                state_prev: job.state,
                metadata: serde_json::Value::Object(serde_json::Map::new()),
                log: None,
                created_at: now,
            });
        }

        jobs.insert(
            key,
            StoredJob {
                job: job.clone(),
                events,
            },
        );
        Ok(job)
    }

    async fn find_job_by_id(
        &self,
        tenant_id: &TenantId,
        job_id: &JobId,
    ) -> RepositoryResult<TrackedJobWithEvents> {
        let jobs = self.jobs.lock();
        let stored = jobs
            .get(&(tenant_id.clone(), job_id.clone()))
            .ok_or_else(|| RepositoryError::JobNotFound {
                tenant_id: tenant_id.clone(),
                job_id: job_id.clone(),
            })?;

        Ok(TrackedJobWithEvents {
            job: stored.job.clone(),
            events: stored.events.clone(),
        })
    }

    async fn record_job_event(
        &self,
        params: RecordJobEventParams,
    ) -> RepositoryResult<TrackedJobEvent> {
        let mut jobs = self.jobs.lock();
        let key = (params.tenant_id.clone(), params.job_id.clone());
        let stored = jobs.get_mut(&key).ok_or_else(|| RepositoryError::JobNotFound {
            tenant_id: params.tenant_id.clone(),
            job_id: params.job_id.clone(),
        })?;

        if stored.job.state != params.state_prev {
            return Err(RepositoryError::StateConflict {
                job_id: params.job_id,
                expected: params.state_prev,
                actual: stored.job.state,
            });
        }

        let now = Utc::now();
        let event = TrackedJobEvent {
            job_id: params.job_id,
            job_event_id: JobEventId::new(),
            event: params.event,
            state: params.state,
            state_prev: params.state_prev,
            metadata: params.metadata,
            log: params.log,
            created_at: now,
        };

        stored.job.state = params.state;
        stored.job.updated_at = now;
        if let Some(log) = &event.log {
            stored.job.log.push(log.clone());
        }
        stored.events.push(event.clone());

        Ok(event)
    }
}
