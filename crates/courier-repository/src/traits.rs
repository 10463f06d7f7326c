//! Repository trait definitions.

use crate::error::RepositoryResult;
use crate::model::{CreateJobParams, RecordJobEventParams, TrackedJob, TrackedJobEvent, TrackedJobWithEvents};
use async_trait::async_trait;
use courier_core::{JobId, TenantId};

/// Persistence contract for tracked jobs and their event history.
///
/// Jobs are keyed by `(tenant_id, job_id)`; events are append-only children
/// of a job. State transitions go through [`record_job_event`], which guards
/// against concurrent conflicting transitions with an optimistic-concurrency
/// check on the caller's assumed prior state.
///
/// [`record_job_event`]: TrackedJobRepository::record_job_event
#[async_trait]
pub trait TrackedJobRepository: Send + Sync {
    /// Persists a new job with its initial state, optionally recording an
    /// initial job-event.
    ///
    /// Fails with [`RepositoryError::DuplicateJobId`] when the `(tenant_id,
    /// job_id)` pair already exists.
    ///
    /// [`RepositoryError::DuplicateJobId`]: crate::error::RepositoryError::DuplicateJobId
    async fn create_job(&self, params: CreateJobParams) -> RepositoryResult<TrackedJob>;

    /// Returns the job with its event history ordered oldest-first.
    ///
    /// Fails with [`RepositoryError::JobNotFound`] when absent.
    ///
    /// [`RepositoryError::JobNotFound`]: crate::error::RepositoryError::JobNotFound
    async fn find_job_by_id(
        &self,
        tenant_id: &TenantId,
        job_id: &JobId,
    ) -> RepositoryResult<TrackedJobWithEvents>;

    /// Appends a state-transition event and updates the job's current state
    /// atomically with the event insert.
    ///
    /// The append is accepted only when `params.state_prev` equals the
    /// currently stored state; otherwise it fails with
    /// [`RepositoryError::StateConflict`] and the stored state is unchanged.
    /// Two concurrent appends against the same prior state cannot both
    /// succeed.
    ///
    /// [`RepositoryError::StateConflict`]: crate::error::RepositoryError::StateConflict
    async fn record_job_event(
        &self,
        params: RecordJobEventParams,
    ) -> RepositoryResult<TrackedJobEvent>;
}
