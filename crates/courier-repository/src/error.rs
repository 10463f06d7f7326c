//! Repository error types.

use crate::model::JobState;
use courier_core::{JobId, TenantId};
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised by the tracked-job repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A job with this ID already exists for the tenant.
    #[error("Job {job_id} already exists for tenant {tenant_id}")]
    DuplicateJobId { tenant_id: TenantId, job_id: JobId },

    /// No job with this ID exists for the tenant.
    #[error("Job {job_id} not found for tenant {tenant_id}")]
    JobNotFound { tenant_id: TenantId, job_id: JobId },

    /// Optimistic-concurrency guard: the caller's assumed prior state does
    /// not match the stored state. The caller may retry with fresh state.
    #[error("State conflict for job {job_id}: expected {expected}, stored state is {actual}")]
    StateConflict {
        job_id: JobId,
        expected: JobState,
        actual: JobState,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    /// True when the caller may retry the operation after re-reading state.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::StateConflict { .. } | Self::Database(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// True when the error is a Postgres unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_conflict_display() {
        let err = RepositoryError::StateConflict {
            job_id: JobId::from_string("j1"),
            expected: JobState::Queued,
            actual: JobState::Running,
        };
        let msg = err.to_string();
        assert!(msg.contains("j1"));
        assert!(msg.contains("queued"));
        assert!(msg.contains("running"));
    }

    #[test]
    fn test_duplicate_job_display() {
        let err = RepositoryError::DuplicateJobId {
            tenant_id: TenantId::new("t1"),
            job_id: JobId::from_string("j1"),
        };
        assert!(err.to_string().contains("t1"));
        assert!(err.to_string().contains("j1"));
    }

    #[test]
    fn test_retriable_classification() {
        let conflict = RepositoryError::StateConflict {
            job_id: JobId::from_string("j1"),
            expected: JobState::Queued,
            actual: JobState::Running,
        };
        assert!(conflict.is_retriable());
        assert!(RepositoryError::Database("down".into()).is_retriable());

        let dup = RepositoryError::DuplicateJobId {
            tenant_id: TenantId::new("t1"),
            job_id: JobId::from_string("j1"),
        };
        assert!(!dup.is_retriable());
    }
}
