//! Postgres tracked-job repository implementation.

use crate::error::{is_unique_violation, RepositoryError, RepositoryResult};
use crate::model::{
    CreateJobParams, JobState, RecordJobEventParams, TrackedJob, TrackedJobEvent,
    TrackedJobWithEvents,
};
use crate::traits::TrackedJobRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::{JobEventId, JobId, TenantId};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

/// Postgres implementation of [`TrackedJobRepository`].
#[derive(Clone)]
pub struct PgTrackedJobRepository {
    pool: PgPool,
}

impl PgTrackedJobRepository {
    /// Creates a repository over a connected pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a tracked job.
#[derive(Debug, FromRow)]
struct TrackedJobRow {
    tenant_id: String,
    job_id: String,
    queue_group_id: Option<String>,
    queue_id: String,
    state: String,
    data_type: String,
    data: serde_json::Value,
    result: Option<serde_json::Value>,
    log: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TrackedJobRow> for TrackedJob {
    type Error = RepositoryError;

    fn try_from(row: TrackedJobRow) -> Result<Self, Self::Error> {
        Ok(TrackedJob {
            tenant_id: TenantId::new(row.tenant_id),
            queue_group_id: row.queue_group_id,
            queue_id: row.queue_id,
            job_id: JobId::from_string(row.job_id),
            state: parse_state(&row.state)?,
            data_type: row.data_type,
            data: row.data,
            result: row.result,
            log: row.log,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row representation of a job event.
#[derive(Debug, FromRow)]
struct TrackedJobEventRow {
    job_event_id: Uuid,
    job_id: String,
    event: String,
    state: String,
    state_prev: String,
    metadata: serde_json::Value,
    log: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TrackedJobEventRow> for TrackedJobEvent {
    type Error = RepositoryError;

    fn try_from(row: TrackedJobEventRow) -> Result<Self, Self::Error> {
        Ok(TrackedJobEvent {
            job_id: JobId::from_string(row.job_id),
            job_event_id: JobEventId::from_uuid(row.job_event_id),
            event: row.event,
            state: parse_state(&row.state)?,
            state_prev: parse_state(&row.state_prev)?,
            metadata: row.metadata,
            log: row.log,
            created_at: row.created_at,
        })
    }
}

fn parse_state(s: &str) -> RepositoryResult<JobState> {
    s.parse()
        .map_err(|e| RepositoryError::Database(format!("Invalid state in database: {e}")))
}

#[async_trait]
impl TrackedJobRepository for PgTrackedJobRepository {
    async fn create_job(&self, params: CreateJobParams) -> RepositoryResult<TrackedJob> {
        debug!(
            tenant_id = %params.tenant_id,
            job_id = %params.job_id,
            queue_id = %params.queue_id,
            "Creating tracked job"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
            r#"
            INSERT INTO tracked_jobs
                (tenant_id, job_id, queue_group_id, queue_id, state, data_type, data, log)
            VALUES ($1, $2, $3, $4, $5, $6, $7, '{}')
            RETURNING created_at, updated_at
            "#,
        )
        .bind(params.tenant_id.as_str())
        .bind(params.job_id.as_str())
        .bind(params.queue_group_id.as_deref())
        .bind(&params.queue_id)
        .bind(params.state.to_string())
        .bind(&params.data_type)
        .bind(&params.data)
        .fetch_one(&mut *tx)
        .await;

        let (created_at, updated_at) = match result {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => {
                return Err(RepositoryError::DuplicateJobId {
                    tenant_id: params.tenant_id,
                    job_id: params.job_id,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(event) = &params.initial_event {
            // An initial event records no transition: prev equals state.
            sqlx::query(
                r#"
                INSERT INTO tracked_job_events
                    (job_event_id, tenant_id, job_id, event, state, state_prev, metadata)
                VALUES ($1, $2, $3, $4, $5, $5, '{}'::jsonb)
                "#,
            )
            .bind(JobEventId::new().into_inner())
            .bind(params.tenant_id.as_str())
            .bind(params.job_id.as_str())
            .bind(event)
            .bind(params.state.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(TrackedJob {
            tenant_id: params.tenant_id,
            queue_group_id: params.queue_group_id,
            queue_id: params.queue_id,
            job_id: params.job_id,
            state: params.state,
            data_type: params.data_type,
            data: params.data,
            result: None,
            log: Vec::new(),
            created_at,
            updated_at,
        })
    }

    async fn find_job_by_id(
        &self,
        tenant_id: &TenantId,
        job_id: &JobId,
    ) -> RepositoryResult<TrackedJobWithEvents> {
        debug!(tenant_id = %tenant_id, job_id = %job_id, "Finding tracked job");

        let row = sqlx::query_as::<_, TrackedJobRow>(
            r#"
            SELECT tenant_id, job_id, queue_group_id, queue_id, state,
                   data_type, data, result, log, created_at, updated_at
            FROM tracked_jobs
            WHERE tenant_id = $1 AND job_id = $2
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(job_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::JobNotFound {
            tenant_id: tenant_id.clone(),
            job_id: job_id.clone(),
        })?;

        let event_rows = sqlx::query_as::<_, TrackedJobEventRow>(
            r#"
            SELECT job_event_id, job_id, event, state, state_prev,
                   metadata, log, created_at
            FROM tracked_job_events
            WHERE tenant_id = $1 AND job_id = $2
            ORDER BY created_at ASC, job_event_id ASC
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(job_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let events = event_rows
            .into_iter()
            .map(TrackedJobEvent::try_from)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(TrackedJobWithEvents {
            job: TrackedJob::try_from(row)?,
            events,
        })
    }

    async fn record_job_event(
        &self,
        params: RecordJobEventParams,
    ) -> RepositoryResult<TrackedJobEvent> {
        debug!(
            tenant_id = %params.tenant_id,
            job_id = %params.job_id,
            event = %params.event,
            state_prev = %params.state_prev,
            state = %params.state,
            "Recording job event"
        );

        let mut tx = self.pool.begin().await?;

        // Conditional update is the optimistic-concurrency guard: of two
        // concurrent appends against the same prior state, only one matches.
        let updated = sqlx::query(
            r#"
            UPDATE tracked_jobs
            SET state = $1, updated_at = now()
            WHERE tenant_id = $2 AND job_id = $3 AND state = $4
            "#,
        )
        .bind(params.state.to_string())
        .bind(params.tenant_id.as_str())
        .bind(params.job_id.as_str())
        .bind(params.state_prev.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let stored: Option<String> = sqlx::query_scalar(
                "SELECT state FROM tracked_jobs WHERE tenant_id = $1 AND job_id = $2",
            )
            .bind(params.tenant_id.as_str())
            .bind(params.job_id.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            return match stored {
                None => Err(RepositoryError::JobNotFound {
                    tenant_id: params.tenant_id,
                    job_id: params.job_id,
                }),
                Some(actual) => Err(RepositoryError::StateConflict {
                    job_id: params.job_id,
                    expected: params.state_prev,
                    actual: parse_state(&actual)?,
                }),
            };
        }

        let job_event_id = JobEventId::new();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO tracked_job_events
                (job_event_id, tenant_id, job_id, event, state, state_prev, metadata, log)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING created_at
            "#,
        )
        .bind(job_event_id.into_inner())
        .bind(params.tenant_id.as_str())
        .bind(params.job_id.as_str())
        .bind(&params.event)
        .bind(params.state.to_string())
        .bind(params.state_prev.to_string())
        .bind(&params.metadata)
        .bind(params.log.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(TrackedJobEvent {
            job_id: params.job_id,
            job_event_id,
            event: params.event,
            state: params.state,
            state_prev: params.state_prev,
            metadata: params.metadata,
            log: params.log,
            created_at,
        })
    }
}

impl std::fmt::Debug for PgTrackedJobRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTrackedJobRepository").finish_non_exhaustive()
    }
}
