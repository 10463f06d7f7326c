//! Tracked-job repository contract tests, driven through the in-memory
//! implementation.

use courier_core::{JobId, TenantId};
use courier_repository::{
    CreateJobParams, InMemoryTrackedJobRepository, JobState, RecordJobEventParams,
    RepositoryError, TrackedJobRepository,
};
use serde_json::json;
use std::sync::Arc;

fn repo() -> InMemoryTrackedJobRepository {
    InMemoryTrackedJobRepository::new()
}

fn create_params(job_id: &str) -> CreateJobParams {
    CreateJobParams::queued("t1", "orders", job_id, "order.placed", json!({"order_id": "o-1"}))
}

fn transition(
    job_id: &str,
    event: &str,
    prev: JobState,
    next: JobState,
) -> RecordJobEventParams {
    RecordJobEventParams::transition("t1", job_id, event, prev, next)
}

#[tokio::test]
async fn test_create_and_find_job() {
    let repo = repo();

    let job = repo.create_job(create_params("j1")).await.unwrap();
    assert_eq!(job.state, JobState::Queued);
    assert_eq!(job.job_id.as_str(), "j1");

    let found = repo
        .find_job_by_id(&TenantId::new("t1"), &JobId::from_string("j1"))
        .await
        .unwrap();
    assert_eq!(found.job, job);
    // The initial "created" event is recorded with prev == state.
    assert_eq!(found.events.len(), 1);
    assert_eq!(found.events[0].event, "created");
    assert_eq!(found.events[0].state, JobState::Queued);
    assert_eq!(found.events[0].state_prev, JobState::Queued);
}

#[tokio::test]
async fn test_create_without_initial_event() {
    let repo = repo();

    let mut params = create_params("j1");
    params.initial_event = None;
    repo.create_job(params).await.unwrap();

    let found = repo
        .find_job_by_id(&TenantId::new("t1"), &JobId::from_string("j1"))
        .await
        .unwrap();
    assert!(found.events.is_empty());
}

#[tokio::test]
async fn test_duplicate_job_id_rejected() {
    let repo = repo();

    repo.create_job(create_params("j1")).await.unwrap();
    let err = repo.create_job(create_params("j1")).await.unwrap_err();

    assert!(matches!(err, RepositoryError::DuplicateJobId { .. }));
}

#[tokio::test]
async fn test_same_job_id_allowed_across_tenants() {
    let repo = repo();

    repo.create_job(create_params("j1")).await.unwrap();

    let mut other_tenant = create_params("j1");
    other_tenant.tenant_id = TenantId::new("t2");
    repo.create_job(other_tenant).await.unwrap();

    assert_eq!(repo.len(), 2);
}

#[tokio::test]
async fn test_find_missing_job() {
    let repo = repo();
    let err = repo
        .find_job_by_id(&TenantId::new("t1"), &JobId::from_string("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::JobNotFound { .. }));
}

#[tokio::test]
async fn test_event_append_updates_state_and_history() {
    let repo = repo();
    repo.create_job(create_params("j1")).await.unwrap();

    let started = repo
        .record_job_event(transition("j1", "started", JobState::Queued, JobState::Running))
        .await
        .unwrap();
    assert_eq!(started.state, JobState::Running);
    assert_eq!(started.state_prev, JobState::Queued);

    repo.record_job_event(transition("j1", "finished", JobState::Running, JobState::Completed))
        .await
        .unwrap();

    let found = repo
        .find_job_by_id(&TenantId::new("t1"), &JobId::from_string("j1"))
        .await
        .unwrap();
    assert_eq!(found.job.state, JobState::Completed);

    let names: Vec<&str> = found.events.iter().map(|e| e.event.as_str()).collect();
    assert_eq!(names, vec!["created", "started", "finished"]);
}

#[tokio::test]
async fn test_stale_state_prev_rejected_and_state_unchanged() {
    let repo = repo();
    repo.create_job(create_params("j1")).await.unwrap();

    repo.record_job_event(transition("j1", "started", JobState::Queued, JobState::Running))
        .await
        .unwrap();

    // Stale append: caller still believes the job is queued.
    let err = repo
        .record_job_event(transition("j1", "finished", JobState::Queued, JobState::Completed))
        .await
        .unwrap_err();

    match err {
        RepositoryError::StateConflict {
            expected, actual, ..
        } => {
            assert_eq!(expected, JobState::Queued);
            assert_eq!(actual, JobState::Running);
        }
        other => panic!("Expected StateConflict, got {other:?}"),
    }

    let found = repo
        .find_job_by_id(&TenantId::new("t1"), &JobId::from_string("j1"))
        .await
        .unwrap();
    assert_eq!(found.job.state, JobState::Running);
    assert_eq!(found.events.len(), 2);
}

#[tokio::test]
async fn test_event_append_on_missing_job() {
    let repo = repo();
    let err = repo
        .record_job_event(transition("ghost", "started", JobState::Queued, JobState::Running))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::JobNotFound { .. }));
}

#[tokio::test]
async fn test_event_log_appends_to_job_log() {
    let repo = repo();
    repo.create_job(create_params("j1")).await.unwrap();

    repo.record_job_event(
        transition("j1", "started", JobState::Queued, JobState::Running)
            .with_log("picked up by worker-1"),
    )
    .await
    .unwrap();

    let found = repo
        .find_job_by_id(&TenantId::new("t1"), &JobId::from_string("j1"))
        .await
        .unwrap();
    assert_eq!(found.job.log, vec!["picked up by worker-1".to_string()]);
}

#[tokio::test]
async fn test_concurrent_appends_against_same_prev_state() {
    let repo = Arc::new(repo());
    repo.create_job(create_params("j1")).await.unwrap();

    let a = {
        let repo = repo.clone();
        tokio::spawn(async move {
            repo.record_job_event(transition(
                "j1",
                "started",
                JobState::Queued,
                JobState::Running,
            ))
            .await
        })
    };
    let b = {
        let repo = repo.clone();
        tokio::spawn(async move {
            repo.record_job_event(transition(
                "j1",
                "cancelled",
                JobState::Queued,
                JobState::Cancelled,
            ))
            .await
        })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one append may win");

    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(
        loser.unwrap_err(),
        RepositoryError::StateConflict { .. }
    ));
}
