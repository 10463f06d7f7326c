//! Startup task scheduler.
//!
//! The scheduler holds an ordered, in-memory sequence of task registrations
//! and submits each one to the queue engine exactly once per [`schedule`]
//! call. It is an explicitly constructed object so independent instances can
//! coexist; nothing here is process-global. Registration is a single-writer
//! startup phase: register every task before calling `schedule()`, never
//! concurrently.
//!
//! [`schedule`]: TaskScheduler::schedule

use crate::client::QueueClient;
use crate::error::{QueueError, QueueResult};
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Definition of a task to be submitted to the queue engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task name, unique per engine but not enforced here.
    pub name: String,

    /// Queue the task runs on.
    pub queue: String,

    /// Task payload.
    pub payload: serde_json::Value,
}

impl TaskDefinition {
    /// Creates a task definition.
    pub fn new(
        name: impl Into<String>,
        queue: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            queue: queue.into(),
            payload,
        }
    }
}

/// When a registered task fires.
///
/// The variant tag is the discriminant; there is no field-sniffing, so an
/// interval schedule accidentally carrying a fire time cannot be misrouted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Run once at a fixed time.
    At { run_at: DateTime<Utc> },
    /// Run on a recurring interval.
    Every { every: Duration },
}

/// One task that failed to submit during a [`TaskScheduler::schedule`] pass.
#[derive(Debug)]
pub struct TaskFailure {
    /// Name of the failed task.
    pub task: String,

    /// The submission error.
    pub error: QueueError,
}

/// Outcome of one scheduling pass.
#[derive(Debug, Default)]
pub struct ScheduleReport {
    /// Number of tasks submitted successfully.
    pub submitted: usize,

    /// Tasks whose submission failed, in registration order.
    pub failures: Vec<TaskFailure>,
}

impl ScheduleReport {
    /// True when every registered task was submitted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// In-memory task scheduler submitting registrations to the queue engine.
pub struct TaskScheduler {
    client: Arc<dyn QueueClient>,
    tasks: Vec<(TaskDefinition, Schedule)>,
}

impl TaskScheduler {
    /// Creates a scheduler over an injected queue-client adapter.
    pub fn new(client: Arc<dyn QueueClient>) -> Self {
        Self {
            client,
            tasks: Vec::new(),
        }
    }

    /// Appends a task registration.
    ///
    /// Registrations keep their order and duplicates are permitted; both
    /// copies submit. Fails fast with [`QueueError::Configuration`] on an
    /// invalid schedule instead of deferring the problem to submission time.
    pub fn register_task(&mut self, task: TaskDefinition, schedule: Schedule) -> QueueResult<()> {
        if let Schedule::Every { every } = schedule {
            if every.is_zero() {
                return Err(QueueError::Configuration(format!(
                    "Task {} has a zero-length interval",
                    task.name
                )));
            }
        }

        info!(task = %task.name, queue = %task.queue, ?schedule, "Registered task");
        self.tasks.push((task, schedule));
        Ok(())
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no tasks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Submits every registered task to the engine, in registration order.
    ///
    /// A submission failure is logged and recorded in the report; it does not
    /// stop later tasks. Each registration submits at most once per call.
    pub async fn schedule(&self) -> ScheduleReport {
        let mut report = ScheduleReport::default();

        for (task, schedule) in &self.tasks {
            let result = match schedule {
                Schedule::At { run_at } => self.client.schedule_at(task, *run_at).await,
                Schedule::Every { every } => self.client.schedule_every(task, *every).await,
            };

            match result {
                Ok(()) => {
                    debug!(task = %task.name, ?schedule, "Submitted scheduled task");
                    metrics::task_submitted(&task.queue);
                    report.submitted += 1;
                }
                Err(e) => {
                    error!(task = %task.name, error = %e, "Failed to submit scheduled task");
                    metrics::task_failed(&task.queue);
                    report.failures.push(TaskFailure {
                        task: task.name.clone(),
                        error: e,
                    });
                }
            }
        }

        info!(
            submitted = report.submitted,
            failed = report.failures.len(),
            "Scheduling pass finished"
        );
        report
    }
}

impl std::fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EnqueueOptions;
    use async_trait::async_trait;
    use courier_core::JobId;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum Submission {
        At(String, DateTime<Utc>),
        Every(String, Duration),
    }

    #[derive(Default)]
    struct MockQueueClient {
        submissions: Mutex<Vec<Submission>>,
        fail_task: Option<String>,
    }

    impl MockQueueClient {
        fn failing_on(task: &str) -> Self {
            Self {
                submissions: Mutex::new(Vec::new()),
                fail_task: Some(task.to_string()),
            }
        }

        fn check_fail(&self, task: &TaskDefinition) -> QueueResult<()> {
            if self.fail_task.as_deref() == Some(task.name.as_str()) {
                return Err(QueueError::Scheduling(format!(
                    "engine rejected {}",
                    task.name
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl QueueClient for MockQueueClient {
        async fn enqueue(
            &self,
            _queue: &str,
            _job_name: &str,
            _payload: serde_json::Value,
            _opts: EnqueueOptions,
        ) -> QueueResult<JobId> {
            Ok(JobId::new())
        }

        async fn schedule_at(
            &self,
            task: &TaskDefinition,
            run_at: DateTime<Utc>,
        ) -> QueueResult<()> {
            self.check_fail(task)?;
            self.submissions
                .lock()
                .push(Submission::At(task.name.clone(), run_at));
            Ok(())
        }

        async fn schedule_every(&self, task: &TaskDefinition, every: Duration) -> QueueResult<()> {
            self.check_fail(task)?;
            self.submissions
                .lock()
                .push(Submission::Every(task.name.clone(), every));
            Ok(())
        }
    }

    fn task(name: &str) -> TaskDefinition {
        TaskDefinition::new(name, "maintenance", json!({}))
    }

    #[tokio::test]
    async fn test_at_and_every_dispatch_in_registration_order() {
        let client = Arc::new(MockQueueClient::default());
        let mut scheduler = TaskScheduler::new(client.clone());

        let t1 = Utc::now();
        let hour = Duration::from_secs(3600);
        scheduler
            .register_task(task("a"), Schedule::At { run_at: t1 })
            .unwrap();
        scheduler
            .register_task(task("b"), Schedule::Every { every: hour })
            .unwrap();

        let report = scheduler.schedule().await;
        assert_eq!(report.submitted, 2);
        assert!(report.is_complete());

        let submissions = client.submissions.lock();
        assert_eq!(
            *submissions,
            vec![
                Submission::At("a".to_string(), t1),
                Submission::Every("b".to_string(), hour),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_tasks() {
        let client = Arc::new(MockQueueClient::failing_on("bad"));
        let mut scheduler = TaskScheduler::new(client.clone());

        scheduler
            .register_task(task("bad"), Schedule::At { run_at: Utc::now() })
            .unwrap();
        scheduler
            .register_task(
                task("good"),
                Schedule::Every {
                    every: Duration::from_secs(60),
                },
            )
            .unwrap();

        let report = scheduler.schedule().await;
        assert_eq!(report.submitted, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task, "bad");

        let submissions = client.submissions.lock();
        assert_eq!(submissions.len(), 1);
        assert!(matches!(submissions[0], Submission::Every(ref n, _) if n == "good"));
    }

    #[tokio::test]
    async fn test_duplicate_registrations_both_submit() {
        let client = Arc::new(MockQueueClient::default());
        let mut scheduler = TaskScheduler::new(client.clone());

        let every = Duration::from_secs(300);
        scheduler
            .register_task(task("dup"), Schedule::Every { every })
            .unwrap();
        scheduler
            .register_task(task("dup"), Schedule::Every { every })
            .unwrap();

        let report = scheduler.schedule().await;
        assert_eq!(report.submitted, 2);
        assert_eq!(client.submissions.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_each_task_submits_at_most_once_per_pass() {
        let client = Arc::new(MockQueueClient::default());
        let mut scheduler = TaskScheduler::new(client.clone());

        scheduler
            .register_task(task("once"), Schedule::At { run_at: Utc::now() })
            .unwrap();

        scheduler.schedule().await;
        assert_eq!(client.submissions.lock().len(), 1);

        // A second pass submits again; within one pass there is one submission.
        scheduler.schedule().await;
        assert_eq!(client.submissions.lock().len(), 2);
    }

    #[test]
    fn test_zero_interval_rejected_at_registration() {
        let client = Arc::new(MockQueueClient::default());
        let mut scheduler = TaskScheduler::new(client);

        let err = scheduler
            .register_task(
                task("broken"),
                Schedule::Every {
                    every: Duration::ZERO,
                },
            )
            .unwrap_err();
        assert!(matches!(err, QueueError::Configuration(_)));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_schedule_serde_carries_explicit_tag() {
        let at = Schedule::At { run_at: Utc::now() };
        let value = serde_json::to_value(at).unwrap();
        assert_eq!(value["kind"], json!("at"));

        let every = Schedule::Every {
            every: Duration::from_secs(60),
        };
        let value = serde_json::to_value(every).unwrap();
        assert_eq!(value["kind"], json!("every"));
    }
}
