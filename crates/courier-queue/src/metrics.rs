//! Prometheus metrics for the queue layer.

use metrics::{counter, describe_counter};

/// Metric names for the queue layer.
pub mod names {
    /// Total messages published through a gateway.
    pub const MESSAGES_PUBLISHED_TOTAL: &str = "courier_messages_published_total";
    /// Total messages rejected by the allow-list.
    pub const MESSAGES_REJECTED_TOTAL: &str = "courier_messages_rejected_total";
    /// Total scheduled tasks submitted.
    pub const TASKS_SUBMITTED_TOTAL: &str = "courier_tasks_submitted_total";
    /// Total scheduled-task submission failures.
    pub const TASK_FAILURES_TOTAL: &str = "courier_task_failures_total";
    /// Total jobs processed by worker hosts.
    pub const JOBS_PROCESSED_TOTAL: &str = "courier_jobs_processed_total";
    /// Total jobs failed in worker hosts.
    pub const JOBS_FAILED_TOTAL: &str = "courier_jobs_failed_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::MESSAGES_PUBLISHED_TOTAL,
        "Total number of messages published through gateways"
    );
    describe_counter!(
        names::MESSAGES_REJECTED_TOTAL,
        "Total number of messages rejected by gateway allow-lists"
    );
    describe_counter!(
        names::TASKS_SUBMITTED_TOTAL,
        "Total number of scheduled tasks submitted to the queue engine"
    );
    describe_counter!(
        names::TASK_FAILURES_TOTAL,
        "Total number of scheduled-task submission failures"
    );
    describe_counter!(
        names::JOBS_PROCESSED_TOTAL,
        "Total number of jobs processed by worker hosts"
    );
    describe_counter!(
        names::JOBS_FAILED_TOTAL,
        "Total number of jobs failed in worker hosts"
    );
}

/// Records a published message.
pub fn message_published(queue: &str) {
    counter!(names::MESSAGES_PUBLISHED_TOTAL, "queue" => queue.to_string()).increment(1);
}

/// Records an allow-list rejection.
pub fn message_rejected(gateway: &str) {
    counter!(names::MESSAGES_REJECTED_TOTAL, "gateway" => gateway.to_string()).increment(1);
}

/// Records a submitted scheduled task.
pub fn task_submitted(queue: &str) {
    counter!(names::TASKS_SUBMITTED_TOTAL, "queue" => queue.to_string()).increment(1);
}

/// Records a scheduled-task submission failure.
pub fn task_failed(queue: &str) {
    counter!(names::TASK_FAILURES_TOTAL, "queue" => queue.to_string()).increment(1);
}

/// Records a processed job.
pub fn job_processed(job_name: &str) {
    counter!(names::JOBS_PROCESSED_TOTAL, "job" => job_name.to_string()).increment(1);
}

/// Records a failed job.
pub fn job_failed(job_name: &str) {
    counter!(names::JOBS_FAILED_TOTAL, "job" => job_name.to_string()).increment(1);
}
