//! Courier Queue - allow-listed gateway, task scheduler, and worker host.
//!
//! Thin orchestration over an external queue engine:
//! - [`QueuedGateway`] validates a message type against a per-queue
//!   allow-list and the payload against its definition, then forwards the
//!   envelope to the engine.
//! - [`TaskScheduler`] holds an ordered sequence of task registrations and
//!   submits them to the engine at startup, tolerating per-task failures.
//! - [`WorkerHost`] dispatches delivered jobs to typed handlers and reports
//!   outcomes back to the engine.
//!
//! The engine itself (retry, backoff, stalled-job detection) stays behind the
//! [`QueueClient`] and [`QueueConsumer`] seams; this crate ships no engine.
//!
//! ```text
//! Producer ──Message──▶ QueuedGateway ──allow-list──▶ QueueClient ─▶ engine
//!                                                                      │
//! TaskScheduler ──At/Every──▶ QueueClient ─────────────────────────────┤
//!                                                                      ▼
//!                         WorkerHost ◀──DeliveredJob── QueueConsumer ◀─┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod scheduler;
pub mod worker;

pub use client::{DeliveredJob, EnqueueOptions, QueueClient, QueueConsumer};
pub use config::{CourierQueueConfig, QueueConfig, SchedulerConfig, WorkerConfig};
pub use error::{QueueError, QueueResult};
pub use gateway::{QueueDefinition, QueuedGateway};
pub use metrics::register_metrics;
pub use scheduler::{Schedule, ScheduleReport, TaskDefinition, TaskFailure, TaskScheduler};
pub use worker::{JobContext, JobHandler, WorkerHost};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::client::{QueueClient, QueueConsumer};
    pub use crate::gateway::{QueueDefinition, QueuedGateway};
    pub use crate::scheduler::{Schedule, TaskDefinition, TaskScheduler};
    pub use crate::worker::{JobContext, JobHandler, WorkerHost};
    pub use crate::{QueueError, QueueResult};
}
