//! Queue layer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the queue layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierQueueConfig {
    /// Gateway/publish configuration.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Worker host configuration.
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Publish-side configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue used when a message names none.
    #[serde(default = "default_queue_name")]
    pub default_queue: String,

    /// Publish timeout in seconds.
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_queue: default_queue_name(),
            publish_timeout_secs: default_publish_timeout(),
        }
    }
}

impl QueueConfig {
    /// Publish timeout as a [`Duration`].
    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

fn default_queue_name() -> String {
    "default".to_string()
}

fn default_publish_timeout() -> u64 {
    30
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the startup scheduling pass runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Worker host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Queues to poll, in priority order.
    #[serde(default = "default_queues")]
    pub queues: Vec<String>,

    /// Polling interval when idle, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queues: default_queues(),
            poll_interval_ms: default_poll_interval(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl WorkerConfig {
    /// Idle polling interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Shutdown timeout as a [`Duration`].
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_queues() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_poll_interval() -> u64 {
    500
}

fn default_shutdown_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CourierQueueConfig::default();
        assert_eq!(config.queue.default_queue, "default");
        assert_eq!(config.worker.queues, vec!["default".to_string()]);
        assert!(config.scheduler.enabled);
        assert_eq!(config.worker.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: CourierQueueConfig =
            serde_json::from_str(r#"{"worker": {"poll_interval_ms": 50}}"#).unwrap();
        assert_eq!(config.worker.poll_interval_ms, 50);
        assert_eq!(config.worker.queues, vec!["default".to_string()]);
        assert_eq!(config.queue.publish_timeout_secs, 30);
    }
}
