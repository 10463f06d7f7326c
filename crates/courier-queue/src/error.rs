//! Queue-layer error types.

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors raised by the gateway, scheduler, and worker host.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Message type is not on the gateway's allow-list.
    #[error("Message type {message_type} is not allowed on gateway {gateway}")]
    AllowListViolation {
        gateway: String,
        message_type: String,
    },

    /// Payload failed boundary validation against its definition.
    #[error("Payload rejected: {0}")]
    PayloadRejected(String),

    /// The queue engine refused or failed an enqueue.
    #[error("Enqueue failed: {0}")]
    Enqueue(String),

    /// The queue engine refused or failed a task submission.
    #[error("Scheduling failed: {0}")]
    Scheduling(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Worker error.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueueError {
    /// True when the error is a validation failure raised before anything
    /// reached the queue engine.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::AllowListViolation { .. } | Self::PayloadRejected(_) | Self::Configuration(_)
        )
    }
}

impl From<courier_core::CourierError> for QueueError {
    fn from(err: courier_core::CourierError) -> Self {
        match err {
            courier_core::CourierError::Validation(msg) => Self::PayloadRejected(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
