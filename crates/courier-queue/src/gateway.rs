//! Allow-listed queued gateway.
//!
//! A gateway binds one destination queue to the set of message types it
//! forwards. Publishing checks the allow-list and the matching definition's
//! payload policy before the envelope reaches the engine; a rejected message
//! never enqueues anything. The gateway performs no retries of its own.

use crate::client::{EnqueueOptions, QueueClient};
use crate::error::{QueueError, QueueResult};
use crate::metrics;
use courier_core::{JobId, Message, MessageDefinition};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Static configuration naming a queue and the message types it accepts.
#[derive(Debug, Clone)]
pub struct QueueDefinition {
    /// Destination queue name.
    pub queue: String,

    /// Message-type definitions this queue accepts.
    pub allows: Vec<MessageDefinition>,
}

impl QueueDefinition {
    /// Creates a definition for the named queue with an empty allow-list.
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            allows: Vec::new(),
        }
    }

    /// Adds a message-type definition to the allow-list.
    #[must_use]
    pub fn allow(mut self, definition: MessageDefinition) -> Self {
        self.allows.push(definition);
        self
    }

    /// Finds the definition matching a message type, by exact match.
    #[must_use]
    pub fn definition_for(&self, message_type: &str) -> Option<&MessageDefinition> {
        self.allows.iter().find(|d| d.message_type == message_type)
    }
}

/// Gateway that forwards allow-listed messages to one destination queue.
pub struct QueuedGateway {
    name: String,
    definition: QueueDefinition,
    client: Arc<dyn QueueClient>,
}

impl QueuedGateway {
    /// Creates a gateway over an injected queue-client adapter.
    pub fn new(
        name: impl Into<String>,
        definition: QueueDefinition,
        client: Arc<dyn QueueClient>,
    ) -> Self {
        Self {
            name: name.into(),
            definition,
            client,
        }
    }

    /// Gateway name, used in logs and rejection errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The gateway's queue definition.
    #[must_use]
    pub fn definition(&self) -> &QueueDefinition {
        &self.definition
    }

    /// Returns true iff the message type is on this gateway's allow-list.
    #[must_use]
    pub fn is_allowed<T>(&self, message: &Message<T>) -> bool {
        self.definition.definition_for(&message.message_type).is_some()
    }

    /// Validates and forwards a message to the destination queue.
    ///
    /// Fails with [`QueueError::AllowListViolation`] when the message type is
    /// not allow-listed and with [`QueueError::PayloadRejected`] when the
    /// payload violates the matching definition's policy; in both cases
    /// nothing is enqueued. Retry policy is the engine's responsibility.
    pub async fn publish<T: Serialize>(&self, message: &Message<T>) -> QueueResult<JobId> {
        message.validate()?;

        let Some(definition) = self.definition.definition_for(&message.message_type) else {
            warn!(
                gateway = %self.name,
                message_type = %message.message_type,
                "Rejected message not on allow-list"
            );
            metrics::message_rejected(&self.name);
            return Err(QueueError::AllowListViolation {
                gateway: self.name.clone(),
                message_type: message.message_type.clone(),
            });
        };

        let payload = serde_json::to_value(&message.data)?;
        definition.validate_payload(&payload)?;

        let envelope = serde_json::json!({
            "id": message.id,
            "source": message.source,
            "specversion": message.specversion,
            "type": message.message_type,
            "tenantId": message.tenant_id,
            "metadata": message.metadata,
            "data": payload,
        });

        let job_id = self
            .client
            .enqueue(
                &self.definition.queue,
                &message.message_type,
                envelope,
                EnqueueOptions::new().group_id(message.tenant_id.to_string()),
            )
            .await?;

        debug!(
            gateway = %self.name,
            queue = %self.definition.queue,
            message_type = %message.message_type,
            job_id = %job_id,
            "Published message"
        );
        metrics::message_published(&self.definition.queue);

        Ok(job_id)
    }
}

impl std::fmt::Debug for QueuedGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedGateway")
            .field("name", &self.name)
            .field("queue", &self.definition.queue)
            .field("allows", &self.definition.allows.len())
            .finish_non_exhaustive()
    }
}
