//! Tenant-scoped message envelope.
//!
//! Every domain message travels inside a [`Message`] envelope carrying the
//! identity, type discriminator, tenant scope, and open metadata mapping.
//! The payload type parameter defaults to [`serde_json::Value`], the fully
//! open form; typed payloads convert to and from the open form at the
//! process boundary.

use crate::error::{CourierError, CourierResult};
use crate::id::{MessageId, TenantId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Envelope protocol version. Fixed for all messages produced by this layer.
pub const SPEC_VERSION: &str = "1.0";

fn default_spec_version() -> String {
    SPEC_VERSION.to_string()
}

/// Immutable message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<T = serde_json::Value> {
    /// Unique message ID.
    pub id: MessageId,

    /// Origin of the message (logical producer name or URI).
    pub source: String,

    /// Envelope protocol version.
    #[serde(default = "default_spec_version")]
    pub specversion: String,

    /// Message type discriminator. Gateways match this against their
    /// allow-list before dispatch.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Tenant the message is scoped to.
    #[serde(rename = "tenantId")]
    pub tenant_id: TenantId,

    /// Open metadata mapping.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Message payload.
    pub data: T,
}

impl<T> Message<T> {
    /// Creates a new envelope with a fresh ID and the current protocol version.
    pub fn new(
        message_type: impl Into<String>,
        source: impl Into<String>,
        tenant_id: impl Into<TenantId>,
        data: T,
    ) -> Self {
        Self {
            id: MessageId::new(),
            source: source.into(),
            specversion: SPEC_VERSION.to_string(),
            message_type: message_type.into(),
            tenant_id: tenant_id.into(),
            metadata: HashMap::new(),
            data,
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Checks the envelope carries the protocol version this layer speaks.
    pub fn validate(&self) -> CourierResult<()> {
        if self.specversion != SPEC_VERSION {
            return Err(CourierError::validation(format!(
                "Unsupported specversion: {} (expected {})",
                self.specversion, SPEC_VERSION
            )));
        }
        Ok(())
    }
}

impl<T: Serialize> Message<T> {
    /// Converts a typed envelope into the open form.
    pub fn into_open(self) -> CourierResult<Message<serde_json::Value>> {
        Ok(Message {
            id: self.id,
            source: self.source,
            specversion: self.specversion,
            message_type: self.message_type,
            tenant_id: self.tenant_id,
            metadata: self.metadata,
            data: serde_json::to_value(self.data)?,
        })
    }
}

impl Message<serde_json::Value> {
    /// Attempts to interpret the open payload as a typed one.
    pub fn try_typed<T: DeserializeOwned>(self) -> CourierResult<Message<T>> {
        Ok(Message {
            id: self.id,
            source: self.source,
            specversion: self.specversion,
            message_type: self.message_type,
            tenant_id: self.tenant_id,
            metadata: self.metadata,
            data: serde_json::from_value(self.data)?,
        })
    }
}
