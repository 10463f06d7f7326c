//! Message-type definitions and payload policies.
//!
//! A [`MessageDefinition`] names a message type a gateway may forward and
//! declares how its payload treats fields outside the declared shape. The
//! policy is an explicit tag, checked at the gateway boundary, so a payload
//! that smuggles unknown fields into a closed shape is rejected up front
//! instead of being silently accepted.

use crate::error::{CourierError, CourierResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a message type treats payload fields outside its declared shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadPolicy {
    /// Payload must be exactly the declared shape; unknown fields rejected.
    Strict,
    /// Declared shape plus arbitrary additional fields.
    Extensible,
    /// No declared shape; any payload accepted.
    Open,
}

/// Declared top-level field set for a message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadSchema {
    fields: BTreeSet<String>,
}

impl PayloadSchema {
    /// Builds a schema from the declared top-level field names.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the field is part of the declared shape.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Declared field names, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

/// Definition of one message type a gateway accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDefinition {
    /// Message type discriminator this definition matches.
    pub message_type: String,

    /// Unknown-field handling for the payload.
    pub payload_policy: PayloadPolicy,

    /// Declared payload shape. `None` only for [`PayloadPolicy::Open`].
    pub schema: Option<PayloadSchema>,
}

impl MessageDefinition {
    /// Defines a message type whose payload must match the declared fields
    /// exactly.
    pub fn strict<I, S>(message_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message_type: message_type.into(),
            payload_policy: PayloadPolicy::Strict,
            schema: Some(PayloadSchema::new(fields)),
        }
    }

    /// Defines a message type whose payload carries the declared fields and
    /// may carry more.
    pub fn extensible<I, S>(message_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message_type: message_type.into(),
            payload_policy: PayloadPolicy::Extensible,
            schema: Some(PayloadSchema::new(fields)),
        }
    }

    /// Defines a message type with no declared payload shape.
    pub fn open(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            payload_policy: PayloadPolicy::Open,
            schema: None,
        }
    }

    /// Validates a payload against this definition's policy.
    ///
    /// `Strict` requires every declared field and rejects undeclared ones;
    /// `Extensible` requires declared fields and ignores extras; `Open`
    /// accepts anything, including non-object payloads.
    pub fn validate_payload(&self, payload: &serde_json::Value) -> CourierResult<()> {
        if self.payload_policy == PayloadPolicy::Open {
            return Ok(());
        }

        let object = payload.as_object().ok_or_else(|| {
            CourierError::validation(format!(
                "Payload for {} must be an object",
                self.message_type
            ))
        })?;

        let schema = self.schema.as_ref().ok_or_else(|| {
            CourierError::validation(format!(
                "Message type {} declares a closed shape but no schema",
                self.message_type
            ))
        })?;

        for field in schema.fields() {
            if !object.contains_key(field) {
                return Err(CourierError::validation(format!(
                    "Payload for {} is missing declared field {}",
                    self.message_type, field
                )));
            }
        }

        if self.payload_policy == PayloadPolicy::Strict {
            for key in object.keys() {
                if !schema.contains(key) {
                    return Err(CourierError::validation(format!(
                        "Payload for {} carries unknown field {}",
                        self.message_type, key
                    )));
                }
            }
        }

        Ok(())
    }
}
