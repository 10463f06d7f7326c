//! # Courier Core
//!
//! Core types for the Courier messaging layer: typed IDs, the tenant-scoped
//! message envelope, message-type definitions with payload policies, and the
//! unified error type shared across the workspace.

pub mod definition;
pub mod envelope;
pub mod error;
pub mod id;

pub use definition::*;
pub use envelope::*;
pub use error::*;
pub use id::*;
