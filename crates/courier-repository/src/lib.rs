//! # Courier Repository
//!
//! Persistence for tracked jobs: a job row per unit of queued work, mutated
//! only through append-only state-transition events with an
//! optimistic-concurrency guard on the prior state.
//!
//! [`PgTrackedJobRepository`] is the Postgres implementation;
//! [`InMemoryTrackedJobRepository`] offers the same contract for tests and
//! embedded use.

pub mod error;
pub mod memory;
pub mod model;
pub mod pool;
pub mod postgres;
pub mod traits;

pub use error::{RepositoryError, RepositoryResult};
pub use memory::InMemoryTrackedJobRepository;
pub use model::{
    CreateJobParams, JobState, RecordJobEventParams, TrackedJob, TrackedJobEvent,
    TrackedJobWithEvents, UnknownJobState,
};
pub use pool::{connect_pool, health_check, run_migrations, DatabaseConfig};
pub use postgres::PgTrackedJobRepository;
pub use traits::TrackedJobRepository;
