//! `migq-jobs` — deferred execution of migrations through a job queue.
//!
//! ```text
//! caller → AsyncMigrationHandler → MigrationJob → JobQueue
//!                                                   ↓ (later, maybe elsewhere)
//!          JobWorker → ExecuteMigrationJob → MigrationRegistry → migration.up/down
//!                                                                  ↓ on failure
//!                                                               ErrorSink
//! ```
//!
//! Systemic errors (bad direction, unknown migration, wrong capability,
//! missing queue name) are surfaced. Business failures inside a migration are
//! recorded and contained: the queue always sees the job as processed.

pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod executor;
pub mod queue;
pub mod sink;
pub mod worker;

pub use config::{ConfigError, DispatchConfig, QueueOptions};
pub use descriptor::MigrationJob;
pub use dispatch::{AsyncMigrationHandler, DispatchError};
pub use executor::{ExecuteError, ExecuteMigrationJob, InitializedJob, JobOutcome, contain};
pub use queue::{InMemoryJobQueue, JobQueue, JobSource, MessageId, QueueError};
pub use sink::{ErrorSink, MemoryErrorSink, TracingErrorSink};
pub use worker::{JobWorker, Processed, WorkerConfig, WorkerHandle, WorkerStats};
