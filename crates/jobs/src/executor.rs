//! Consumer-side execution of a queued migration job.
//!
//! ```text
//! ExecuteMigrationJob::new        direction validated   -> InvalidDirection
//!   (or ::from_payload)           payload shape checked -> Decode
//!   ↓ initialize(registry)        target resolved       -> UnknownMigration
//!                                 capability checked    -> TypeMismatch
//! InitializedJob
//!   ↓ execute(sink)               up/down invoked; failures recorded, never raised
//! JobOutcome (always a success for the queue)
//! ```
//!
//! Errors before `InitializedJob` exists are systemic and propagate so the
//! queue's own failure handling sees them. Once initialized, a job always
//! completes: a failing migration may not be safe to re-run from a partial
//! state, so its failure goes to the [`ErrorSink`] and the queue is told the job
//! succeeded.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::Deserialize as _;
use serde_json::Value as JsonValue;
use tracing::{debug, info_span, warn};

use migq_core::{
    AsyncMigration, Direction, MigrationError, MigrationId, MigrationRegistry, MigrationResult,
};

use crate::descriptor::{MigrationJob, WirePayload};
use crate::sink::ErrorSink;

/// Why a dequeued payload could not become an executable job.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The payload is not exactly `{"identifier", "direction"}`.
    #[error("malformed migration job payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Result of executing an initialized job.
///
/// Both variants mean "processed" from the queue's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The migration ran without failing.
    Completed,
    /// The migration failed; the failure was recorded and contained.
    FailureContained,
}

impl JobOutcome {
    /// Always true: contained failures never surface as job failures.
    pub fn is_success(&self) -> bool {
        true
    }

    pub fn failure_contained(&self) -> bool {
        matches!(self, JobOutcome::FailureContained)
    }
}

/// Run `operation`, recording any failure (error or panic) in `sink`.
///
/// This is the single containment boundary for business failures: whatever
/// `operation` does, the returned outcome is a success.
pub fn contain<S, F>(sink: &S, operation: F) -> JobOutcome
where
    S: ErrorSink + ?Sized,
    F: FnOnce() -> anyhow::Result<()>,
{
    let result = panic::catch_unwind(AssertUnwindSafe(operation))
        .unwrap_or_else(|payload| Err(panic_failure(payload.as_ref())));

    match result {
        Ok(()) => JobOutcome::Completed,
        Err(failure) => {
            warn!(error = %failure, "migration failed; failure recorded, job completed");
            sink.record(failure);
            JobOutcome::FailureContained
        }
    }
}

fn panic_failure(payload: &(dyn Any + Send)) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("migration panicked: {message}")
}

/// A dequeued job whose direction has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteMigrationJob {
    job: MigrationJob,
}

impl ExecuteMigrationJob {
    /// Validate the direction independently of how the job got here.
    pub fn new(identifier: impl Into<MigrationId>, direction: &str) -> MigrationResult<Self> {
        MigrationJob::new(identifier, direction).map(Self::from_job)
    }

    pub fn from_job(job: MigrationJob) -> Self {
        Self { job }
    }

    /// Decode a queue payload (`{"identifier", "direction"}`).
    ///
    /// A well-formed payload with a bad direction fails with
    /// [`MigrationError::InvalidDirection`], not as a decode error.
    pub fn from_payload(payload: &JsonValue) -> Result<Self, ExecuteError> {
        let wire = WirePayload::deserialize(payload).map_err(ExecuteError::Decode)?;
        Ok(Self::from_job(MigrationJob::try_from(wire)?))
    }

    pub fn job(&self) -> &MigrationJob {
        &self.job
    }

    /// Built fresh on every call.
    pub fn label(&self) -> String {
        self.job.label()
    }

    /// Resolve the target through `registry` and check its async capability.
    pub fn initialize<R>(self, registry: &R) -> MigrationResult<InitializedJob<'_>>
    where
        R: MigrationRegistry + ?Sized,
    {
        let migration = registry.resolve(self.job.identifier())?;
        let migration = migration.as_async().ok_or_else(|| {
            MigrationError::type_mismatch(self.job.identifier().clone(), migration.type_name())
        })?;

        Ok(InitializedJob {
            job: self.job,
            migration,
        })
    }
}

/// A job bound to its resolved, async-capable migration.
///
/// Borrows the migration from the registry for one execution only.
pub struct InitializedJob<'r> {
    job: MigrationJob,
    migration: &'r dyn AsyncMigration,
}

impl InitializedJob<'_> {
    pub fn job(&self) -> &MigrationJob {
        &self.job
    }

    pub fn label(&self) -> String {
        self.job.label()
    }

    /// Run the requested direction; never fails.
    pub fn execute<S>(&self, sink: &S) -> JobOutcome
    where
        S: ErrorSink + ?Sized,
    {
        let span = info_span!("migration_job", label = %self.label());
        let _enter = span.enter();

        let migration = self.migration;
        let outcome = match self.job.direction() {
            Direction::Up => contain(sink, || migration.up()),
            Direction::Down => contain(sink, || migration.down()),
        };

        debug!(outcome = ?outcome, "migration job finished");
        outcome
    }
}

impl core::fmt::Debug for InitializedJob<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InitializedJob")
            .field("job", &self.job)
            .field("migration", &self.migration.type_name())
            .finish()
    }
}
