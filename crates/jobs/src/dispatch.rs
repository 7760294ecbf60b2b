//! Producer-side dispatch of async-capable migrations.
//!
//! The handler never puts the migration itself on the queue: it derives the
//! migration's stable identifier, wraps it with the direction in a
//! [`MigrationJob`] and enqueues that. Whichever process eventually runs the job
//! resolves the migration again from its own registry.

use tracing::info;

use migq_core::{
    Direction, IdentifierResolver, Migration, MigrationError, MigrationHandler, MigrationId,
    VersionResolver, is_async,
};

use crate::config::DispatchConfig;
use crate::descriptor::MigrationJob;
use crate::queue::{JobQueue, MessageId, QueueError};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Defers async-capable migrations to a job queue.
///
/// Generic over the transport `Q` and the identifier resolver `I`
/// (`Version<digits>` type names by default).
#[derive(Debug)]
pub struct AsyncMigrationHandler<Q, I = VersionResolver> {
    queue: Q,
    resolver: I,
    config: DispatchConfig,
}

impl<Q: JobQueue> AsyncMigrationHandler<Q> {
    pub fn new(queue: Q, config: DispatchConfig) -> Self {
        Self::with_resolver(queue, VersionResolver, config)
    }
}

impl<Q: JobQueue, I: IdentifierResolver> AsyncMigrationHandler<Q, I> {
    pub fn with_resolver(queue: Q, resolver: I, config: DispatchConfig) -> Self {
        Self {
            queue,
            resolver,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// True iff the migration carries the async capability.
    pub fn can_dispatch(&self, migration: &dyn Migration) -> bool {
        is_async(migration)
    }

    /// Queue the migration's `up` side.
    pub fn up(&self, migration: &dyn Migration) -> Result<MessageId, DispatchError> {
        self.dispatch(migration, Direction::Up)
    }

    /// Queue the migration's `down` side.
    pub fn down(&self, migration: &dyn Migration) -> Result<MessageId, DispatchError> {
        self.dispatch(migration, Direction::Down)
    }

    /// Build the job descriptor for `migration` without enqueueing it.
    pub fn job_for(
        &self,
        migration: &dyn Migration,
        direction: Direction,
    ) -> Result<MigrationJob, MigrationError> {
        if !self.can_dispatch(migration) {
            // Non-async migrations need not follow the identifier scheme.
            let identifier = self
                .resolver
                .identifier_of(migration)
                .unwrap_or_else(|_| MigrationId::new(migration.type_name()));
            return Err(MigrationError::type_mismatch(identifier, migration.type_name()));
        }

        let identifier = self.resolver.identifier_of(migration)?;
        Ok(MigrationJob::from_parts(identifier, direction))
    }

    fn dispatch(
        &self,
        migration: &dyn Migration,
        direction: Direction,
    ) -> Result<MessageId, DispatchError> {
        debug_assert!(
            self.can_dispatch(migration),
            "{} is not an async migration",
            migration.type_name()
        );

        let job = self.job_for(migration, direction)?;
        let message_id = self.queue.enqueue(
            self.config.queue_name(),
            &job,
            self.config.queue_options(),
        )?;

        info!(
            queue = %self.config.queue_name(),
            message_id = %message_id,
            label = %job.label(),
            "async migration queued"
        );
        Ok(message_id)
    }
}

impl<Q: JobQueue, I: IdentifierResolver> MigrationHandler for AsyncMigrationHandler<Q, I> {
    type Error = DispatchError;

    fn can_execute(&self, migration: &dyn Migration) -> bool {
        self.can_dispatch(migration)
    }

    fn up(&self, migration: &dyn Migration) -> Result<(), Self::Error> {
        AsyncMigrationHandler::up(self, migration).map(|_| ())
    }

    fn down(&self, migration: &dyn Migration) -> Result<(), Self::Error> {
        AsyncMigrationHandler::down(self, migration).map(|_| ())
    }
}
