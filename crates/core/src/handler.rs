//! Migration handler abstraction.
//!
//! A migration runner holds an ordered list of handlers and hands each
//! migration to the first one that accepts it. Handlers differ in *where* the
//! migration runs: inline in the calling thread, or deferred to a job queue.

use crate::migration::Migration;

/// Executes (or arranges the execution of) a migration in one direction.
pub trait MigrationHandler {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Pure predicate: whether this handler accepts the migration.
    fn can_execute(&self, migration: &dyn Migration) -> bool;

    fn up(&self, migration: &dyn Migration) -> Result<(), Self::Error>;

    fn down(&self, migration: &dyn Migration) -> Result<(), Self::Error>;
}

/// Runs any migration synchronously in the calling thread.
///
/// Business failures propagate to the caller unchanged.
#[derive(Debug, Default, Copy, Clone)]
pub struct InlineMigrationHandler;

impl MigrationHandler for InlineMigrationHandler {
    type Error = anyhow::Error;

    fn can_execute(&self, _migration: &dyn Migration) -> bool {
        true
    }

    fn up(&self, migration: &dyn Migration) -> Result<(), Self::Error> {
        migration.up()
    }

    fn down(&self, migration: &dyn Migration) -> Result<(), Self::Error> {
        migration.down()
    }
}

/// First handler (in priority order) that accepts the migration.
pub fn select_handler<'h, H>(handlers: &'h [H], migration: &dyn Migration) -> Option<&'h H>
where
    H: MigrationHandler,
{
    handlers.iter().find(|h| h.can_execute(migration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        ups: AtomicUsize,
        downs: AtomicUsize,
    }

    impl Migration for Counting {
        fn up(&self) -> anyhow::Result<()> {
            self.ups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn down(&self) -> anyhow::Result<()> {
            self.downs.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("cannot go down")
        }
    }

    struct Never;

    impl MigrationHandler for Never {
        type Error = anyhow::Error;

        fn can_execute(&self, _migration: &dyn Migration) -> bool {
            false
        }

        fn up(&self, _migration: &dyn Migration) -> Result<(), Self::Error> {
            unreachable!()
        }

        fn down(&self, _migration: &dyn Migration) -> Result<(), Self::Error> {
            unreachable!()
        }
    }

    #[test]
    fn inline_handler_runs_in_place_and_propagates_failures() {
        let migration = Counting::default();
        let handler = InlineMigrationHandler;

        assert!(handler.can_execute(&migration));
        handler.up(&migration).unwrap();
        let err = handler.down(&migration).unwrap_err();

        assert_eq!(migration.ups.load(Ordering::SeqCst), 1);
        assert_eq!(migration.downs.load(Ordering::SeqCst), 1);
        assert_eq!(err.to_string(), "cannot go down");
    }

    #[test]
    fn select_handler_picks_first_accepting_handler() {
        let migration = Counting::default();
        let inline = [InlineMigrationHandler, InlineMigrationHandler];
        assert!(select_handler(&inline, &migration).is_some());

        let none: [Never; 2] = [Never, Never];
        assert!(select_handler(&none, &migration).is_none());
    }
}
