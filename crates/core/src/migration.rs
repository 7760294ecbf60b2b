//! Migration contracts.

/// A unit of data/schema transformation with a forward and a backward side.
///
/// `up`/`down` return `anyhow::Error` for business failures: whatever went wrong
/// inside the migration itself. Those are distinct from [`MigrationError`], which
/// only describes systemic problems around a migration.
///
/// [`MigrationError`]: crate::MigrationError
pub trait Migration: Send + Sync {
    fn up(&self) -> anyhow::Result<()>;

    fn down(&self) -> anyhow::Result<()>;

    /// Fully-qualified name of the concrete implementing type.
    ///
    /// Identifier resolvers derive a migration's stable identifier from this.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capability query: `Some` iff this migration may run out of process.
    ///
    /// Async-capable migrations override this to return `Some(self)`.
    fn as_async(&self) -> Option<&dyn AsyncMigration> {
        None
    }
}

/// Marker capability for migrations that may be deferred to a job queue.
///
/// Implementors must also override [`Migration::as_async`]:
///
/// ```ignore
/// impl Migration for Version20210114162911 {
///     fn up(&self) -> anyhow::Result<()> { /* ... */ Ok(()) }
///     fn down(&self) -> anyhow::Result<()> { Ok(()) }
///     fn as_async(&self) -> Option<&dyn AsyncMigration> { Some(self) }
/// }
/// impl AsyncMigration for Version20210114162911 {}
/// ```
pub trait AsyncMigration: Migration {}

/// True iff the migration carries the async capability.
pub fn is_async(migration: &dyn Migration) -> bool {
    migration.as_async().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Migration for Plain {
        fn up(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn down(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Deferred;

    impl Migration for Deferred {
        fn up(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn down(&self) -> anyhow::Result<()> {
            anyhow::bail!("irreversible")
        }

        fn as_async(&self) -> Option<&dyn AsyncMigration> {
            Some(self)
        }
    }

    impl AsyncMigration for Deferred {}

    #[test]
    fn capability_is_opt_in() {
        assert!(!is_async(&Plain));
        assert!(is_async(&Deferred));
    }

    #[test]
    fn type_name_reports_the_concrete_type_through_a_trait_object() {
        let migration: &dyn Migration = &Deferred;
        assert!(migration.type_name().ends_with("::Deferred"));
    }

    #[test]
    fn async_view_dispatches_to_the_same_instance() {
        let migration: &dyn Migration = &Deferred;
        let deferred = migration.as_async().unwrap();
        assert!(deferred.up().is_ok());
        assert_eq!(deferred.down().unwrap_err().to_string(), "irreversible");
    }
}
