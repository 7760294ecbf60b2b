//! Identifier derivation from migration types.

use crate::error::{MigrationError, MigrationResult};
use crate::id::MigrationId;
use crate::migration::Migration;

/// Derives the stable identifier of a migration from its concrete type.
///
/// Implementations must be deterministic: the same concrete type always yields
/// the same identifier, in every process sharing the same build.
pub trait IdentifierResolver: Send + Sync {
    fn identifier_of(&self, migration: &dyn Migration) -> MigrationResult<MigrationId>;
}

/// Resolves identifiers from `Version<digits>` type names.
///
/// `my_app::migrations::Version20210114162911` resolves to `20210114162911`.
#[derive(Debug, Default, Copy, Clone)]
pub struct VersionResolver;

const VERSION_PREFIX: &str = "Version";

impl VersionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Extract the version digits from a (possibly fully-qualified) type name.
    pub fn extract_version(&self, type_name: &str) -> MigrationResult<MigrationId> {
        // Generic arguments may contain `::` themselves; cut them before splitting.
        let base = type_name.split('<').next().unwrap_or(type_name);
        let short = base.rsplit("::").next().unwrap_or(base);

        let version = short
            .strip_prefix(VERSION_PREFIX)
            .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| MigrationError::InvalidVersion(type_name.to_string()))?;

        Ok(MigrationId::new(version))
    }
}

impl IdentifierResolver for VersionResolver {
    fn identifier_of(&self, migration: &dyn Migration) -> MigrationResult<MigrationId> {
        self.extract_version(migration.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Version20210114162911;

    impl Migration for Version20210114162911 {
        fn up(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn down(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn extracts_digits_from_fully_qualified_names() {
        let resolver = VersionResolver::new();
        assert_eq!(
            resolver
                .extract_version("app::migrations::Version20210114162911")
                .unwrap(),
            MigrationId::new("20210114162911")
        );
        assert_eq!(
            resolver.extract_version("Version1").unwrap(),
            MigrationId::new("1")
        );
    }

    #[test]
    fn ignores_generic_arguments() {
        let resolver = VersionResolver::new();
        assert_eq!(
            resolver
                .extract_version("app::Version20200101000000<alloc::string::String>")
                .unwrap(),
            MigrationId::new("20200101000000")
        );
    }

    #[test]
    fn rejects_names_without_a_version() {
        let resolver = VersionResolver::new();
        for name in ["app::AddUsers", "app::Version", "app::Version12a", "app::version123"] {
            assert!(
                matches!(resolver.extract_version(name), Err(MigrationError::InvalidVersion(n)) if n == name),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn resolves_from_the_migration_type() {
        let resolver = VersionResolver::new();
        let id = resolver.identifier_of(&Version20210114162911).unwrap();
        assert_eq!(id.as_str(), "20210114162911");
    }
}
