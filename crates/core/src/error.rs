//! Migration error model.

use thiserror::Error;

use crate::id::MigrationId;

/// Result type used across the migration contracts.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Systemic migration error.
///
/// These are configuration or deployment failures (malformed descriptors,
/// registry drift, wrong capability). They are always surfaced to the caller
/// and never contained. Failures raised by a migration's own `up`/`down` logic
/// are `anyhow::Error` and live outside this enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// A direction string other than `up` or `down`.
    #[error("direction must be either \"up\" or \"down\", \"{0}\" given")]
    InvalidDirection(String),

    /// The registry has no migration for the identifier.
    #[error("unknown migration \"{0}\"")]
    UnknownMigration(MigrationId),

    /// The registry returned a migration without the async capability.
    #[error("the migration \"{type_name}\" ({identifier}) must be an async migration")]
    TypeMismatch {
        identifier: MigrationId,
        type_name: String,
    },

    /// No version could be derived from a migration type name.
    #[error("cannot derive a migration version from type \"{0}\"")]
    InvalidVersion(String),
}

impl MigrationError {
    pub fn invalid_direction(direction: impl Into<String>) -> Self {
        Self::InvalidDirection(direction.into())
    }

    pub fn unknown(identifier: MigrationId) -> Self {
        Self::UnknownMigration(identifier)
    }

    pub fn type_mismatch(identifier: MigrationId, type_name: impl Into<String>) -> Self {
        Self::TypeMismatch {
            identifier,
            type_name: type_name.into(),
        }
    }
}
