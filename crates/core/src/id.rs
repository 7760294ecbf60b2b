//! Stable migration identifiers.

use serde::{Deserialize, Serialize};

/// Identifier of a migration across process boundaries.
///
/// Opaque on purpose: any string is accepted here. Whether it names an existing
/// migration is decided by a [`MigrationRegistry`](crate::MigrationRegistry) at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for MigrationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MigrationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MigrationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<MigrationId> for String {
    fn from(value: MigrationId) -> Self {
        value.0
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
