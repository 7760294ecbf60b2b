//! Migration lookup by identifier.

use std::collections::HashMap;

use crate::error::{MigrationError, MigrationResult};
use crate::id::MigrationId;
use crate::migration::Migration;
use crate::version::{IdentifierResolver, VersionResolver};

/// Resolves identifiers to migration instances.
///
/// The registry owns its migrations; callers only borrow one for the duration
/// of a lookup-and-invoke cycle.
pub trait MigrationRegistry: Send + Sync {
    fn resolve(&self, identifier: &MigrationId) -> MigrationResult<&dyn Migration>;
}

impl<R> MigrationRegistry for std::sync::Arc<R>
where
    R: MigrationRegistry + ?Sized,
{
    fn resolve(&self, identifier: &MigrationId) -> MigrationResult<&dyn Migration> {
        (**self).resolve(identifier)
    }
}

/// In-memory registry: migrations live in an arena, identifiers key into it.
pub struct InMemoryMigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
    index: HashMap<MigrationId, usize>,
}

impl InMemoryMigrationRegistry {
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a migration under an explicit identifier.
    ///
    /// Re-registering an identifier replaces the previous migration.
    pub fn insert(&mut self, identifier: impl Into<MigrationId>, migration: Box<dyn Migration>) {
        let identifier = identifier.into();
        match self.index.get(&identifier) {
            Some(&slot) => self.migrations[slot] = migration,
            None => {
                self.index.insert(identifier, self.migrations.len());
                self.migrations.push(migration);
            }
        }
    }

    /// Register a migration under the identifier derived by `resolver`.
    pub fn register_with<I>(
        &mut self,
        resolver: &I,
        migration: Box<dyn Migration>,
    ) -> MigrationResult<MigrationId>
    where
        I: IdentifierResolver + ?Sized,
    {
        let identifier = resolver.identifier_of(migration.as_ref())?;
        self.insert(identifier.clone(), migration);
        Ok(identifier)
    }

    /// Register a migration under its `Version<digits>` identifier.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> MigrationResult<MigrationId> {
        self.register_with(&VersionResolver, migration)
    }

    pub fn contains(&self, identifier: &MigrationId) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Registered identifiers in sorted order.
    pub fn identifiers(&self) -> Vec<MigrationId> {
        let mut ids: Vec<_> = self.index.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryMigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for InMemoryMigrationRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryMigrationRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}

impl MigrationRegistry for InMemoryMigrationRegistry {
    fn resolve(&self, identifier: &MigrationId) -> MigrationResult<&dyn Migration> {
        self.index
            .get(identifier)
            .map(|&slot| self.migrations[slot].as_ref())
            .ok_or_else(|| MigrationError::unknown(identifier.clone()))
    }
}
