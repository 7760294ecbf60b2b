//! `migq-core` — migration contracts shared by producers and consumers.
//!
//! Pure contracts only (no IO, no queueing): what a migration is, which
//! migrations may be deferred, how they are identified and looked up.

pub mod direction;
pub mod error;
pub mod handler;
pub mod id;
pub mod migration;
pub mod registry;
pub mod version;

pub use direction::Direction;
pub use error::{MigrationError, MigrationResult};
pub use handler::{InlineMigrationHandler, MigrationHandler, select_handler};
pub use id::MigrationId;
pub use migration::{AsyncMigration, Migration, is_async};
pub use registry::{InMemoryMigrationRegistry, MigrationRegistry};
pub use version::{IdentifierResolver, VersionResolver};
