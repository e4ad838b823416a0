//! Storage layer
//!
//! SQLite access built around the reserved `_meta` table.
//!
//! ## Layout
//!
//! - `database` - the `Database` handle and its lifecycle
//! - `meta` - `_meta` table creation and schema version rows
//! - `init` - open-time version check and migration
//! - `values` - user key/value rows
//! - `error` - `StorageError` and the unique constraint classifier

pub mod database;
pub mod error;
mod init;
pub mod meta;
mod values;

pub use database::Database;
pub use error::{
    is_unique_constraint_violation, MigrationError, StorageError, StorageResult,
};
pub use meta::{META_TABLE, VERSION_KEY};
