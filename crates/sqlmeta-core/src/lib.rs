//! sqlmeta Core Library
//!
//! A thin layer over an SQLite database file that keeps a schema version
//! in a reserved `_meta` table, calls a migration callback when the stored
//! version differs from the expected one, and offers key/value access to
//! the same table.
//!
//! # Quick Start
//!
//! ```no_run
//! use sqlmeta_core::Database;
//!
//! let mut db = Database::open("app.db", 2, |tx, from, to| {
//!     if from < 1 {
//!         tx.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!     }
//!     if from < 2 && to >= 2 {
//!         tx.execute_batch("ALTER TABLE users ADD COLUMN email TEXT")?;
//!     }
//!     Ok(())
//! })?;
//!
//! db.set_value("theme", "dark")?;
//! assert_eq!(db.get_value("theme")?, "dark");
//! db.close()?;
//! # Ok::<(), sqlmeta_core::StorageError>(())
//! ```
//!
//! # Modules
//!
//! - `storage`: database handle, meta table, migrations, key/value rows
//! - `config`: configuration file and environment overrides
//! - `datetime`: SQL datetime formatting helpers

pub mod config;
pub mod datetime;
pub mod storage;

pub use config::Config;
pub use storage::{
    is_unique_constraint_violation, Database, MigrationError, StorageError, StorageResult,
    META_TABLE, VERSION_KEY,
};

pub use rusqlite::{params, Transaction};
