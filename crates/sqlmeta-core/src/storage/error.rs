//! Storage error handling
//!
//! Typed errors for meta table, key/value and initialization operations,
//! plus the classifier that maps driver failures to semantic categories.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use rusqlite::ffi;
use thiserror::Error;

/// Error type a migration callback may return.
///
/// Anything implementing `std::error::Error` converts into it with `?`,
/// including `rusqlite::Error` and `anyhow::Error`.
pub type MigrationError = Box<dyn StdError + Send + Sync + 'static>;

/// Message SQLite uses when a UNIQUE index rejects a row
const UNIQUE_CONSTRAINT_MESSAGE: &str = "UNIQUE constraint failed";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create the directory holding the database file
    #[error("Failed to create database directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The meta table could neither be found nor created
    #[error("Could not find or create the _meta table")]
    MetaTableUnavailable,

    /// Attempted to read or write a key reserved for internal use
    #[error("Tried to access a reserved key")]
    ReservedKey,

    /// No row exists for the requested key
    #[error("No results for key '{key}'")]
    NoResultForKey { key: String },

    /// The stored schema version is not a valid unsigned integer
    #[error("Stored schema version '{value}' is not a valid version number")]
    InvalidVersion { value: String },

    /// The migration callback failed; the database was rolled back
    #[error("Migration from version {from} to {to} failed: {source}")]
    Migration {
        from: u32,
        to: u32,
        #[source]
        source: MigrationError,
    },
}

impl StorageError {
    /// Whether this error was returned because a key has no stored value
    pub fn is_no_result_for_key(&self) -> bool {
        matches!(self, StorageError::NoResultForKey { .. })
    }

    /// Whether this error is an attempt to touch the reserved version key
    pub fn is_reserved_key(&self) -> bool {
        matches!(self, StorageError::ReservedKey)
    }

    /// Whether this error was caused by a UNIQUE constraint violation
    pub fn is_unique_constraint_violation(&self) -> bool {
        is_unique_constraint_violation(self)
    }
}

/// Check whether an error was caused by a uniqueness constraint
///
/// Walks the source chain. SQLite failures are matched on their extended
/// result code; anything else falls back to the driver's message text.
pub fn is_unique_constraint_violation(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(sqlite_err) = err.downcast_ref::<rusqlite::Error>() {
            if is_sqlite_unique_failure(sqlite_err) {
                return true;
            }
        }
        if err.to_string().contains(UNIQUE_CONSTRAINT_MESSAGE) {
            return true;
        }
        current = err.source();
    }
    false
}

/// Misspelled name kept for callers that still use it
#[deprecated(note = "use `is_unique_constraint_violation` instead")]
pub fn is_unique_contraint_error(err: &(dyn StdError + 'static)) -> bool {
    is_unique_constraint_violation(err)
}

fn is_sqlite_unique_failure(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => matches!(
            failure.extended_code,
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        ),
        _ => false,
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
