//! Reserved `_meta` table
//!
//! Holds the schema version under a fixed key plus free-form key/value rows.
//! Every function here runs on a connection or transaction supplied by the
//! caller and never commits.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::storage::error::{StorageError, StorageResult};

/// Name of the reserved table
pub const META_TABLE: &str = "_meta";

/// Key of the row holding the schema version
///
/// Part of the on-disk format; changing it orphans existing version rows.
pub const VERSION_KEY: &str = "2af72f100c356273d46284f6fd1dfc08";

const CREATE_META_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS _meta (key TEXT UNIQUE, value TEXT)";

const META_TABLE_EXISTS_SQL: &str =
    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_meta'";

/// Keys that the public key/value API refuses to touch
pub fn is_reserved_key(key: &str) -> bool {
    key == VERSION_KEY
}

/// Tracks whether the meta table is known to exist for this session
#[derive(Debug, Default)]
pub struct MetaTable {
    created: bool,
}

impl MetaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the table has been created or found during this session
    pub fn is_known(&self) -> bool {
        self.created
    }

    /// Create the meta table if it is absent
    pub fn ensure(&mut self, conn: &Connection) -> StorageResult<()> {
        if self.created {
            return Ok(());
        }

        conn.execute(CREATE_META_TABLE_SQL, [])?;
        debug!("Ensured {} table", META_TABLE);
        self.created = true;
        Ok(())
    }

    /// Check the schema for the meta table
    ///
    /// Always asks SQLite; the in-memory flag is only updated on a hit.
    pub fn exists(&mut self, conn: &Connection) -> StorageResult<bool> {
        let found = conn
            .prepare(META_TABLE_EXISTS_SQL)
            .and_then(|mut stmt| stmt.exists([]))?;
        if found {
            self.created = true;
        }
        Ok(found)
    }

    /// Read the stored schema version
    ///
    /// A missing version row is seeded with "0" and reported as version 0.
    pub fn read_version(&mut self, conn: &Connection) -> StorageResult<u32> {
        self.ensure(conn)?;

        match select_version(conn)? {
            Some(value) => {
                let version = parse_version(&value)?;
                debug!(version, "Read schema version");
                Ok(version)
            }
            None => {
                // A NULL value is replaced too, the row keeps its UNIQUE key
                conn.execute("DELETE FROM _meta WHERE key = ?", params![VERSION_KEY])?;
                conn.execute(
                    "INSERT INTO _meta (key, value) VALUES (?, '0')",
                    params![VERSION_KEY],
                )?;
                debug!("Seeded missing schema version with 0");
                Ok(0)
            }
        }
    }

    /// Overwrite the stored schema version
    pub fn write_version(&mut self, conn: &Connection, version: u32) -> StorageResult<()> {
        conn.execute(
            "UPDATE _meta SET value = ? WHERE key = ?",
            params![version.to_string(), VERSION_KEY],
        )?;
        debug!(version, "Wrote schema version");
        Ok(())
    }
}

/// Read the stored version without seeding or creating anything
///
/// Returns 0 when the table or the version row is missing.
pub fn peek_version(conn: &Connection) -> StorageResult<u32> {
    let found = conn
        .prepare(META_TABLE_EXISTS_SQL)
        .and_then(|mut stmt| stmt.exists([]))?;
    if !found {
        return Ok(0);
    }

    match select_version(conn)? {
        Some(value) => parse_version(&value),
        None => Ok(0),
    }
}

/// Raw version text; `None` for both a missing row and a NULL value
fn select_version(conn: &Connection) -> StorageResult<Option<String>> {
    let stored: Option<Option<String>> = conn
        .query_row(
            "SELECT value FROM _meta WHERE key = ?",
            params![VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;
    Ok(stored.flatten())
}

fn parse_version(value: &str) -> StorageResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| StorageError::InvalidVersion {
            value: value.to_string(),
        })
}
