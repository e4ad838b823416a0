//! Key/value access to the `_meta` table
//!
//! User rows share the table with the schema version row. The version key
//! is rejected before any statement runs.

use rusqlite::{params, OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::storage::database::Database;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::meta::{is_reserved_key, VERSION_KEY};

impl Database {
    /// Store `value` under `key`, replacing any previous value
    ///
    /// Runs as delete-then-insert in its own transaction, so a failure
    /// leaves the previous value in place.
    pub fn set_value(&mut self, key: &str, value: &str) -> StorageResult<()> {
        reject_reserved(key)?;

        let tx = self
            .conn_mut("set_value")
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM _meta WHERE key = ?", params![key])?;
        tx.execute(
            "INSERT INTO _meta (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        tx.commit()?;

        debug!("Stored value for key {}", key);
        Ok(())
    }

    /// Get the value stored under `key`
    ///
    /// A missing key is reported as [`StorageError::NoResultForKey`].
    pub fn get_value(&self, key: &str) -> StorageResult<String> {
        reject_reserved(key)?;

        let value: Option<Option<String>> = self
            .conn("get_value")
            .query_row(
                "SELECT value FROM _meta WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            // A NULL value reads as empty, the row itself exists
            Some(value) => Ok(value.unwrap_or_default()),
            None => Err(StorageError::NoResultForKey {
                key: key.to_string(),
            }),
        }
    }

    /// Remove `key`; removing a missing key is not an error
    pub fn drop_value(&self, key: &str) -> StorageResult<()> {
        reject_reserved(key)?;

        let removed = self
            .conn("drop_value")
            .execute("DELETE FROM _meta WHERE key = ?", params![key])?;
        debug!("Dropped key {} ({} row(s))", key, removed);
        Ok(())
    }

    /// All user keys, sorted
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn("keys")
            .prepare("SELECT key FROM _meta WHERE key IS NOT NULL AND key != ? ORDER BY key")?;
        let keys = stmt
            .query_map(params![VERSION_KEY], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

fn reject_reserved(key: &str) -> StorageResult<()> {
    if is_reserved_key(key) {
        return Err(StorageError::ReservedKey);
    }
    Ok(())
}
