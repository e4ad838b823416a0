//! Open-time schema version check
//!
//! Runs in a single immediate transaction:
//!
//! - **Fresh file**: create `_meta`, seed version 0, migrate `0 -> expected`
//! - **Existing file without `_meta`**: create it, then treat as version 0
//! - **Existing file, same version**: nothing to do
//! - **Existing file, other version**: migrate `current -> expected`
//!
//! The new version is written only after the migration callback returns
//! successfully. Any error drops the transaction, which rolls back every
//! statement issued here including the callback's own.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{info, warn};

use crate::storage::error::{MigrationError, StorageError, StorageResult};
use crate::storage::meta::MetaTable;

/// Run the version check and migration, committing only on full success
pub(crate) fn initialize<F>(
    conn: &mut Connection,
    meta: &mut MetaTable,
    file_existed: bool,
    expected: u32,
    migrate: F,
) -> StorageResult<()>
where
    F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let result = if file_existed {
        init_existing(&tx, meta, expected, migrate)
    } else {
        init_fresh(&tx, meta, expected, migrate)
    };

    match result {
        Ok(()) => {
            tx.commit()?;
            Ok(())
        }
        Err(e) => {
            warn!("Initialization failed, rolling back: {}", e);
            // Dropping the transaction rolls it back
            drop(tx);
            Err(e)
        }
    }
}

fn init_fresh<F>(
    tx: &Transaction<'_>,
    meta: &mut MetaTable,
    expected: u32,
    migrate: F,
) -> StorageResult<()>
where
    F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
{
    meta.ensure(tx)?;
    let current = meta.read_version(tx)?;
    run_migration(tx, meta, current, expected, migrate)
}

fn init_existing<F>(
    tx: &Transaction<'_>,
    meta: &mut MetaTable,
    expected: u32,
    migrate: F,
) -> StorageResult<()>
where
    F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
{
    if !meta.exists(tx)? {
        meta.ensure(tx)?;
        if !meta.exists(tx)? {
            return Err(StorageError::MetaTableUnavailable);
        }
    }

    let current = meta.read_version(tx)?;
    if current == expected {
        return Ok(());
    }

    run_migration(tx, meta, current, expected, migrate)
}

fn run_migration<F>(
    tx: &Transaction<'_>,
    meta: &mut MetaTable,
    from: u32,
    to: u32,
    migrate: F,
) -> StorageResult<()>
where
    F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
{
    info!("Migrating schema from version {} to {}", from, to);
    migrate(tx, from, to).map_err(|source| StorageError::Migration { from, to, source })?;
    meta.write_version(tx, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::meta::peek_version;

    fn no_op(_: &Transaction<'_>, _: u32, _: u32) -> Result<(), MigrationError> {
        Ok(())
    }

    #[test]
    fn test_fresh_migrates_from_zero() {
        let mut conn = Connection::open_in_memory().unwrap();
        let mut meta = MetaTable::new();
        let mut seen = Vec::new();

        initialize(&mut conn, &mut meta, false, 3, |_, from, to| {
            seen.push((from, to));
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![(0, 3)]);
        assert_eq!(peek_version(&conn).unwrap(), 3);
    }

    #[test]
    fn test_existing_without_meta_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY)")
            .unwrap();
        let mut meta = MetaTable::new();
        let mut seen = Vec::new();

        initialize(&mut conn, &mut meta, true, 2, |_, from, to| {
            seen.push((from, to));
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![(0, 2)]);
        assert_eq!(peek_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_existing_matching_version_skips_callback() {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&mut conn, &mut MetaTable::new(), false, 4, no_op).unwrap();

        let mut called = false;
        initialize(&mut conn, &mut MetaTable::new(), true, 4, |_, _, _| {
            called = true;
            Ok(())
        })
        .unwrap();

        assert!(!called);
    }

    #[test]
    fn test_failed_migration_rolls_back_everything() {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&mut conn, &mut MetaTable::new(), false, 1, no_op).unwrap();

        let err = initialize(&mut conn, &mut MetaTable::new(), true, 2, |tx, _, _| {
            tx.execute_batch("CREATE TABLE half_done (id INTEGER)")?;
            Err("boom".into())
        })
        .unwrap_err();

        assert!(matches!(err, StorageError::Migration { from: 1, to: 2, .. }));
        assert_eq!(peek_version(&conn).unwrap(), 1);

        let leftover: bool = conn
            .prepare("SELECT 1 FROM sqlite_master WHERE name = 'half_done'")
            .unwrap()
            .exists([])
            .unwrap();
        assert!(!leftover);
    }
}
