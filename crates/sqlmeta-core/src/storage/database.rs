//! Database handle
//!
//! A `Database` owns exactly one SQLite connection. It is created by one of
//! the `open*` constructors, which run the schema version check before
//! handing the handle out, and is closed explicitly with [`Database::close`].
//!
//! Calling any method on a closed handle is a programming error and panics.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Params, Transaction, TransactionBehavior};
use tracing::info;

use crate::config::Config;
use crate::storage::error::{MigrationError, StorageError, StorageResult};
use crate::storage::init::initialize;
use crate::storage::meta::{peek_version, MetaTable};

/// Options applied when opening a connection
#[derive(Debug, Clone, Copy)]
struct OpenOptions {
    create_dirs: bool,
    foreign_keys: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_dirs: true,
            foreign_keys: true,
        }
    }
}

impl From<&Config> for OpenOptions {
    fn from(config: &Config) -> Self {
        Self {
            create_dirs: config.create_dirs,
            foreign_keys: config.foreign_keys,
        }
    }
}

/// Handle to an initialized SQLite database
///
/// Not `Sync`: wrap it in a mutex to share it between threads.
#[derive(Debug)]
pub struct Database {
    /// `None` once the handle has been closed
    conn: Option<Connection>,
    /// Path to the database file (None for in-memory)
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the database at `path` and bring it to `version`
    ///
    /// When the stored version differs from `version` (a new file counts as
    /// version 0), `migrate` is called once with the open transaction, the
    /// stored version and the expected version. Nothing is committed unless
    /// every step, including `migrate`, succeeds.
    ///
    /// A failed first open of a new file still leaves an empty file behind.
    /// It holds no `_meta` table, so the next open treats it as an existing
    /// file without one and migrates from version 0 again.
    ///
    /// # Panics
    ///
    /// Panics if `version` is 0.
    pub fn open<P, F>(path: P, version: u32, migrate: F) -> StorageResult<Self>
    where
        P: AsRef<Path>,
        F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
    {
        Self::open_with_options(path.as_ref(), OpenOptions::default(), version, migrate)
    }

    /// Open the database named by `config.database_path`
    ///
    /// # Panics
    ///
    /// Panics if `version` is 0.
    pub fn open_with_config<F>(config: &Config, version: u32, migrate: F) -> StorageResult<Self>
    where
        F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
    {
        Self::open_with_options(&config.database_path, config.into(), version, migrate)
    }

    /// Open a private in-memory database (for testing)
    ///
    /// Always takes the fresh-file path, so `migrate` runs from version 0.
    ///
    /// # Panics
    ///
    /// Panics if `version` is 0.
    pub fn open_in_memory<F>(version: u32, migrate: F) -> StorageResult<Self>
    where
        F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
    {
        assert_valid_version(version);

        let conn = Connection::open_in_memory()?;
        configure(&conn, OpenOptions::default())?;
        Self::initialized(conn, None, false, version, migrate)
    }

    fn open_with_options<F>(
        path: &Path,
        options: OpenOptions,
        version: u32,
        migrate: F,
    ) -> StorageResult<Self>
    where
        F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
    {
        assert_valid_version(version);

        // Must be checked before SQLite creates the file
        let existed = path.exists();

        if options.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| {
                    StorageError::CreateDirectory {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let conn = Connection::open(path)?;
        configure(&conn, options)?;
        Self::initialized(conn, Some(path.to_path_buf()), existed, version, migrate)
    }

    fn initialized<F>(
        mut conn: Connection,
        path: Option<PathBuf>,
        existed: bool,
        version: u32,
        migrate: F,
    ) -> StorageResult<Self>
    where
        F: FnOnce(&Transaction<'_>, u32, u32) -> Result<(), MigrationError>,
    {
        initialize(&mut conn, &mut MetaTable::new(), existed, version, migrate)?;

        info!(
            "Opened database {} at schema version {}",
            path.as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string()),
            version
        );

        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    /// Close the connection
    ///
    /// If SQLite refuses to close, the handle stays open and the error is
    /// returned.
    ///
    /// # Panics
    ///
    /// Panics if the handle is already closed.
    pub fn close(&mut self) -> StorageResult<()> {
        let conn = self
            .conn
            .take()
            .unwrap_or_else(|| panic!("can't close a closed database"));

        match conn.close() {
            Ok(()) => {
                info!("Closed database");
                Ok(())
            }
            Err((conn, e)) => {
                self.conn = Some(conn);
                Err(e.into())
            }
        }
    }

    /// Whether [`Database::close`] has succeeded on this handle
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Database file path (None for in-memory)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Start an immediate (write-locking) transaction for custom statements
    ///
    /// The transaction rolls back on drop unless committed.
    pub fn begin(&mut self) -> StorageResult<Transaction<'_>> {
        let tx = self
            .conn_mut("begin")
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(tx)
    }

    /// Run a single statement outside of any explicit transaction
    ///
    /// Returns the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> StorageResult<usize> {
        Ok(self.conn("execute").execute(sql, params)?)
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        self.conn("connection")
    }

    /// Currently stored schema version
    pub fn schema_version(&self) -> StorageResult<u32> {
        peek_version(self.conn("schema_version"))
    }

    pub(crate) fn conn(&self, op: &str) -> &Connection {
        match self.conn.as_ref() {
            Some(conn) => conn,
            None => panic!("can't call {} on a closed database", op),
        }
    }

    pub(crate) fn conn_mut(&mut self, op: &str) -> &mut Connection {
        match self.conn.as_mut() {
            Some(conn) => conn,
            None => panic!("can't call {} on a closed database", op),
        }
    }
}

fn assert_valid_version(version: u32) {
    assert!(version != 0, "can't initialize a database with version 0");
}

fn configure(conn: &Connection, options: OpenOptions) -> StorageResult<()> {
    if options.foreign_keys {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_op(_: &Transaction<'_>, _: u32, _: u32) -> Result<(), MigrationError> {
        Ok(())
    }

    #[test]
    fn test_open_creates_file_and_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("app.db");

        let db = Database::open(&path, 1, no_op).unwrap();

        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
        assert_eq!(db.schema_version().unwrap(), 1);
    }

    #[test]
    fn test_open_with_config() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("configured.db"),
            ..Config::default()
        };

        let db = Database::open_with_config(&config, 5, no_op).unwrap();
        assert_eq!(db.schema_version().unwrap(), 5);
        assert!(config.database_path.exists());
    }

    #[test]
    fn test_missing_parent_without_create_dirs() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("missing").join("app.db"),
            create_dirs: false,
            ..Config::default()
        };

        let err = Database::open_with_config(&config, 1, no_op).unwrap_err();
        assert!(matches!(err, StorageError::Database(_)));
    }

    #[test]
    fn test_open_in_memory() {
        let mut calls = 0;
        let db = Database::open_in_memory(2, |_, from, to| {
            calls += 1;
            assert_eq!((from, to), (0, 2));
            Ok(())
        })
        .unwrap();

        assert_eq!(calls, 1);
        assert!(db.path().is_none());
        assert_eq!(db.schema_version().unwrap(), 2);
    }

    #[test]
    #[should_panic(expected = "version 0")]
    fn test_version_zero_panics() {
        let _ = Database::open_in_memory(0, no_op);
    }

    #[test]
    fn test_close() {
        let mut db = Database::open_in_memory(1, no_op).unwrap();
        assert!(!db.is_closed());

        db.close().unwrap();
        assert!(db.is_closed());
    }

    #[test]
    fn test_reopen_after_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.db");

        let mut db = Database::open(&path, 3, no_op).unwrap();
        db.close().unwrap();

        let mut called = false;
        let db = Database::open(&path, 3, |_, _, _| {
            called = true;
            Ok(())
        })
        .unwrap();
        assert!(!called);
        assert_eq!(db.schema_version().unwrap(), 3);
    }

    #[test]
    #[should_panic(expected = "closed database")]
    fn test_close_twice_panics() {
        let mut db = Database::open_in_memory(1, no_op).unwrap();
        db.close().unwrap();
        let _ = db.close();
    }

    #[test]
    #[should_panic(expected = "can't call begin on a closed database")]
    fn test_begin_after_close_panics() {
        let mut db = Database::open_in_memory(1, no_op).unwrap();
        db.close().unwrap();
        let _ = db.begin();
    }

    #[test]
    fn test_begin_commit_and_rollback() {
        let mut db = Database::open_in_memory(1, |tx, _, _| {
            tx.execute_batch("CREATE TABLE items (name TEXT)")?;
            Ok(())
        })
        .unwrap();

        {
            let tx = db.begin().unwrap();
            tx.execute("INSERT INTO items (name) VALUES ('kept')", [])
                .unwrap();
            tx.commit().unwrap();
        }
        {
            let tx = db.begin().unwrap();
            tx.execute("INSERT INTO items (name) VALUES ('dropped')", [])
                .unwrap();
            // no commit
        }

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
