//! Key/value and version command handlers

use anyhow::{bail, Result};

use sqlmeta_core::{Config, StorageError};

use crate::commands::open_existing;
use crate::output::Output;

/// Print the value stored under `key`
pub fn get(config: &Config, key: &str, output: &Output) -> Result<()> {
    let db = open_existing(config)?;

    match db.get_value(key) {
        Ok(value) => {
            output.print_value(key, &value);
            Ok(())
        }
        Err(e) if e.is_no_result_for_key() => bail!("No value stored for key '{}'", key),
        Err(StorageError::ReservedKey) => bail!("'{}' is reserved for internal use", key),
        Err(e) => Err(e.into()),
    }
}

/// Store `value` under `key`
pub fn set(config: &Config, key: &str, value: &str, output: &Output) -> Result<()> {
    let mut db = open_existing(config)?;

    match db.set_value(key, value) {
        Err(StorageError::ReservedKey) => bail!("'{}' is reserved for internal use", key),
        result => result?,
    }
    db.close()?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

/// Remove `key`
pub fn drop_key(config: &Config, key: &str, output: &Output) -> Result<()> {
    let mut db = open_existing(config)?;

    match db.drop_value(key) {
        Err(StorageError::ReservedKey) => bail!("'{}' is reserved for internal use", key),
        result => result?,
    }
    db.close()?;

    output.success(&format!("Dropped {}", key));
    Ok(())
}

/// List all user keys
pub fn keys(config: &Config, output: &Output) -> Result<()> {
    let db = open_existing(config)?;
    output.print_keys(&db.keys()?);
    Ok(())
}

/// Print the stored schema version
pub fn version(config: &Config, output: &Output) -> Result<()> {
    let db = open_existing(config)?;
    let path = config.database_path.display().to_string();
    output.print_version(&path, db.schema_version()?);
    Ok(())
}
