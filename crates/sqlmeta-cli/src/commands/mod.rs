//! Command handlers

pub mod config;
pub mod migrate;
pub mod values;

use anyhow::{bail, Context, Result};

use sqlmeta_core::{Config, Database};

/// Open the configured database without migrating it
///
/// Fails, leaving the file untouched, when the stored schema version is not
/// the configured one.
pub fn open_existing(config: &Config) -> Result<Database> {
    let path = &config.database_path;
    if !path.exists() {
        bail!(
            "Database not found: {}\nCreate it with: sqlmeta migrate --to {}",
            path.display(),
            config.schema_version
        );
    }
    ensure_version(config.schema_version)?;

    Database::open_with_config(config, config.schema_version, |_, from, to| {
        Err(format!(
            "database is at schema version {from}, expected {to}. Run: sqlmeta migrate --to {to}"
        )
        .into())
    })
    .with_context(|| format!("Failed to open database {}", path.display()))
}

/// Reject version 0 before it reaches the library
pub fn ensure_version(version: u32) -> Result<()> {
    if version == 0 {
        bail!("Schema version must be at least 1");
    }
    Ok(())
}
