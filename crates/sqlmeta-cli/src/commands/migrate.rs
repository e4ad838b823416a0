//! Migrate command handler

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use sqlmeta_core::{Config, Database};

use crate::commands::ensure_version;
use crate::output::Output;

/// Bring the database to `to`, running `script` as the migration body
pub fn run(config: &Config, to: u32, script: Option<&Path>, output: &Output) -> Result<()> {
    ensure_version(to)?;

    let sql = script
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read migration script {}", path.display()))
        })
        .transpose()?;

    let mut migrated_from = None;
    let mut db = Database::open_with_config(config, to, |tx, from, _| {
        if let Some(sql) = &sql {
            debug!("Running migration script ({} bytes)", sql.len());
            tx.execute_batch(sql)?;
        }
        migrated_from = Some(from);
        Ok(())
    })
    .with_context(|| format!("Failed to migrate {}", config.database_path.display()))?;
    db.close()?;

    let path = config.database_path.display();
    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "database": path.to_string(),
                "from": migrated_from,
                "to": to,
                "migrated": migrated_from.is_some()
            })
        );
        return Ok(());
    }

    match migrated_from {
        Some(from) => output.success(&format!("Migrated {} from version {} to {}", path, from, to)),
        None => output.success(&format!("{} is already at version {}", path, to)),
    }
    Ok(())
}
