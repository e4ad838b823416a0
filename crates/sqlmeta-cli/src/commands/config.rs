//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use sqlmeta_core::Config;

use crate::output::{Output, OutputFormat};

/// Show the effective configuration
pub fn show(config: &Config, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database_path": config.database_path,
                    "schema_version": config.schema_version,
                    "create_dirs": config.create_dirs,
                    "foreign_keys": config.foreign_keys
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.database_path.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  database_path:  {}", config.database_path.display());
            println!("  schema_version: {}", config.schema_version);
            println!("  create_dirs:    {}", config.create_dirs);
            println!("  foreign_keys:   {}", config.foreign_keys);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value and write the config file
pub fn set(key: &str, value: &str, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    let mut config = Config::load_from_path(&path).context("Failed to load configuration")?;

    match key {
        "database_path" => {
            config.database_path = value.into();
        }
        "schema_version" => {
            let version: u32 = value
                .parse()
                .context("Invalid value for schema_version. Use a positive integer.")?;
            if version == 0 {
                bail!("schema_version must be at least 1");
            }
            config.schema_version = version;
        }
        "create_dirs" => {
            config.create_dirs = value
                .parse()
                .context("Invalid value for create_dirs. Use 'true' or 'false'.")?;
        }
        "foreign_keys" => {
            config.foreign_keys = value
                .parse()
                .context("Invalid value for foreign_keys. Use 'true' or 'false'.")?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: database_path, schema_version, create_dirs, foreign_keys",
                key
            );
        }
    }

    config
        .save_to(&path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
