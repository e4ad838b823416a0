//! sqlmeta CLI
//!
//! Command-line interface for inspecting and migrating sqlmeta databases.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sqlmeta_core::Config;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "sqlmeta")]
#[command(about = "sqlmeta - versioned SQLite meta tables")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Database file (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Expected schema version (overrides config)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    schema_version: Option<u32>,

    /// Config file to use instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or migrate the database to a schema version
    Migrate {
        /// Target version (defaults to the configured schema version)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        to: Option<u32>,
        /// SQL script run inside the migration transaction
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Show the stored schema version
    Version,
    /// Print the value of a key
    Get {
        key: String,
    },
    /// Store a value under a key
    Set {
        key: String,
        value: String,
    },
    /// Remove a key
    #[command(alias = "rm")]
    Drop {
        key: String,
    },
    /// List all keys
    #[command(alias = "ls")]
    Keys,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (database_path, schema_version, create_dirs, foreign_keys)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Migrate { to, script } => commands::migrate::run(
            &config,
            to.unwrap_or(config.schema_version),
            script.as_deref(),
            &output,
        ),
        Commands::Version => commands::values::version(&config, &output),
        Commands::Get { key } => commands::values::get(&config, &key, &output),
        Commands::Set { key, value } => commands::values::set(&config, &key, &value, &output),
        Commands::Drop { key } => commands::values::drop_key(&config, &key, &output),
        Commands::Keys => commands::values::keys(&config, &output),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => {
                commands::config::show(&config, cli.config.as_ref(), &output)
            }
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(&key, &value, cli.config.as_ref(), &output)
            }
        },
    }
}

/// Load the config file, then apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    if let Some(version) = cli.schema_version {
        config.schema_version = version;
    }
    Ok(config)
}

/// Log to stderr; RUST_LOG takes precedence over --verbose
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sqlmeta_core={},sqlmeta={}", level, level)));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
