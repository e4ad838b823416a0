//! Configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/sqlmeta/config.toml)
//! 3. Environment variables (SQLMETA_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "SQLMETA";

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database file to open
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Schema version expected when opening the database
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Create the database's parent directory if it is missing
    #[serde(default = "default_true")]
    pub create_dirs: bool,

    /// Enable `PRAGMA foreign_keys` on every connection
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            schema_version: default_schema_version(),
            create_dirs: true,
            foreign_keys: true,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (SQLMETA_DATABASE, SQLMETA_SCHEMA_VERSION, ...)
    /// 2. Config file (~/.config/sqlmeta/config.toml or SQLMETA_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATABASE", ENV_PREFIX)) {
            self.database_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_SCHEMA_VERSION", ENV_PREFIX)) {
            self.schema_version = val
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}_SCHEMA_VERSION: {:?}", ENV_PREFIX, val))?;
        }

        if let Ok(val) = std::env::var(format!("{}_CREATE_DIRS", ENV_PREFIX)) {
            self.create_dirs = parse_flag(&val);
        }

        if let Ok(val) = std::env::var(format!("{}_FOREIGN_KEYS", ENV_PREFIX)) {
            self.foreign_keys = parse_flag(&val);
        }

        Ok(())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with SQLMETA_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlmeta")
            .join("config.toml")
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Get the default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sqlmeta")
        .join("sqlmeta.db")
}

fn default_schema_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "SQLMETA_DATABASE",
        "SQLMETA_SCHEMA_VERSION",
        "SQLMETA_CREATE_DIRS",
        "SQLMETA_FOREIGN_KEYS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, 1);
        assert!(config.create_dirs);
        assert!(config.foreign_keys);
        assert!(config.database_path.ends_with("sqlmeta/sqlmeta.db"));
    }

    #[test]
    fn test_env_override_database() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SQLMETA_DATABASE", "/tmp/sqlmeta-test.db");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/sqlmeta-test.db"));
    }

    #[test]
    fn test_env_override_flags() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SQLMETA_CREATE_DIRS", "false");
        env::set_var("SQLMETA_FOREIGN_KEYS", "0");
        config.apply_env_overrides().unwrap();
        assert!(!config.create_dirs);
        assert!(!config.foreign_keys);

        env::set_var("SQLMETA_CREATE_DIRS", "TRUE");
        env::set_var("SQLMETA_FOREIGN_KEYS", "1");
        config.apply_env_overrides().unwrap();
        assert!(config.create_dirs);
        assert!(config.foreign_keys);
    }

    #[test]
    fn test_env_override_schema_version() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SQLMETA_SCHEMA_VERSION", "12");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.schema_version, 12);

        env::set_var("SQLMETA_SCHEMA_VERSION", "twelve");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            database_path = "/custom/app.db"
            schema_version = 3
            foreign_keys = false
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/custom/app.db"));
        assert_eq!(config.schema_version, 3);
        assert!(!config.foreign_keys);
        // Unset fields keep their defaults
        assert!(config.create_dirs);
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sqlmeta").join("config.toml");

        let config = Config {
            database_path: PathBuf::from("/data/app.db"),
            schema_version: 9,
            create_dirs: false,
            foreign_keys: true,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.database_path, config.database_path);
        assert_eq!(loaded.schema_version, 9);
        assert!(!loaded.create_dirs);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.schema_version, 1);
    }
}
