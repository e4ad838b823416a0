//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a stored value
    ///
    /// Quiet mode prints the bare value so it can be captured by scripts.
    pub fn print_value(&self, key: &str, value: &str) {
        match self.format {
            OutputFormat::Human => println!("{} = {}", key, value),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"key": key, "value": value}));
            }
            OutputFormat::Quiet => println!("{}", value),
        }
    }

    /// Print the list of user keys
    pub fn print_keys(&self, keys: &[String]) {
        match self.format {
            OutputFormat::Human => {
                if keys.is_empty() {
                    println!("No keys stored.");
                    return;
                }
                for key in keys {
                    println!("{}", key);
                }
                println!("\n{} key(s)", keys.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"keys": keys}));
            }
            OutputFormat::Quiet => {
                for key in keys {
                    println!("{}", key);
                }
            }
        }
    }

    /// Print the stored schema version
    pub fn print_version(&self, path: &str, version: u32) {
        match self.format {
            OutputFormat::Human => println!("{}: schema version {}", path, version),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"database": path, "schema_version": version})
                );
            }
            OutputFormat::Quiet => println!("{}", version),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}
