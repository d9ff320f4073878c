//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Daemon log output. The CLI logs to stderr and ignores this section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,
    /// `"json"` for one object per line, anything else for human-readable output.
    #[serde(default = "default_format")]
    pub format: String,
    /// Colorize human-readable output.
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            ansi: default_ansi(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

fn default_ansi() -> bool {
    true
}
