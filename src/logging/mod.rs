//! Logger initialisation
//!
//! Library code logs through the `log` facade. Binaries and tests that want
//! the output call [`init_logging`] once; `RUST_LOG` takes precedence over the
//! configured filter.

use serde::{Deserialize, Serialize};

/// Logging section of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter in `env_logger` syntax, e.g. `info` or `docauth=debug`
    pub filter: String,
    /// Include timestamps in log lines
    pub include_timestamp: bool,
    /// Include the module path in log lines
    pub include_module: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            include_timestamp: true,
            include_module: true,
        }
    }
}

/// Install `env_logger` according to `config`.
///
/// Returns `false` when a logger was already installed, which is not an error.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&config.filter);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    if !config.include_timestamp {
        builder.format_timestamp(None);
    }
    builder.format_module_path(config.include_module);
    builder.try_init().is_ok()
}
