//! Configuration management
//!
//! Loads [`AuthConfig`] from a TOML file. The file is located through an
//! explicit path, the `DOCAUTH_CONFIG` environment variable, or the platform
//! configuration directory, in that order. A missing file yields defaults.

pub mod error;

pub use error::{ConfigError, ConfigResult};

use crate::adapters::RelationBinding;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "DOCAUTH_CONFIG";

/// Environment variable overriding `storage.path`
pub const STORAGE_PATH_ENV: &str = "DOCAUTH_STORAGE_PATH";

/// Top-level configuration for an [`AuthSource`](crate::AuthSource)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub storage: StorageConfig,
    pub hasher: HasherConfig,
    pub logging: LoggingConfig,
    /// Binding for the user/group relation
    pub membership: RelationBinding,
    /// Binding for the group/permission relation
    pub assignment: RelationBinding,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            hasher: HasherConfig::default(),
            logging: LoggingConfig::default(),
            membership: RelationBinding::membership(),
            assignment: RelationBinding::assignment(),
        }
    }
}

impl AuthConfig {
    /// Validate every section of the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.hasher.validate()?;
        self.membership
            .validate_for::<crate::model::Group, crate::model::User>()?;
        self.assignment
            .validate_for::<crate::model::Permission, crate::model::Group>()?;
        Ok(())
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: AuthConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the sled database
    pub path: PathBuf,
    /// Open a throwaway database removed on drop
    pub temporary: bool,
    /// Flush to disk after every write
    pub flush_on_write: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            temporary: false,
            flush_on_write: true,
        }
    }
}

impl StorageConfig {
    /// Settings for an in-memory throwaway database
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            flush_on_write: false,
            ..Default::default()
        }
    }
}

/// Argon2id cost parameters for the credential hasher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Memory cost in KiB
    pub memory_cost_kib: u32,
    /// Number of iterations
    pub time_cost: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl HasherConfig {
    /// Cheap parameters for tests and development databases
    pub fn fast() -> Self {
        Self {
            memory_cost_kib: 64,
            time_cost: 1,
            parallelism: 1,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.memory_cost_kib < 8 {
            return Err(ConfigError::validation(
                "hasher.memory_cost_kib must be at least 8",
            ));
        }
        if self.time_cost < 1 {
            return Err(ConfigError::validation("hasher.time_cost must be at least 1"));
        }
        if !(1..=16777215).contains(&self.parallelism) {
            return Err(ConfigError::validation(
                "hasher.parallelism must be between 1 and 16777215",
            ));
        }
        Ok(())
    }
}

/// Default location of the configuration file on this platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docauth").join("config.toml"))
}

/// Load the configuration.
///
/// The explicit `path` wins over `DOCAUTH_CONFIG`, which wins over the
/// platform default. A file that does not exist yields the defaults; a file
/// that exists but fails to parse or validate is an error.
pub fn load_config(path: Option<&Path>) -> ConfigResult<AuthConfig> {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .or_else(default_config_path);

    let mut config = match config_path {
        Some(p) if p.exists() => {
            let text = std::fs::read_to_string(&p)?;
            log::info!("Loading configuration from {}", p.display());
            AuthConfig::from_toml_str(&text)?
        }
        Some(p) => {
            log::debug!("No configuration at {}, using defaults", p.display());
            AuthConfig::default()
        }
        None => AuthConfig::default(),
    };

    apply_storage_override(&mut config, std::env::var_os(STORAGE_PATH_ENV).map(PathBuf::from));
    Ok(config)
}

fn apply_storage_override(config: &mut AuthConfig, path: Option<PathBuf>) {
    if let Some(path) = path {
        log::debug!("Storage path overridden to {}", path.display());
        config.storage.path = path;
    }
}
