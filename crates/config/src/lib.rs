//! Configuration for the sync metadata store
//!
//! One TOML file with three tables:
//!
//! ```toml
//! version = 1
//!
//! [app]
//! log_level = "info"
//!
//! [store]
//! max_devices_per_identity = 100
//! max_history_entries = 100
//!
//! [database]
//! path = "syncledger.db"
//! max_connections = 10
//! enable_wal = true
//! ```
//!
//! Missing tables and keys take their defaults. Saving validates first and
//! replaces the file by rename, keeping the previous copy as
//! `config.toml.backup`. `SYNCLEDGER_*` environment variables override the
//! file, see [`ConfigManager::load_with_env_overrides`].
//!
//! # Example
//!
//! ```rust,no_run
//! use syncledger_config::ConfigManager;
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load_or_default();
//! println!("Device limit: {}", config.store.max_devices_per_identity);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

pub mod app_config;
mod database_config;
mod store_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{
    ConfigManager, ENV_DATABASE_PATH, ENV_LOG_LEVEL, ENV_MAX_CONNECTIONS, ENV_MAX_DEVICES,
    ENV_MAX_HISTORY,
};
pub use persistence::ConfigPersistence;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use database_config::{DatabaseConfig, MAX_POOL_SIZE};
pub use store_config::{StoreConfig, DEVICE_LIMIT_CEILING, HISTORY_LIMIT_CEILING};

use serde::{Deserialize, Serialize};

/// File format written by this version
pub const CONFIG_VERSION: u32 = 1;

/// Whole configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub app: AppConfig,
    pub store: StoreConfig,
    pub database: DatabaseConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks every section, returning all problems at once
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            self.app.validate(),
            self.store.validate(),
            self.database.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Like [`validate`](Self::validate), as a [`ConfigError::Invalid`]
    pub fn ensure_valid(&self) -> ConfigResult<()> {
        self.validate().map_err(ConfigError::Invalid)
    }

    /// True if the file was written by a newer release
    pub fn is_newer_format(&self) -> bool {
        self.version > CONFIG_VERSION
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            store: StoreConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}
