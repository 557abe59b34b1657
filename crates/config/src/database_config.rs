//! `[database]` section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Largest accepted connection pool
pub const MAX_POOL_SIZE: u32 = 64;

/// SQLite backend settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file, relative paths resolve against the working directory
    pub path: String,

    pub max_connections: u32,

    /// Write-ahead logging with `synchronous = NORMAL`
    pub enable_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "syncledger.db".to_string(),
            max_connections: 10,
            enable_wal: true,
        }
    }
}

impl ConfigSection for DatabaseConfig {
    const SECTION: &'static str = "database";

    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::section(Self::SECTION)
            .not_empty("path", &self.path)
            .in_range("max_connections", self.max_connections, 1..=MAX_POOL_SIZE)
            .finish()
    }
}
