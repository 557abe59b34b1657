//! `[store]` section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Devices per identity can be lowered from this value, never raised
pub const DEVICE_LIMIT_CEILING: usize = 100;

/// Largest accepted bound for history and overview reads
pub const HISTORY_LIMIT_CEILING: usize = 1000;

/// Limits enforced by the metadata store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub max_devices_per_identity: usize,

    /// Entries returned by version history and sync overview reads
    pub max_history_entries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_devices_per_identity: DEVICE_LIMIT_CEILING,
            max_history_entries: 100,
        }
    }
}

impl ConfigSection for StoreConfig {
    const SECTION: &'static str = "store";

    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::section(Self::SECTION)
            .in_range(
                "max_devices_per_identity",
                self.max_devices_per_identity,
                1..=DEVICE_LIMIT_CEILING,
            )
            .in_range(
                "max_history_entries",
                self.max_history_entries,
                1..=HISTORY_LIMIT_CEILING,
            )
            .finish()
    }
}
