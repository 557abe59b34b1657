//! Registered devices

use super::identity::DeviceId;
use super::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Hard ceiling on the number of devices one identity may register
pub const MAX_DEVICES_PER_IDENTITY: usize = 100;

/// A client endpoint registered by an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Caller-supplied identifier
    pub device_id: DeviceId,
    /// Human-readable name
    pub device_name: String,
    /// When the device was registered
    pub added_at: Timestamp,
}

impl Device {
    /// Creates a device record
    pub fn new(device_id: DeviceId, device_name: impl Into<String>, added_at: Timestamp) -> Self {
        Self {
            device_id,
            device_name: device_name.into(),
            added_at,
        }
    }
}
