//! Per-device sync progress

use super::identity::{ContentId, DeviceId};
use super::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// How far one device has synced one content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub content_id: ContentId,
    pub device_id: DeviceId,
    /// Highest version this device is known to have
    pub latest_version: u64,
    pub last_synced: Timestamp,
}

impl SyncStatus {
    /// Creates a sync status row
    pub fn new(
        content_id: ContentId,
        device_id: DeviceId,
        latest_version: u64,
        last_synced: Timestamp,
    ) -> Self {
        Self {
            content_id,
            device_id,
            latest_version,
            last_synced,
        }
    }

    /// Returns true if the device has reached `latest_version`
    pub fn is_caught_up(&self, latest_version: u64) -> bool {
        self.latest_version >= latest_version
    }
}
