// crates/engine/src/status.rs
//! Sync status operations

use crate::authz::{owned_content, registered_device};
use crate::store::MetadataStore;
use serde::{Deserialize, Serialize};
use syncledger_core::validation::{validate_content_id, validate_device_id};
use syncledger_core::{
    ChangeSet, Clock, ContentId, ContentItem, DeviceId, Identity, LedgerStorage, Mutation, Result,
    StoreError, SyncStatus, INITIAL_VERSION,
};

/// One device's progress on a content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProgress {
    pub status: SyncStatus,
    /// True if the device has reached the item's latest version
    pub up_to_date: bool,
}

/// A content item together with every device's progress on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOverview {
    pub item: ContentItem,
    /// Ordered by device id
    pub devices: Vec<DeviceProgress>,
}

impl SyncOverview {
    /// Devices that still lag behind
    pub fn pending(&self) -> impl Iterator<Item = &DeviceProgress> {
        self.devices.iter().filter(|d| !d.up_to_date)
    }
}

impl<S: LedgerStorage, C: Clock> MetadataStore<S, C> {
    /// Records that `device_id` has caught up to `synced_version`
    ///
    /// The version must lie in `[1, latest_version]` as of this call. A lower
    /// value than previously reported overwrites it.
    pub async fn update_sync_status(
        &self,
        caller: &Identity,
        content_id: &ContentId,
        device_id: &DeviceId,
        synced_version: u64,
    ) -> Result<SyncStatus> {
        validate_content_id(content_id)?;
        validate_device_id(device_id)?;

        let _gate = self.begin_write().await;

        let item = owned_content(&self.storage, caller, content_id).await?;
        registered_device(&self.storage, caller, device_id).await?;

        if synced_version < INITIAL_VERSION {
            return Err(StoreError::InvalidVersion {
                version: synced_version,
            });
        }
        if !item.has_version(synced_version) {
            return Err(StoreError::VersionNotFound {
                version: synced_version,
                latest: item.latest_version,
            });
        }

        let status = SyncStatus::new(
            content_id.clone(),
            device_id.clone(),
            synced_version,
            self.clock.now(),
        );
        self.storage
            .apply(ChangeSet::single(Mutation::PutSyncStatus {
                owner: caller.clone(),
                status: status.clone(),
            }))
            .await?;

        log::debug!(
            "Device {} of {} synced {} to version {}",
            device_id,
            caller,
            content_id,
            synced_version
        );
        Ok(status)
    }

    /// Looks up one device's progress on `owner`'s item
    pub async fn get_device_sync_info(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        device_id: &DeviceId,
    ) -> Result<Option<SyncStatus>> {
        self.storage
            .get_sync_status(owner, content_id, device_id)
            .await
    }

    /// Returns `owner`'s item with each device's progress, or `None` if the
    /// item does not exist
    pub async fn content_sync_overview(
        &self,
        owner: &Identity,
        content_id: &ContentId,
    ) -> Result<Option<SyncOverview>> {
        let Some(item) = self.storage.get_content(owner, content_id).await? else {
            return Ok(None);
        };

        let devices = self
            .storage
            .list_sync_statuses(owner, content_id, self.config.max_history_entries)
            .await?
            .into_iter()
            .map(|status| DeviceProgress {
                up_to_date: status.is_caught_up(item.latest_version),
                status,
            })
            .collect();

        Ok(Some(SyncOverview { item, devices }))
    }
}
