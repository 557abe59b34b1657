// crates/engine/src/registry.rs
//! Device registry operations

use crate::store::MetadataStore;
use syncledger_core::validation::{validate_device_id, validate_device_name};
use syncledger_core::{
    ChangeSet, Clock, Device, DeviceId, Identity, LedgerStorage, Mutation, Result, StoreError,
};

impl<S: LedgerStorage, C: Clock> MetadataStore<S, C> {
    /// Adds a device to the caller's list
    ///
    /// Fails with `DeviceExists` if the id is already registered, then with
    /// `CapacityExceeded` if the list is full.
    pub async fn register_device(
        &self,
        caller: &Identity,
        device_id: DeviceId,
        device_name: &str,
    ) -> Result<Device> {
        validate_device_id(&device_id)?;
        validate_device_name(device_name)?;

        let _gate = self.begin_write().await;

        let devices = self.storage.list_devices(caller).await?;
        if devices.iter().any(|d| d.device_id == device_id) {
            return Err(StoreError::DeviceExists {
                device_id: device_id.to_string(),
            });
        }
        if devices.len() >= self.config.max_devices_per_identity {
            return Err(StoreError::CapacityExceeded {
                limit: self.config.max_devices_per_identity,
            });
        }

        let device = Device::new(device_id, device_name, self.clock.now());
        self.storage
            .apply(ChangeSet::single(Mutation::InsertDevice {
                owner: caller.clone(),
                device: device.clone(),
            }))
            .await?;

        log::info!("Registered device {} for {}", device.device_id, caller);
        Ok(device)
    }

    /// Removes a device from the caller's list
    ///
    /// Sync status rows that mention the device are left in place.
    pub async fn remove_device(&self, caller: &Identity, device_id: &DeviceId) -> Result<()> {
        validate_device_id(device_id)?;

        let _gate = self.begin_write().await;
        self.storage
            .apply(ChangeSet::single(Mutation::RemoveDevice {
                owner: caller.clone(),
                device_id: device_id.clone(),
            }))
            .await?;

        log::info!("Removed device {} for {}", device_id, caller);
        Ok(())
    }

    /// Returns true if `device_id` is registered to `caller`
    pub async fn is_user_device(&self, caller: &Identity, device_id: &DeviceId) -> Result<bool> {
        Ok(self.storage.find_device(caller, device_id).await?.is_some())
    }

    /// Returns the caller's devices in registration order
    pub async fn get_user_devices(&self, caller: &Identity) -> Result<Vec<Device>> {
        self.storage.list_devices(caller).await
    }
}
