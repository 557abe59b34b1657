// crates/engine/src/authz.rs
//! Ownership and device membership checks
//!
//! A content item belongs to the identity in its key, so looking up
//! `(caller, content_id)` is both the ownership and the existence test.
//! Another owner's rows are never consulted.

use syncledger_core::{
    ContentId, ContentItem, Device, DeviceId, Identity, LedgerStorage, Result, StoreError,
};

/// Returns the caller's catalog row or `NotAuthorized`
pub(crate) async fn owned_content<S: LedgerStorage>(
    storage: &S,
    caller: &Identity,
    content_id: &ContentId,
) -> Result<ContentItem> {
    storage
        .get_content(caller, content_id)
        .await?
        .ok_or_else(|| StoreError::NotAuthorized {
            content_id: content_id.to_string(),
        })
}

/// Returns the caller's registered device or `InvalidDevice`
pub(crate) async fn registered_device<S: LedgerStorage>(
    storage: &S,
    caller: &Identity,
    device_id: &DeviceId,
) -> Result<Device> {
    storage
        .find_device(caller, device_id)
        .await?
        .ok_or_else(|| StoreError::InvalidDevice {
            device_id: device_id.to_string(),
        })
}
