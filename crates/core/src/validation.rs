//! Field limits for caller-supplied values
//!
//! Limits are counted in characters, not bytes.

use crate::error::{Result, StoreError};
use crate::types::{ContentId, ContentMetadata, DeviceId, NewVersion};

pub const MAX_DEVICE_ID_LEN: usize = 36;
pub const MAX_DEVICE_NAME_LEN: usize = 64;
pub const MAX_CONTENT_ID_LEN: usize = 128;
pub const MAX_TITLE_LEN: usize = 128;
pub const MAX_CONTENT_TYPE_LEN: usize = 32;
pub const MAX_CHANGE_DESCRIPTION_LEN: usize = 256;

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(StoreError::invalid_argument(
            field,
            format!("must be at most {} characters, got {}", max, len),
        ));
    }
    Ok(())
}

fn check_id(field: &str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(StoreError::invalid_argument(field, "must not be empty"));
    }
    check_len(field, value, max)
}

/// Validates a device identifier
pub fn validate_device_id(device_id: &DeviceId) -> Result<()> {
    check_id("device_id", device_id.as_str(), MAX_DEVICE_ID_LEN)
}

/// Validates a device display name
pub fn validate_device_name(device_name: &str) -> Result<()> {
    check_len("device_name", device_name, MAX_DEVICE_NAME_LEN)
}

/// Validates a content identifier
pub fn validate_content_id(content_id: &ContentId) -> Result<()> {
    check_id("content_id", content_id.as_str(), MAX_CONTENT_ID_LEN)
}

/// Validates caller-editable content attributes
pub fn validate_metadata(metadata: &ContentMetadata) -> Result<()> {
    check_len("title", &metadata.title, MAX_TITLE_LEN)?;
    check_len("content_type", &metadata.content_type, MAX_CONTENT_TYPE_LEN)
}

/// Validates the caller-supplied part of a version record
pub fn validate_new_version(input: &NewVersion) -> Result<()> {
    validate_device_id(&input.device_id)?;
    check_len(
        "change_description",
        &input.change_description,
        MAX_CHANGE_DESCRIPTION_LEN,
    )
}
