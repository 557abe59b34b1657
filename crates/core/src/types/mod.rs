//! Domain types for the sync metadata store
//!
//! - `identity`: caller identity and identifier newtypes
//! - `device`: registered devices
//! - `content`: content catalog records
//! - `sync_status`: per-device sync progress
//! - `timestamp`: wall-clock instants
//! - `version`: version ledger records and content digests

mod content;
mod device;
mod identity;
mod sync_status;
mod timestamp;
mod version;

pub use content::{ContentItem, ContentMetadata, INITIAL_VERSION};
pub use device::{Device, MAX_DEVICES_PER_IDENTITY};
pub use identity::{ContentId, DeviceId, Identity};
pub use sync_status::SyncStatus;
pub use timestamp::Timestamp;
pub use version::{ContentHash, NewVersion, VersionRecord, HASH_LEN};
