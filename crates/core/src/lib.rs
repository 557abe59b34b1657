//! Core types for the sync metadata store
//!
//! This crate holds everything the storage backends and the store service
//! share: domain records, the error taxonomy, the injected clock, field
//! validation, and the [`LedgerStorage`] repository trait.

pub mod clock;
pub mod error;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorKind, ErrorSeverity, Result, StoreError};
pub use storage::{ChangeSet, Entity, LedgerStorage, Mutation};
pub use types::{
    ContentHash, ContentId, ContentItem, ContentMetadata, Device, DeviceId, Identity, NewVersion,
    SyncStatus, Timestamp, VersionRecord, HASH_LEN, INITIAL_VERSION, MAX_DEVICES_PER_IDENTITY,
};
