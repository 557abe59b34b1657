// crates/engine/src/lib.rs
//! Multi-tenant sync metadata store
//!
//! This crate provides the store service on top of a [`LedgerStorage`]
//! backend:
//! - Device registry, bounded per identity
//! - Content catalog keyed by owner and content id
//! - Append-only version ledger with contiguous numbering
//! - Per-device sync status
//!
//! Every operation is scoped to the authenticated caller passed in by the
//! transport. Mutations are serialized and commit all-or-nothing.
//!
//! # Example
//!
//! ```rust
//! use syncledger_engine::{MemoryStorage, MetadataStore};
//! use syncledger_core::{
//!     ContentHash, ContentId, ContentMetadata, DeviceId, Identity, ManualClock, NewVersion,
//!     Timestamp,
//! };
//!
//! # tokio_test_block_on(async {
//! let store = MetadataStore::new(MemoryStorage::new(), ManualClock::new(Timestamp::EPOCH));
//! let alice = Identity::new("alice");
//!
//! store.register_device(&alice, DeviceId::from("laptop"), "Laptop").await?;
//! store
//!     .create_content(&alice, ContentId::from("notes"), ContentMetadata::new("Notes", "md", 0))
//!     .await?;
//!
//! let version = store
//!     .add_version(
//!         &alice,
//!         &ContentId::from("notes"),
//!         NewVersion::new(ContentHash::digest(b"hello"), DeviceId::from("laptop"), "first edit", 5),
//!     )
//!     .await?;
//! assert_eq!(version, 2);
//! # Ok::<(), syncledger_core::StoreError>(())
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod authz;
mod catalog;
mod ledger;
mod memory;
mod protocol;
mod registry;
mod status;
mod store;

pub use memory::MemoryStorage;
pub use protocol::{ErrorReply, Request, Response};
pub use status::{DeviceProgress, SyncOverview};
pub use store::{open_store, EngineConfig, MetadataStore, SqliteMetadataStore};

pub use syncledger_core::{LedgerStorage, Result, StoreError};

#[cfg(test)]
mod tests {
    use super::*;
    use syncledger_core::{ManualClock, Timestamp};

    #[test]
    fn test_all_exports_accessible() {
        let _: EngineConfig = EngineConfig::default();
        let store = MetadataStore::new(MemoryStorage::new(), ManualClock::new(Timestamp::EPOCH));
        let _: &MemoryStorage = store.storage();
        let _: Request = Request::GetUserDevices;
        let _: Response = Response::Done;
    }
}
