//! Repository interface for the four persistent stores
//!
//! Reads are plain lookups. Writes are expressed as a [`ChangeSet`], an
//! ordered list of [`Mutation`]s that a backend must commit as one unit:
//! either every mutation is applied or none is.

use crate::error::Result;
use crate::types::{
    ContentId, ContentItem, Device, DeviceId, Identity, SyncStatus, Timestamp, VersionRecord,
};
use async_trait::async_trait;
use std::fmt;

/// Store touched by a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Device,
    Content,
    Version,
    SyncStatus,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "device"),
            Self::Content => write!(f, "content"),
            Self::Version => write!(f, "version"),
            Self::SyncStatus => write!(f, "sync_status"),
        }
    }
}

/// A single row-level write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Appends a device; fails with `DeviceExists` if the id is taken
    InsertDevice { owner: Identity, device: Device },
    /// Removes a device; fails with `DeviceNotFound` if absent
    RemoveDevice { owner: Identity, device_id: DeviceId },
    /// Creates a catalog row; fails with `AlreadyExists` if present
    InsertContent(ContentItem),
    /// Replaces title, content type, size and last_modified of an existing row
    UpdateContent(ContentItem),
    /// Deletes a catalog row; fails with `NotFound` if absent
    RemoveContent {
        owner: Identity,
        content_id: ContentId,
    },
    /// Appends a ledger entry; fails with `VersionConflict` if the version exists
    AppendVersion {
        owner: Identity,
        record: VersionRecord,
    },
    /// Moves `latest_version` from `expected` to `latest_version`
    ///
    /// Fails with `VersionConflict` if the row's current version is not `expected`.
    AdvanceContent {
        owner: Identity,
        content_id: ContentId,
        expected: u64,
        latest_version: u64,
        size_bytes: u64,
        last_modified: Timestamp,
    },
    /// Creates or overwrites a device's sync status
    PutSyncStatus { owner: Identity, status: SyncStatus },
}

impl Mutation {
    /// Returns the store this mutation writes to
    pub fn entity(&self) -> Entity {
        match self {
            Self::InsertDevice { .. } | Self::RemoveDevice { .. } => Entity::Device,
            Self::InsertContent(_)
            | Self::UpdateContent(_)
            | Self::RemoveContent { .. }
            | Self::AdvanceContent { .. } => Entity::Content,
            Self::AppendVersion { .. } => Entity::Version,
            Self::PutSyncStatus { .. } => Entity::SyncStatus,
        }
    }
}

/// Unit of work committed atomically by [`LedgerStorage::apply`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    /// Creates an empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a change set holding one mutation
    pub fn single(mutation: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
        }
    }

    /// Appends a mutation
    pub fn with(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Consumes the set, yielding its mutations in application order
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    /// Returns the number of mutations
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Returns true if there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Backend holding the device registry, content catalog, version ledger and
/// sync status table
///
/// Every key is scoped by owner so identical content ids from different
/// identities never collide.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Devices registered to `owner`, in registration order
    async fn list_devices(&self, owner: &Identity) -> Result<Vec<Device>>;

    /// Looks up one of `owner`'s devices
    async fn find_device(&self, owner: &Identity, device_id: &DeviceId) -> Result<Option<Device>>;

    /// Looks up the catalog row for `(content_id, owner)`
    async fn get_content(
        &self,
        owner: &Identity,
        content_id: &ContentId,
    ) -> Result<Option<ContentItem>>;

    /// Looks up one ledger entry
    async fn get_version(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        version: u64,
    ) -> Result<Option<VersionRecord>>;

    /// Up to `limit` ledger entries, newest first
    async fn list_versions(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        limit: usize,
    ) -> Result<Vec<VersionRecord>>;

    /// Highest version number in the ledger, including entries whose catalog
    /// row has been deleted
    async fn highest_version(&self, owner: &Identity, content_id: &ContentId)
        -> Result<Option<u64>>;

    /// Looks up one device's sync status
    async fn get_sync_status(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        device_id: &DeviceId,
    ) -> Result<Option<SyncStatus>>;

    /// Up to `limit` sync status rows for a content item, ordered by device id
    async fn list_sync_statuses(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        limit: usize,
    ) -> Result<Vec<SyncStatus>>;

    /// Commits every mutation in `changes`, or none of them
    async fn apply(&self, changes: ChangeSet) -> Result<()>;
}
