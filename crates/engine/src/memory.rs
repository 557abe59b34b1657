// crates/engine/src/memory.rs
//! In-process ledger storage

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use syncledger_core::{
    ChangeSet, ContentId, ContentItem, Device, DeviceId, Identity, LedgerStorage, Mutation,
    Result, StoreError, SyncStatus, VersionRecord,
};

type ContentKey = (Identity, ContentId);

#[derive(Debug, Default)]
struct State {
    devices: HashMap<Identity, Vec<Device>>,
    contents: HashMap<ContentKey, ContentItem>,
    versions: HashMap<ContentKey, BTreeMap<u64, VersionRecord>>,
    sync: HashMap<ContentKey, BTreeMap<DeviceId, SyncStatus>>,
}

/// What a successful mutation replaced, enough to put it back
#[derive(Debug)]
enum Undo {
    Devices {
        owner: Identity,
        previous: Option<Vec<Device>>,
    },
    Content {
        key: ContentKey,
        previous: Option<ContentItem>,
    },
    Version {
        key: ContentKey,
        version: u64,
    },
    Sync {
        key: ContentKey,
        device_id: DeviceId,
        previous: Option<SyncStatus>,
    },
}

impl State {
    /// Applies one mutation; a failing mutation changes nothing
    fn apply(&mut self, mutation: Mutation) -> Result<Undo> {
        match mutation {
            Mutation::InsertDevice { owner, device } => {
                let previous = self.devices.get(&owner).cloned();
                let list = self.devices.entry(owner.clone()).or_default();
                if list.iter().any(|d| d.device_id == device.device_id) {
                    return Err(StoreError::DeviceExists {
                        device_id: device.device_id.to_string(),
                    });
                }
                list.push(device);
                Ok(Undo::Devices { owner, previous })
            }
            Mutation::RemoveDevice { owner, device_id } => {
                let missing = || StoreError::DeviceNotFound {
                    device_id: device_id.to_string(),
                };
                let list = self.devices.get_mut(&owner).ok_or_else(missing)?;
                let position = list
                    .iter()
                    .position(|d| d.device_id == device_id)
                    .ok_or_else(missing)?;
                let previous = Some(list.clone());
                list.remove(position);
                Ok(Undo::Devices { owner, previous })
            }
            Mutation::InsertContent(item) => {
                let key = (item.owner.clone(), item.content_id.clone());
                if self.contents.contains_key(&key) {
                    return Err(StoreError::AlreadyExists {
                        content_id: item.content_id.to_string(),
                    });
                }
                self.contents.insert(key.clone(), item);
                Ok(Undo::Content {
                    key,
                    previous: None,
                })
            }
            Mutation::UpdateContent(item) => {
                let key = (item.owner.clone(), item.content_id.clone());
                let current = self
                    .contents
                    .get_mut(&key)
                    .ok_or_else(|| StoreError::NotFound {
                        content_id: item.content_id.to_string(),
                    })?;
                let previous = Some(current.clone());
                current.title = item.title;
                current.content_type = item.content_type;
                current.size_bytes = item.size_bytes;
                current.last_modified = item.last_modified;
                Ok(Undo::Content { key, previous })
            }
            Mutation::RemoveContent { owner, content_id } => {
                let key = (owner, content_id);
                match self.contents.remove(&key) {
                    Some(item) => Ok(Undo::Content {
                        key,
                        previous: Some(item),
                    }),
                    None => Err(StoreError::NotFound {
                        content_id: key.1.to_string(),
                    }),
                }
            }
            Mutation::AppendVersion { owner, record } => {
                let key = (owner, record.content_id.clone());
                let version = record.version;
                let ledger = self.versions.entry(key.clone()).or_default();
                if ledger.contains_key(&version) {
                    return Err(StoreError::VersionConflict {
                        content_id: record.content_id.to_string(),
                        expected: version.saturating_sub(1),
                        found: version,
                    });
                }
                ledger.insert(version, record);
                Ok(Undo::Version { key, version })
            }
            Mutation::AdvanceContent {
                owner,
                content_id,
                expected,
                latest_version,
                size_bytes,
                last_modified,
            } => {
                let key = (owner, content_id);
                let current = self
                    .contents
                    .get_mut(&key)
                    .ok_or_else(|| StoreError::NotFound {
                        content_id: key.1.to_string(),
                    })?;
                if current.latest_version != expected {
                    return Err(StoreError::VersionConflict {
                        content_id: key.1.to_string(),
                        expected,
                        found: current.latest_version,
                    });
                }
                let previous = Some(current.clone());
                current.latest_version = latest_version;
                current.size_bytes = size_bytes;
                current.last_modified = last_modified;
                Ok(Undo::Content { key, previous })
            }
            Mutation::PutSyncStatus { owner, status } => {
                let key = (owner, status.content_id.clone());
                let device_id = status.device_id.clone();
                let previous = self
                    .sync
                    .entry(key.clone())
                    .or_default()
                    .insert(device_id.clone(), status);
                Ok(Undo::Sync {
                    key,
                    device_id,
                    previous,
                })
            }
        }
    }

    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Devices {
                owner,
                previous: Some(list),
            } => {
                self.devices.insert(owner, list);
            }
            Undo::Devices {
                owner,
                previous: None,
            } => {
                self.devices.remove(&owner);
            }
            Undo::Content {
                key,
                previous: Some(item),
            } => {
                self.contents.insert(key, item);
            }
            Undo::Content {
                key,
                previous: None,
            } => {
                self.contents.remove(&key);
            }
            Undo::Version { key, version } => {
                if let Some(ledger) = self.versions.get_mut(&key) {
                    ledger.remove(&version);
                    if ledger.is_empty() {
                        self.versions.remove(&key);
                    }
                }
            }
            Undo::Sync {
                key,
                device_id,
                previous,
            } => {
                if let Some(table) = self.sync.get_mut(&key) {
                    match previous {
                        Some(status) => {
                            table.insert(device_id, status);
                        }
                        None => {
                            table.remove(&device_id);
                        }
                    }
                    if table.is_empty() {
                        self.sync.remove(&key);
                    }
                }
            }
        }
    }
}

/// [`LedgerStorage`] kept in memory
///
/// Clones share the same state. Each mutation of a change set records what
/// it replaced; if a later one fails, those entries are put back in reverse
/// order before the lock is released.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T> {
        let state = self.state.lock().map_err(|_| StoreError::lock_poisoned())?;
        Ok(f(&state))
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn list_devices(&self, owner: &Identity) -> Result<Vec<Device>> {
        self.read(|s| s.devices.get(owner).cloned().unwrap_or_default())
    }

    async fn find_device(&self, owner: &Identity, device_id: &DeviceId) -> Result<Option<Device>> {
        self.read(|s| {
            s.devices
                .get(owner)
                .and_then(|list| list.iter().find(|d| &d.device_id == device_id))
                .cloned()
        })
    }

    async fn get_content(
        &self,
        owner: &Identity,
        content_id: &ContentId,
    ) -> Result<Option<ContentItem>> {
        let key = (owner.clone(), content_id.clone());
        self.read(|s| s.contents.get(&key).cloned())
    }

    async fn get_version(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        version: u64,
    ) -> Result<Option<VersionRecord>> {
        let key = (owner.clone(), content_id.clone());
        self.read(|s| {
            s.versions
                .get(&key)
                .and_then(|ledger| ledger.get(&version))
                .cloned()
        })
    }

    async fn list_versions(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        limit: usize,
    ) -> Result<Vec<VersionRecord>> {
        let key = (owner.clone(), content_id.clone());
        self.read(|s| {
            s.versions
                .get(&key)
                .map(|ledger| ledger.values().rev().take(limit).cloned().collect())
                .unwrap_or_default()
        })
    }

    async fn highest_version(
        &self,
        owner: &Identity,
        content_id: &ContentId,
    ) -> Result<Option<u64>> {
        let key = (owner.clone(), content_id.clone());
        self.read(|s| {
            s.versions
                .get(&key)
                .and_then(|ledger| ledger.keys().next_back().copied())
        })
    }

    async fn get_sync_status(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        device_id: &DeviceId,
    ) -> Result<Option<SyncStatus>> {
        let key = (owner.clone(), content_id.clone());
        self.read(|s| {
            s.sync
                .get(&key)
                .and_then(|table| table.get(device_id))
                .cloned()
        })
    }

    async fn list_sync_statuses(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        limit: usize,
    ) -> Result<Vec<SyncStatus>> {
        let key = (owner.clone(), content_id.clone());
        self.read(|s| {
            s.sync
                .get(&key)
                .map(|table| table.values().take(limit).cloned().collect())
                .unwrap_or_default()
        })
    }

    async fn apply(&self, changes: ChangeSet) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| StoreError::lock_poisoned())?;

        let mut applied = Vec::with_capacity(changes.len());
        for mutation in changes.into_mutations() {
            match state.apply(mutation) {
                Ok(undo) => applied.push(undo),
                Err(err) => {
                    log::debug!("Rolling back {} applied mutations: {}", applied.len(), err);
                    for undo in applied.into_iter().rev() {
                        state.revert(undo);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
