//! SQLite-backed [`LedgerStorage`]

use crate::connection::{connect, connect_in_memory, DatabaseConfig};
use crate::migrations::run_migrations;
use crate::queries::{contents, devices, sync_status, versions};
use crate::DbPool;
use async_trait::async_trait;
use sqlx::SqliteConnection;
use syncledger_core::{
    ChangeSet, ContentId, ContentItem, Device, DeviceId, Identity, LedgerStorage, Mutation,
    StoreError, SyncStatus, VersionRecord,
};

/// Ledger storage on a SQLite connection pool
///
/// Each [`ChangeSet`] runs inside one SQL transaction; any failing mutation
/// rolls the whole set back when the transaction is dropped uncommitted.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: DbPool,
}

impl SqliteStorage {
    /// Wraps an existing pool; the schema must already be migrated
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connects using `config` and runs pending migrations
    pub async fn open(config: DatabaseConfig) -> Result<Self, StoreError> {
        let pool = connect(config).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Opens a fresh migrated in-memory database
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = connect_in_memory().await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

async fn apply_mutation(conn: &mut SqliteConnection, mutation: Mutation) -> Result<(), StoreError> {
    match mutation {
        Mutation::InsertDevice { owner, device } => {
            if devices::find_device(&mut *conn, &owner, &device.device_id)
                .await?
                .is_some()
            {
                return Err(StoreError::DeviceExists {
                    device_id: device.device_id.to_string(),
                });
            }
            devices::insert_device(conn, &owner, &device).await
        }
        Mutation::RemoveDevice { owner, device_id } => {
            match devices::delete_device(conn, &owner, &device_id).await? {
                0 => Err(StoreError::DeviceNotFound {
                    device_id: device_id.to_string(),
                }),
                _ => Ok(()),
            }
        }
        Mutation::InsertContent(item) => contents::insert_content(conn, &item).await,
        Mutation::UpdateContent(item) => match contents::update_content(conn, &item).await? {
            0 => Err(StoreError::NotFound {
                content_id: item.content_id.to_string(),
            }),
            _ => Ok(()),
        },
        Mutation::RemoveContent { owner, content_id } => {
            match contents::delete_content(conn, &owner, &content_id).await? {
                0 => Err(StoreError::NotFound {
                    content_id: content_id.to_string(),
                }),
                _ => Ok(()),
            }
        }
        Mutation::AppendVersion { owner, record } => {
            versions::insert_version(conn, &owner, &record).await
        }
        Mutation::AdvanceContent {
            owner,
            content_id,
            expected,
            latest_version,
            size_bytes,
            last_modified,
        } => {
            let updated = contents::advance_content(
                &mut *conn,
                &owner,
                &content_id,
                expected,
                latest_version,
                size_bytes,
                last_modified,
            )
            .await?;
            if updated == 1 {
                return Ok(());
            }
            match contents::get_content(&mut *conn, &owner, &content_id).await? {
                Some(current) => Err(StoreError::VersionConflict {
                    content_id: content_id.to_string(),
                    expected,
                    found: current.latest_version,
                }),
                None => Err(StoreError::NotFound {
                    content_id: content_id.to_string(),
                }),
            }
        }
        Mutation::PutSyncStatus { owner, status } => {
            sync_status::upsert_sync_status(conn, &owner, &status).await
        }
    }
}

#[async_trait]
impl LedgerStorage for SqliteStorage {
    async fn list_devices(&self, owner: &Identity) -> Result<Vec<Device>, StoreError> {
        devices::list_devices(&self.pool, owner).await
    }

    async fn find_device(
        &self,
        owner: &Identity,
        device_id: &DeviceId,
    ) -> Result<Option<Device>, StoreError> {
        devices::find_device(&self.pool, owner, device_id).await
    }

    async fn get_content(
        &self,
        owner: &Identity,
        content_id: &ContentId,
    ) -> Result<Option<ContentItem>, StoreError> {
        contents::get_content(&self.pool, owner, content_id).await
    }

    async fn get_version(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        version: u64,
    ) -> Result<Option<VersionRecord>, StoreError> {
        versions::get_version(&self.pool, owner, content_id, version).await
    }

    async fn list_versions(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        limit: usize,
    ) -> Result<Vec<VersionRecord>, StoreError> {
        versions::list_versions(&self.pool, owner, content_id, limit).await
    }

    async fn highest_version(
        &self,
        owner: &Identity,
        content_id: &ContentId,
    ) -> Result<Option<u64>, StoreError> {
        versions::highest_version(&self.pool, owner, content_id).await
    }

    async fn get_sync_status(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        device_id: &DeviceId,
    ) -> Result<Option<SyncStatus>, StoreError> {
        sync_status::get_sync_status(&self.pool, owner, content_id, device_id).await
    }

    async fn list_sync_statuses(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        limit: usize,
    ) -> Result<Vec<SyncStatus>, StoreError> {
        sync_status::list_sync_statuses(&self.pool, owner, content_id, limit).await
    }

    async fn apply(&self, changes: ChangeSet) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }

        let count = changes.len();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::database("Failed to begin transaction", e))?;

        for mutation in changes.into_mutations() {
            let entity = mutation.entity();
            if let Err(err) = apply_mutation(&mut *tx, mutation).await {
                log::debug!("Rolling back change set: {} write failed: {}", entity, err);
                return Err(err);
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::database("Failed to commit transaction", e))?;

        log::debug!("Committed change set of {} mutations", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncledger_core::{ContentHash, ContentMetadata, Timestamp};

    fn owner() -> Identity {
        Identity::new("alice")
    }

    fn content() -> ContentItem {
        ContentItem::new(
            owner(),
            ContentId::from("doc"),
            ContentMetadata::new("T", "txt", 100),
            1,
            Timestamp::from_millis(1),
        )
    }

    fn version(v: u64) -> VersionRecord {
        VersionRecord {
            content_id: ContentId::from("doc"),
            version: v,
            hash: ContentHash::digest(b"body"),
            timestamp: Timestamp::from_millis(5),
            device_id: DeviceId::from("laptop"),
            change_description: "edit".to_string(),
            size_bytes: 10,
        }
    }

    fn add_version_set(expected: u64) -> ChangeSet {
        let next = expected + 1;
        ChangeSet::new()
            .with(Mutation::AppendVersion {
                owner: owner(),
                record: version(next),
            })
            .with(Mutation::AdvanceContent {
                owner: owner(),
                content_id: ContentId::from("doc"),
                expected,
                latest_version: next,
                size_bytes: 10,
                last_modified: Timestamp::from_millis(5),
            })
            .with(Mutation::PutSyncStatus {
                owner: owner(),
                status: SyncStatus::new(
                    ContentId::from("doc"),
                    DeviceId::from("laptop"),
                    next,
                    Timestamp::from_millis(5),
                ),
            })
    }

    #[tokio::test]
    async fn test_change_set_commits_all_rows() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        storage
            .apply(ChangeSet::single(Mutation::InsertContent(content())))
            .await
            .unwrap();

        storage.apply(add_version_set(1)).await.unwrap();

        let doc = ContentId::from("doc");
        let item = storage.get_content(&owner(), &doc).await.unwrap().unwrap();
        assert_eq!(item.latest_version, 2);
        assert!(storage
            .get_version(&owner(), &doc, 2)
            .await
            .unwrap()
            .is_some());
        let status = storage
            .get_sync_status(&owner(), &doc, &DeviceId::from("laptop"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.latest_version, 2);
    }

    #[tokio::test]
    async fn test_stale_change_set_rolls_back() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        storage
            .apply(ChangeSet::single(Mutation::InsertContent(content())))
            .await
            .unwrap();
        storage.apply(add_version_set(1)).await.unwrap();

        // Expects version 3 while the catalog holds 2: the ledger insert
        // succeeds, the catalog check fails, and nothing may remain
        let err = storage.apply(add_version_set(3)).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { found: 2, .. }));

        let doc = ContentId::from("doc");
        assert!(storage
            .get_version(&owner(), &doc, 4)
            .await
            .unwrap()
            .is_none());
        let status = storage
            .get_sync_status(&owner(), &doc, &DeviceId::from("laptop"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.latest_version, 2);
    }

    #[tokio::test]
    async fn test_remove_missing_device_fails() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let err = storage
            .apply(ChangeSet::single(Mutation::RemoveDevice {
                owner: owner(),
                device_id: DeviceId::from("ghost"),
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DeviceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_device_in_change_set() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let device = Device::new(DeviceId::from("phone"), "Phone", Timestamp::EPOCH);
        let err = storage
            .apply(
                ChangeSet::new()
                    .with(Mutation::InsertDevice {
                        owner: owner(),
                        device: device.clone(),
                    })
                    .with(Mutation::InsertDevice {
                        owner: owner(),
                        device,
                    }),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DeviceExists { .. }));
        assert!(storage.list_devices(&owner()).await.unwrap().is_empty());
    }
}
