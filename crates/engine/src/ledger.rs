// crates/engine/src/ledger.rs
//! Version ledger operations

use crate::authz::{owned_content, registered_device};
use crate::store::MetadataStore;
use syncledger_core::validation::{validate_content_id, validate_new_version};
use syncledger_core::{
    ChangeSet, Clock, ContentId, Identity, LedgerStorage, Mutation, NewVersion, Result,
    SyncStatus, VersionRecord,
};

impl<S: LedgerStorage, C: Clock> MetadataStore<S, C> {
    /// Appends the next version of the caller's item and returns its number
    ///
    /// The ledger entry, the catalog's new `latest_version` and the
    /// producing device's sync status commit together. The producing device
    /// must be registered to the caller.
    pub async fn add_version(
        &self,
        caller: &Identity,
        content_id: &ContentId,
        input: NewVersion,
    ) -> Result<u64> {
        validate_content_id(content_id)?;
        validate_new_version(&input)?;

        let _gate = self.begin_write().await;

        let item = owned_content(&self.storage, caller, content_id).await?;
        registered_device(&self.storage, caller, &input.device_id).await?;

        let next = item.next_version();
        let now = self.clock.now();
        let record = VersionRecord::from_new(content_id.clone(), next, input, now);
        let status = SyncStatus::new(content_id.clone(), record.device_id.clone(), next, now);

        let changes = ChangeSet::new()
            .with(Mutation::AdvanceContent {
                owner: caller.clone(),
                content_id: content_id.clone(),
                expected: item.latest_version,
                latest_version: next,
                size_bytes: record.size_bytes,
                last_modified: now,
            })
            .with(Mutation::AppendVersion {
                owner: caller.clone(),
                record,
            })
            .with(Mutation::PutSyncStatus {
                owner: caller.clone(),
                status,
            });
        self.storage.apply(changes).await?;

        log::debug!("Content {} of {} advanced to version {}", content_id, caller, next);
        Ok(next)
    }

    /// Looks up one ledger entry of `owner`'s item
    ///
    /// Entries outlive their catalog row.
    pub async fn get_version_details(
        &self,
        owner: &Identity,
        content_id: &ContentId,
        version: u64,
    ) -> Result<Option<VersionRecord>> {
        self.storage.get_version(owner, content_id, version).await
    }

    /// Returns the newest ledger entries of `owner`'s item, newest first
    pub async fn version_history(
        &self,
        owner: &Identity,
        content_id: &ContentId,
    ) -> Result<Vec<VersionRecord>> {
        self.storage
            .list_versions(owner, content_id, self.config.max_history_entries)
            .await
    }
}
