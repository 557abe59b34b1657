// crates/engine/src/catalog.rs
//! Content catalog operations

use crate::authz::owned_content;
use crate::store::MetadataStore;
use syncledger_core::validation::{validate_content_id, validate_metadata};
use syncledger_core::{
    ChangeSet, Clock, ContentId, ContentItem, ContentMetadata, Identity, LedgerStorage, Mutation,
    Result, StoreError, INITIAL_VERSION,
};

impl<S: LedgerStorage, C: Clock> MetadataStore<S, C> {
    /// Creates a catalog row for `(content_id, caller)`
    ///
    /// A new item starts at version 1 with no ledger entry. If the id was
    /// used before and deleted, numbering continues after the highest
    /// surviving ledger version.
    pub async fn create_content(
        &self,
        caller: &Identity,
        content_id: ContentId,
        metadata: ContentMetadata,
    ) -> Result<ContentItem> {
        validate_content_id(&content_id)?;
        validate_metadata(&metadata)?;

        let _gate = self.begin_write().await;

        if self.storage.get_content(caller, &content_id).await?.is_some() {
            return Err(StoreError::AlreadyExists {
                content_id: content_id.to_string(),
            });
        }

        let latest_version = self
            .storage
            .highest_version(caller, &content_id)
            .await?
            .map_or(INITIAL_VERSION, |v| v.max(INITIAL_VERSION));
        if latest_version > INITIAL_VERSION {
            log::info!(
                "Content {} re-created by {}, continuing at version {}",
                content_id,
                caller,
                latest_version
            );
        }

        let item = ContentItem::new(
            caller.clone(),
            content_id,
            metadata,
            latest_version,
            self.clock.now(),
        );
        self.storage
            .apply(ChangeSet::single(Mutation::InsertContent(item.clone())))
            .await?;

        log::info!("Created content {} for {}", item.content_id, caller);
        Ok(item)
    }

    /// Replaces title, content type and size of the caller's item
    ///
    /// `created_at` and `latest_version` are kept; `last_modified` moves to now.
    pub async fn update_content(
        &self,
        caller: &Identity,
        content_id: &ContentId,
        metadata: ContentMetadata,
    ) -> Result<ContentItem> {
        validate_content_id(content_id)?;
        validate_metadata(&metadata)?;

        let _gate = self.begin_write().await;

        let current = self
            .storage
            .get_content(caller, content_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                content_id: content_id.to_string(),
            })?;

        let updated = current.with_metadata(metadata, self.clock.now());
        self.storage
            .apply(ChangeSet::single(Mutation::UpdateContent(updated.clone())))
            .await?;

        log::debug!("Updated content {} for {}", content_id, caller);
        Ok(updated)
    }

    /// Removes the caller's catalog row
    ///
    /// Ledger entries and sync status rows for the item stay in place.
    pub async fn delete_content(&self, caller: &Identity, content_id: &ContentId) -> Result<()> {
        validate_content_id(content_id)?;

        let _gate = self.begin_write().await;

        owned_content(&self.storage, caller, content_id).await?;
        self.storage
            .apply(ChangeSet::single(Mutation::RemoveContent {
                owner: caller.clone(),
                content_id: content_id.clone(),
            }))
            .await?;

        log::info!("Deleted content {} for {}", content_id, caller);
        Ok(())
    }

    /// Looks up `owner`'s catalog row
    pub async fn get_content_info(
        &self,
        owner: &Identity,
        content_id: &ContentId,
    ) -> Result<Option<ContentItem>> {
        self.storage.get_content(owner, content_id).await
    }

    /// Returns true if `owner` has a catalog row for `content_id`
    pub async fn content_exists(&self, owner: &Identity, content_id: &ContentId) -> Result<bool> {
        Ok(self.get_content_info(owner, content_id).await?.is_some())
    }
}
