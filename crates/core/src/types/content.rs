//! Content catalog records

use super::identity::{ContentId, Identity};
use super::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Version number a content item starts at when created
pub const INITIAL_VERSION: u64 = 1;

/// Caller-editable attributes of a content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub title: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl ContentMetadata {
    /// Creates content metadata
    pub fn new(title: impl Into<String>, content_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            title: title.into(),
            content_type: content_type.into(),
            size_bytes,
        }
    }
}

/// Catalog row for one `(content_id, owner)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub content_id: ContentId,
    pub owner: Identity,
    pub title: String,
    pub content_type: String,
    pub created_at: Timestamp,
    pub last_modified: Timestamp,
    pub size_bytes: u64,
    /// Highest version number in the ledger; only ever increases
    pub latest_version: u64,
}

impl ContentItem {
    /// Creates a fresh catalog row starting at `latest_version`
    pub fn new(
        owner: Identity,
        content_id: ContentId,
        metadata: ContentMetadata,
        latest_version: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            content_id,
            owner,
            title: metadata.title,
            content_type: metadata.content_type,
            created_at: now,
            last_modified: now,
            size_bytes: metadata.size_bytes,
            latest_version,
        }
    }

    /// Returns a copy with new metadata, keeping `created_at` and `latest_version`
    pub fn with_metadata(&self, metadata: ContentMetadata, now: Timestamp) -> Self {
        Self {
            title: metadata.title,
            content_type: metadata.content_type,
            size_bytes: metadata.size_bytes,
            last_modified: now,
            ..self.clone()
        }
    }

    /// Version number the next `AddVersion` will produce
    pub fn next_version(&self) -> u64 {
        self.latest_version + 1
    }

    /// Returns true if `version` lies in `[1, latest_version]`
    pub fn has_version(&self, version: u64) -> bool {
        (INITIAL_VERSION..=self.latest_version).contains(&version)
    }
}
