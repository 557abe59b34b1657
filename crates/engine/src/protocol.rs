// crates/engine/src/protocol.rs
//! Operation surface as data
//!
//! A transport decodes a [`Request`], authenticates the caller, and passes
//! both to [`MetadataStore::handle`]. Failures convert to an [`ErrorReply`]
//! carrying the enumerable [`ErrorKind`].

use crate::status::SyncOverview;
use crate::store::MetadataStore;
use serde::{Deserialize, Serialize};
use syncledger_core::{
    Clock, ContentHash, ContentId, ContentItem, ContentMetadata, Device, DeviceId, ErrorKind,
    Identity, LedgerStorage, NewVersion, Result, StoreError, SyncStatus,
    VersionRecord,
};

/// A call on the store, made on behalf of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    RegisterDevice {
        device_id: DeviceId,
        device_name: String,
    },
    RemoveDevice {
        device_id: DeviceId,
    },
    IsUserDevice {
        device_id: DeviceId,
    },
    GetUserDevices,
    CreateContent {
        content_id: ContentId,
        title: String,
        content_type: String,
        size_bytes: u64,
    },
    UpdateContent {
        content_id: ContentId,
        title: String,
        content_type: String,
        size_bytes: u64,
    },
    DeleteContent {
        content_id: ContentId,
    },
    GetContentInfo {
        content_id: ContentId,
        owner: Identity,
    },
    ContentExists {
        content_id: ContentId,
        owner: Identity,
    },
    AddVersion {
        content_id: ContentId,
        hash: ContentHash,
        device_id: DeviceId,
        change_description: String,
        size_bytes: u64,
    },
    GetVersionDetails {
        content_id: ContentId,
        version: u64,
    },
    GetVersionHistory {
        content_id: ContentId,
    },
    UpdateSyncStatus {
        content_id: ContentId,
        device_id: DeviceId,
        synced_version: u64,
    },
    GetDeviceSyncInfo {
        content_id: ContentId,
        device_id: DeviceId,
    },
    GetContentSyncOverview {
        content_id: ContentId,
    },
}

impl Request {
    /// Operation name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterDevice { .. } => "register_device",
            Self::RemoveDevice { .. } => "remove_device",
            Self::IsUserDevice { .. } => "is_user_device",
            Self::GetUserDevices => "get_user_devices",
            Self::CreateContent { .. } => "create_content",
            Self::UpdateContent { .. } => "update_content",
            Self::DeleteContent { .. } => "delete_content",
            Self::GetContentInfo { .. } => "get_content_info",
            Self::ContentExists { .. } => "content_exists",
            Self::AddVersion { .. } => "add_version",
            Self::GetVersionDetails { .. } => "get_version_details",
            Self::GetVersionHistory { .. } => "get_version_history",
            Self::UpdateSyncStatus { .. } => "update_sync_status",
            Self::GetDeviceSyncInfo { .. } => "get_device_sync_info",
            Self::GetContentSyncOverview { .. } => "get_content_sync_overview",
        }
    }

    /// Returns true if the request can change stored state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::RegisterDevice { .. }
                | Self::RemoveDevice { .. }
                | Self::CreateContent { .. }
                | Self::UpdateContent { .. }
                | Self::DeleteContent { .. }
                | Self::AddVersion { .. }
                | Self::UpdateSyncStatus { .. }
        )
    }
}

/// Successful result of a [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "data", rename_all = "snake_case")]
pub enum Response {
    Done,
    Device(Device),
    Devices(Vec<Device>),
    Flag(bool),
    Content(ContentItem),
    ContentInfo(Option<ContentItem>),
    VersionAdded(u64),
    VersionDetails(Option<VersionRecord>),
    VersionHistory(Vec<VersionRecord>),
    SyncStatus(SyncStatus),
    SyncInfo(Option<SyncStatus>),
    SyncOverview(Option<SyncOverview>),
}

/// Failure of a [`Request`] as sent back to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub kind: ErrorKind,
    pub message: String,
    /// True if resubmitting the same request may succeed
    pub retryable: bool,
}

impl From<&StoreError> for ErrorReply {
    fn from(err: &StoreError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl<S: LedgerStorage, C: Clock> MetadataStore<S, C> {
    /// Runs `request` on behalf of `caller`
    ///
    /// Reads that take an explicit owner in their arguments use it; every
    /// other read is scoped to the caller. Applied mutations are logged at
    /// `debug`, rejections at `warn` and storage failures at `error`.
    pub async fn handle(&self, caller: &Identity, request: Request) -> Result<Response> {
        let name = request.name();
        let mutation = request.is_mutation();
        let result = self.dispatch(caller, request).await;

        match &result {
            Ok(_) if mutation => log::debug!("{} applied for {}", name, caller),
            Ok(_) => {}
            Err(err) if err.is_rejection() => {
                log::warn!("{} rejected for {}: {}", name, caller, err)
            }
            Err(err) => log::error!("{} failed for {}: {}", name, caller, err),
        }

        result
    }

    async fn dispatch(&self, caller: &Identity, request: Request) -> Result<Response> {
        let response = match request {
            Request::RegisterDevice {
                device_id,
                device_name,
            } => Response::Device(
                self.register_device(caller, device_id, &device_name)
                    .await?,
            ),
            Request::RemoveDevice { device_id } => {
                self.remove_device(caller, &device_id).await?;
                Response::Done
            }
            Request::IsUserDevice { device_id } => {
                Response::Flag(self.is_user_device(caller, &device_id).await?)
            }
            Request::GetUserDevices => Response::Devices(self.get_user_devices(caller).await?),
            Request::CreateContent {
                content_id,
                title,
                content_type,
                size_bytes,
            } => Response::Content(
                self.create_content(
                    caller,
                    content_id,
                    ContentMetadata::new(title, content_type, size_bytes),
                )
                .await?,
            ),
            Request::UpdateContent {
                content_id,
                title,
                content_type,
                size_bytes,
            } => Response::Content(
                self.update_content(
                    caller,
                    &content_id,
                    ContentMetadata::new(title, content_type, size_bytes),
                )
                .await?,
            ),
            Request::DeleteContent { content_id } => {
                self.delete_content(caller, &content_id).await?;
                Response::Done
            }
            Request::GetContentInfo { content_id, owner } => {
                Response::ContentInfo(self.get_content_info(&owner, &content_id).await?)
            }
            Request::ContentExists { content_id, owner } => {
                Response::Flag(self.content_exists(&owner, &content_id).await?)
            }
            Request::AddVersion {
                content_id,
                hash,
                device_id,
                change_description,
                size_bytes,
            } => Response::VersionAdded(
                self.add_version(
                    caller,
                    &content_id,
                    NewVersion::new(hash, device_id, change_description, size_bytes),
                )
                .await?,
            ),
            Request::GetVersionDetails {
                content_id,
                version,
            } => Response::VersionDetails(
                self.get_version_details(caller, &content_id, version)
                    .await?,
            ),
            Request::GetVersionHistory { content_id } => {
                Response::VersionHistory(self.version_history(caller, &content_id).await?)
            }
            Request::UpdateSyncStatus {
                content_id,
                device_id,
                synced_version,
            } => Response::SyncStatus(
                self.update_sync_status(caller, &content_id, &device_id, synced_version)
                    .await?,
            ),
            Request::GetDeviceSyncInfo {
                content_id,
                device_id,
            } => Response::SyncInfo(
                self.get_device_sync_info(caller, &content_id, &device_id)
                    .await?,
            ),
            Request::GetContentSyncOverview { content_id } => {
                Response::SyncOverview(self.content_sync_overview(caller, &content_id).await?)
            }
        };

        Ok(response)
    }
}
