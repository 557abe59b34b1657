//! Version ledger records and content digests

use super::identity::{ContentId, DeviceId};
use super::timestamp::Timestamp;
use crate::error::StoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a content digest in bytes
pub const HASH_LEN: usize = 32;

/// 32-byte digest of a version's content
///
/// Serialized as a lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Wraps raw digest bytes
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Wraps a digest slice, which must be exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, StoreError> {
        let array: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            StoreError::invalid_argument(
                "hash",
                format!("must be {} bytes, got {}", HASH_LEN, bytes.len()),
            )
        })?;
        Ok(Self(array))
    }

    /// SHA-256 of `data`
    pub fn digest(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Returns the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns the digest as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| StoreError::invalid_argument("hash", format!("not valid hex: {}", e)))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Fields supplied by the caller when recording a new version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVersion {
    pub hash: ContentHash,
    /// Device that produced the version
    pub device_id: DeviceId,
    pub change_description: String,
    pub size_bytes: u64,
}

impl NewVersion {
    /// Creates a new version description
    pub fn new(
        hash: ContentHash,
        device_id: DeviceId,
        change_description: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            hash,
            device_id,
            change_description: change_description.into(),
            size_bytes,
        }
    }
}

/// Immutable ledger entry for one version of a content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub content_id: ContentId,
    pub version: u64,
    pub hash: ContentHash,
    pub timestamp: Timestamp,
    pub device_id: DeviceId,
    pub change_description: String,
    pub size_bytes: u64,
}

impl VersionRecord {
    /// Builds the ledger entry for `version` from caller input
    pub fn from_new(
        content_id: ContentId,
        version: u64,
        input: NewVersion,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            content_id,
            version,
            hash: input.hash,
            timestamp,
            device_id: input.device_id,
            change_description: input.change_description,
            size_bytes: input.size_bytes,
        }
    }
}
