//! Error types for the sync metadata store
//!
//! Every failure the store can report is a variant of [`StoreError`]. Each
//! variant maps to exactly one [`ErrorKind`] so callers (and transport
//! bindings) can branch on an enumerable kind instead of parsing messages.
//!
//! Errors are grouped into three severity tiers:
//! - **Rejected**: the request itself was invalid or unauthorized; nothing was written
//! - **Transient**: storage was busy or a concurrent writer interfered; resubmitting may succeed
//! - **Fatal**: storage is unusable (corruption, failed migration)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Request refused, no effect on stored state
    Rejected,
    /// Storage-level failure that may clear up on resubmission
    Transient,
    /// Storage cannot be used until repaired
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "Rejected"),
            Self::Transient => write!(f, "Transient"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Enumerable failure kind, stable across transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotAuthorized,
    InvalidDevice,
    NotFound,
    DeviceExists,
    DeviceNotFound,
    AlreadyExists,
    InvalidVersion,
    VersionNotFound,
    CapacityExceeded,
    InvalidArgument,
    VersionConflict,
    Database,
    MigrationFailed,
    Internal,
}

/// Main error type for the store
#[derive(Error, Debug)]
pub enum StoreError {
    // ===== Authorization =====
    /// Caller is not the recorded owner of the content item
    #[error("Not authorized: caller does not own content '{content_id}'")]
    NotAuthorized { content_id: String },

    /// Device is not registered to the caller
    #[error("Invalid device: '{device_id}' is not registered to the caller")]
    InvalidDevice { device_id: String },

    // ===== Device registry =====
    /// Device id already present in the caller's device list
    #[error("Device already registered: {device_id}")]
    DeviceExists { device_id: String },

    /// Device id not present in the caller's device list
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    /// Device list is full
    #[error("Device capacity exceeded (limit: {limit})")]
    CapacityExceeded { limit: usize },

    // ===== Content catalog =====
    /// No content item for this (content_id, owner) pair
    #[error("Content not found: {content_id}")]
    NotFound { content_id: String },

    /// Content item already exists for this owner
    #[error("Content already exists: {content_id}")]
    AlreadyExists { content_id: String },

    // ===== Versions =====
    /// Synced version below the first valid version number
    #[error("Invalid version: {version} (versions start at 1)")]
    InvalidVersion { version: u64 },

    /// Synced version beyond the content item's latest version
    #[error("Version not found: {version} (latest is {latest})")]
    VersionNotFound { version: u64, latest: u64 },

    /// Storage refused a version write because the ledger moved underneath it
    #[error("Version conflict on '{content_id}': expected latest {expected}, found {found}")]
    VersionConflict {
        content_id: String,
        expected: u64,
        found: u64,
    },

    // ===== Input =====
    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },

    // ===== Storage =====
    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database migration failed
    #[error("Migration failed: {version} - {reason}")]
    MigrationFailed { version: i64, reason: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl StoreError {
    /// Returns the enumerable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::InvalidDevice { .. } => ErrorKind::InvalidDevice,
            Self::DeviceExists { .. } => ErrorKind::DeviceExists,
            Self::DeviceNotFound { .. } => ErrorKind::DeviceNotFound,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::InvalidVersion { .. } => ErrorKind::InvalidVersion,
            Self::VersionNotFound { .. } => ErrorKind::VersionNotFound,
            Self::VersionConflict { .. } => ErrorKind::VersionConflict,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::DatabaseError { .. } => ErrorKind::Database,
            Self::MigrationFailed { .. } => ErrorKind::MigrationFailed,
            Self::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::VersionConflict { .. } | Self::DatabaseError { .. } => ErrorSeverity::Transient,

            Self::MigrationFailed { .. } | Self::InternalError { .. } => ErrorSeverity::Fatal,

            _ => ErrorSeverity::Rejected,
        }
    }

    /// Returns true if resubmitting the same request may succeed
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Transient
    }

    /// Returns true if the caller sent a request the store refused
    pub fn is_rejection(&self) -> bool {
        self.severity() == ErrorSeverity::Rejected
    }

    /// Helper to create a database error from any error type
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create an invalid argument error
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Error for a poisoned in-process lock
    pub fn lock_poisoned() -> Self {
        Self::InternalError {
            message: "Lock poisoned".to_string(),
        }
    }
}

/// Convenience type alias for Results using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Rejected < ErrorSeverity::Transient);
        assert!(ErrorSeverity::Transient < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_authorization_errors_are_rejections() {
        let errors = vec![
            StoreError::NotAuthorized {
                content_id: "doc".to_string(),
            },
            StoreError::InvalidDevice {
                device_id: "laptop".to_string(),
            },
            StoreError::CapacityExceeded { limit: 100 },
            StoreError::VersionNotFound {
                version: 9,
                latest: 3,
            },
        ];

        for err in errors {
            assert_eq!(err.severity(), ErrorSeverity::Rejected);
            assert!(err.is_rejection());
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_version_conflict_is_retryable() {
        let err = StoreError::VersionConflict {
            content_id: "doc".to_string(),
            expected: 2,
            found: 3,
        };
        assert_eq!(err.kind(), ErrorKind::VersionConflict);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_migration_failure_is_fatal() {
        let err = StoreError::MigrationFailed {
            version: 2,
            reason: "syntax error".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.kind(), ErrorKind::MigrationFailed);
    }

    #[test]
    fn test_kinds_are_distinct() {
        let errors = vec![
            StoreError::NotAuthorized {
                content_id: "a".to_string(),
            },
            StoreError::InvalidDevice {
                device_id: "a".to_string(),
            },
            StoreError::NotFound {
                content_id: "a".to_string(),
            },
            StoreError::DeviceExists {
                device_id: "a".to_string(),
            },
            StoreError::DeviceNotFound {
                device_id: "a".to_string(),
            },
            StoreError::AlreadyExists {
                content_id: "a".to_string(),
            },
            StoreError::InvalidVersion { version: 0 },
            StoreError::VersionNotFound {
                version: 5,
                latest: 1,
            },
            StoreError::CapacityExceeded { limit: 100 },
        ];

        let kinds: std::collections::HashSet<ErrorKind> =
            errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::VersionNotFound {
            version: 7,
            latest: 4,
        };
        let display = err.to_string();
        assert!(display.contains('7'));
        assert!(display.contains('4'));
    }

    #[test]
    fn test_database_helper_keeps_source() {
        let inner = io::Error::new(io::ErrorKind::Other, "disk I/O error");
        let err = StoreError::database("Query failed", inner);

        assert!(matches!(err, StoreError::DatabaseError { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::VersionNotFound).unwrap();
        assert_eq!(json, "\"version_not_found\"");
    }
}
