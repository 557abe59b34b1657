//! Database query operations organized by table
//!
//! Reads accept any executor (the pool or an open transaction); writes take a
//! connection so callers can group them inside one transaction.

pub mod contents;
pub mod devices;
pub mod sync_status;
pub mod versions;

// Re-export commonly used query functions
pub use contents::{advance_content, delete_content, get_content, insert_content, update_content};
pub use devices::{delete_device, find_device, insert_device, list_devices};
pub use sync_status::{get_sync_status, list_sync_statuses, upsert_sync_status};
pub use versions::{get_version, highest_version, insert_version, list_versions};

/// Returns true if the error is a UNIQUE or PRIMARY KEY violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
