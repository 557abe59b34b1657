//! Sync ledger database layer
//!
//! SQLite persistence for the device registry, content catalog, version
//! ledger and sync status table, exposed through [`SqliteStorage`].

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod storage;

pub use connection::{connect, connect_in_memory, DatabaseConfig, DbPool};
pub use migrations::{applied_version, current_version, optimize, run_migrations, verify_integrity};
pub use storage::SqliteStorage;
