// crates/engine/src/store.rs
//! Metadata store service

use syncledger_config::{Config, StoreConfig};
use syncledger_core::{
    Clock, LedgerStorage, Result, StoreError, SystemClock, MAX_DEVICES_PER_IDENTITY,
};
use syncledger_database::SqliteStorage;
use tokio::sync::{Mutex, MutexGuard};

/// Limits applied by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Devices one identity may register, never above 100
    pub max_devices_per_identity: usize,
    /// Entries returned by history and overview reads
    pub max_history_entries: usize,
}

impl EngineConfig {
    /// Creates limits, clamping the device limit to `1..=100` and the
    /// history bound to at least 1
    pub fn new(max_devices_per_identity: usize, max_history_entries: usize) -> Self {
        Self {
            max_devices_per_identity: max_devices_per_identity.clamp(1, MAX_DEVICES_PER_IDENTITY),
            max_history_entries: max_history_entries.max(1),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(MAX_DEVICES_PER_IDENTITY, 100)
    }
}

impl From<&StoreConfig> for EngineConfig {
    fn from(config: &StoreConfig) -> Self {
        Self::new(config.max_devices_per_identity, config.max_history_entries)
    }
}

/// Multi-tenant sync metadata store
///
/// Every mutating operation validates its arguments, checks ownership and
/// device membership, and commits one [`ChangeSet`](syncledger_core::ChangeSet)
/// while holding the write gate, so mutations never interleave. Reads go
/// straight to storage.
pub struct MetadataStore<S, C = SystemClock> {
    pub(crate) storage: S,
    pub(crate) clock: C,
    pub(crate) config: EngineConfig,
    write_gate: Mutex<()>,
}

impl<S: LedgerStorage, C: Clock> MetadataStore<S, C> {
    /// Creates a store with default limits
    pub fn new(storage: S, clock: C) -> Self {
        Self::with_config(storage, clock, EngineConfig::default())
    }

    /// Creates a store with explicit limits
    pub fn with_config(storage: S, clock: C, config: EngineConfig) -> Self {
        Self {
            storage,
            clock,
            config,
            write_gate: Mutex::new(()),
        }
    }

    /// Returns the underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the active limits
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Waits for exclusive write access
    pub(crate) async fn begin_write(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }
}

/// A store persisted in SQLite
pub type SqliteMetadataStore = MetadataStore<SqliteStorage, SystemClock>;

/// Opens the SQLite-backed store described by `config`
///
/// The configuration is validated first; the database is created and
/// migrated as needed.
pub async fn open_store(config: &Config) -> Result<SqliteMetadataStore> {
    config
        .ensure_valid()
        .map_err(|e| StoreError::invalid_argument("config", e.to_string()))?;

    let db_config = syncledger_database::DatabaseConfig::new(config.database.path.clone())
        .with_max_connections(config.database.max_connections)
        .with_wal(config.database.enable_wal);
    let storage = SqliteStorage::open(db_config).await?;

    log::info!(
        "Metadata store ready at {} (device limit {}, history limit {})",
        config.database.path,
        config.store.max_devices_per_identity,
        config.store.max_history_entries
    );

    Ok(MetadataStore::with_config(
        storage,
        SystemClock::new(),
        EngineConfig::from(&config.store),
    ))
}
