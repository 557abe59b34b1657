//! SQLite connection pools

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::time::Duration;
use syncledger_core::StoreError;

/// Shared SQLite pool
pub type DbPool = SqlitePool;

/// How to open the database file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    /// WAL journal with `synchronous = NORMAL`
    pub enable_wal: bool,
    pub create_if_missing: bool,
    /// Wait on a locked database before reporting `SQLITE_BUSY`
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_connections: 10,
            enable_wal: true,
            create_if_missing: true,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn with_wal(mut self, enable: bool) -> Self {
        self.enable_wal = enable;
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            .busy_timeout(self.busy_timeout);

        if self.enable_wal {
            options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        } else {
            options.journal_mode(SqliteJournalMode::Delete)
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("syncledger.db")
    }
}

/// Opens a pool on the configured file
pub async fn connect(config: DatabaseConfig) -> Result<DbPool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(config.connect_options())
        .await
        .map_err(|e| StoreError::database(format!("Failed to open {}", config.path), e))?;

    log::info!(
        "Opened database {} (pool {}, wal {})",
        config.path,
        config.max_connections,
        config.enable_wal
    );
    Ok(pool)
}

/// Opens a private in-memory database
///
/// The database lives as long as its only connection, so the pool keeps
/// exactly one and never retires it.
pub async fn connect_in_memory() -> Result<DbPool, StoreError> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .journal_mode(SqliteJournalMode::Memory);

    SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::database("Failed to open in-memory database", e))
}

/// Waits for checked-out connections and closes the pool
pub async fn close(pool: DbPool) {
    pool.close().await;
    log::debug!("Database pool closed");
}
