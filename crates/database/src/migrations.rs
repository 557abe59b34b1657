//! Embedded schema migrations
//!
//! Each migration runs in its own transaction together with the row that
//! records it in `schema_migrations`, so a failed step leaves the database at
//! the previous version.

use crate::DbPool;
use syncledger_core::StoreError;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial schema",
        sql: include_str!("../migrations/001_initial_schema.sql"),
    },
    Migration {
        version: 2,
        name: "lookup indexes",
        sql: include_str!("../migrations/002_add_indexes.sql"),
    },
];

/// Schema version this build migrates to
pub fn current_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Highest version recorded in the database, 0 for a fresh file
pub async fn applied_version(pool: &DbPool) -> Result<i64, StoreError> {
    ensure_bookkeeping(pool).await?;
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::database("Failed to read schema version", e))?;
    Ok(version.unwrap_or(0))
}

/// Brings the schema up to [`current_version`]
///
/// Refuses a database written by a newer build.
pub async fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    let applied = applied_version(pool).await?;
    let target = current_version();

    if applied > target {
        return Err(StoreError::MigrationFailed {
            version: applied,
            reason: format!("database schema is newer than this build (max {})", target),
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        apply(pool, migration).await?;
    }
    Ok(())
}

async fn ensure_bookkeeping(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::database("Failed to create schema_migrations", e))?;
    Ok(())
}

async fn apply(pool: &DbPool, migration: &Migration) -> Result<(), StoreError> {
    let failed = |e: sqlx::Error| StoreError::MigrationFailed {
        version: migration.version,
        reason: e.to_string(),
    };

    let mut tx = pool.begin().await.map_err(failed)?;
    sqlx::raw_sql(migration.sql)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
        .bind(migration.version)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    tx.commit().await.map_err(failed)?;

    log::info!(
        "Applied migration {} ({})",
        migration.version,
        migration.name
    );
    Ok(())
}

/// Runs `PRAGMA integrity_check`
pub async fn verify_integrity(pool: &DbPool) -> Result<(), StoreError> {
    let report: Vec<String> = sqlx::query_scalar("PRAGMA integrity_check")
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::database("Failed to check integrity", e))?;

    match report.as_slice() {
        [only] if only == "ok" => Ok(()),
        problems => Err(StoreError::InternalError {
            message: format!("Integrity check failed: {}", problems.join("; ")),
        }),
    }
}

/// Runs `PRAGMA optimize`, meant for shutdown or idle periods
pub async fn optimize(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::query("PRAGMA optimize")
        .execute(pool)
        .await
        .map_err(|e| StoreError::database("Failed to optimize database", e))?;
    Ok(())
}
