//! Sync status operations

use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use sqlx::{Executor, Row};
use syncledger_core::{ContentId, DeviceId, Identity, StoreError, SyncStatus, Timestamp};

/// Gets one device's sync status for a content item
pub async fn get_sync_status<'e, E>(
    executor: E,
    owner: &Identity,
    content_id: &ContentId,
    device_id: &DeviceId,
) -> Result<Option<SyncStatus>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT content_id, device_id, latest_version, last_synced
        FROM sync_status WHERE owner = ? AND content_id = ? AND device_id = ?
        "#,
    )
    .bind(owner.as_str())
    .bind(content_id.as_str())
    .bind(device_id.as_str())
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::database("Failed to fetch sync status", e))?;

    row.map(row_to_sync_status).transpose()
}

/// Lists up to `limit` sync status rows for a content item, ordered by device
pub async fn list_sync_statuses<'e, E>(
    executor: E,
    owner: &Identity,
    content_id: &ContentId,
    limit: usize,
) -> Result<Vec<SyncStatus>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT content_id, device_id, latest_version, last_synced
        FROM sync_status WHERE owner = ? AND content_id = ?
        ORDER BY device_id
        LIMIT ?
        "#,
    )
    .bind(owner.as_str())
    .bind(content_id.as_str())
    .bind(limit as i64)
    .fetch_all(executor)
    .await
    .map_err(|e| StoreError::database("Failed to list sync statuses", e))?;

    rows.into_iter().map(row_to_sync_status).collect()
}

/// Creates or overwrites a device's sync status
pub async fn upsert_sync_status(
    conn: &mut SqliteConnection,
    owner: &Identity,
    status: &SyncStatus,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO sync_status (owner, content_id, device_id, latest_version, last_synced)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(owner, content_id, device_id) DO UPDATE SET
            latest_version = excluded.latest_version,
            last_synced = excluded.last_synced
        "#,
    )
    .bind(owner.as_str())
    .bind(status.content_id.as_str())
    .bind(status.device_id.as_str())
    .bind(status.latest_version as i64)
    .bind(status.last_synced.to_column())
    .execute(&mut *conn)
    .await
    .map_err(|e| StoreError::database("Failed to write sync status", e))?;

    Ok(())
}

pub(crate) fn row_to_sync_status(row: SqliteRow) -> Result<SyncStatus, StoreError> {
    let content_id: String = row
        .try_get("content_id")
        .map_err(|e| StoreError::database("Missing content ID", e))?;
    let device_id: String = row
        .try_get("device_id")
        .map_err(|e| StoreError::database("Missing device ID", e))?;
    let latest_version: i64 = row
        .try_get("latest_version")
        .map_err(|e| StoreError::database("Missing latest_version", e))?;
    let last_synced: i64 = row
        .try_get("last_synced")
        .map_err(|e| StoreError::database("Missing last_synced", e))?;

    Ok(SyncStatus {
        content_id: ContentId::from_string(content_id),
        device_id: DeviceId::from_string(device_id),
        latest_version: latest_version as u64,
        last_synced: Timestamp::from_column(last_synced),
    })
}
