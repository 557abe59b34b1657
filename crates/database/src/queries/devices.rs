//! Device registry operations

use super::is_unique_violation;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use sqlx::{Executor, Row};
use syncledger_core::{Device, DeviceId, Identity, StoreError, Timestamp};

/// Lists an owner's devices in registration order
pub async fn list_devices<'e, E>(executor: E, owner: &Identity) -> Result<Vec<Device>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT device_id, device_name, added_at FROM devices WHERE owner = ? ORDER BY seq",
    )
    .bind(owner.as_str())
    .fetch_all(executor)
    .await
    .map_err(|e| StoreError::database("Failed to list devices", e))?;

    rows.into_iter().map(row_to_device).collect()
}

/// Gets one of an owner's devices
pub async fn find_device<'e, E>(
    executor: E,
    owner: &Identity,
    device_id: &DeviceId,
) -> Result<Option<Device>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT device_id, device_name, added_at FROM devices WHERE owner = ? AND device_id = ?",
    )
    .bind(owner.as_str())
    .bind(device_id.as_str())
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::database("Failed to fetch device", e))?;

    row.map(row_to_device).transpose()
}

/// Registers a device
pub async fn insert_device(
    conn: &mut SqliteConnection,
    owner: &Identity,
    device: &Device,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO devices (owner, device_id, device_name, added_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(owner.as_str())
    .bind(device.device_id.as_str())
    .bind(&device.device_name)
    .bind(device.added_at.to_column())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::DeviceExists {
                device_id: device.device_id.to_string(),
            }
        } else {
            StoreError::database("Failed to register device", e)
        }
    })?;

    Ok(())
}

/// Removes a device, returning the number of rows deleted
pub async fn delete_device(
    conn: &mut SqliteConnection,
    owner: &Identity,
    device_id: &DeviceId,
) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM devices WHERE owner = ? AND device_id = ?")
        .bind(owner.as_str())
        .bind(device_id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::database("Failed to remove device", e))?;

    Ok(result.rows_affected())
}

pub(crate) fn row_to_device(row: SqliteRow) -> Result<Device, StoreError> {
    let device_id: String = row
        .try_get("device_id")
        .map_err(|e| StoreError::database("Missing device ID", e))?;
    let device_name: String = row
        .try_get("device_name")
        .map_err(|e| StoreError::database("Missing device name", e))?;
    let added_at: i64 = row
        .try_get("added_at")
        .map_err(|e| StoreError::database("Missing added_at", e))?;

    Ok(Device {
        device_id: DeviceId::from_string(device_id),
        device_name,
        added_at: Timestamp::from_column(added_at),
    })
}
