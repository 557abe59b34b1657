//! Version ledger operations

use super::is_unique_violation;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use sqlx::{Executor, Row};
use syncledger_core::{
    ContentHash, ContentId, DeviceId, Identity, StoreError, Timestamp, VersionRecord,
};

/// Gets one ledger entry
pub async fn get_version<'e, E>(
    executor: E,
    owner: &Identity,
    content_id: &ContentId,
    version: u64,
) -> Result<Option<VersionRecord>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT content_id, version, hash, timestamp, device_id, change_description, size_bytes
        FROM versions WHERE owner = ? AND content_id = ? AND version = ?
        "#,
    )
    .bind(owner.as_str())
    .bind(content_id.as_str())
    .bind(version as i64)
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::database("Failed to fetch version", e))?;

    row.map(row_to_version).transpose()
}

/// Lists up to `limit` ledger entries, newest first
pub async fn list_versions<'e, E>(
    executor: E,
    owner: &Identity,
    content_id: &ContentId,
    limit: usize,
) -> Result<Vec<VersionRecord>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT content_id, version, hash, timestamp, device_id, change_description, size_bytes
        FROM versions WHERE owner = ? AND content_id = ?
        ORDER BY version DESC
        LIMIT ?
        "#,
    )
    .bind(owner.as_str())
    .bind(content_id.as_str())
    .bind(limit as i64)
    .fetch_all(executor)
    .await
    .map_err(|e| StoreError::database("Failed to list versions", e))?;

    rows.into_iter().map(row_to_version).collect()
}

/// Returns the highest version number recorded for a content item
pub async fn highest_version<'e, E>(
    executor: E,
    owner: &Identity,
    content_id: &ContentId,
) -> Result<Option<u64>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let max: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM versions WHERE owner = ? AND content_id = ?")
            .bind(owner.as_str())
            .bind(content_id.as_str())
            .fetch_one(executor)
            .await
            .map_err(|e| StoreError::database("Failed to read highest version", e))?;

    Ok(max.map(|v| v as u64))
}

/// Appends a ledger entry
pub async fn insert_version(
    conn: &mut SqliteConnection,
    owner: &Identity,
    record: &VersionRecord,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO versions (
            owner, content_id, version, hash, timestamp,
            device_id, change_description, size_bytes
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(owner.as_str())
    .bind(record.content_id.as_str())
    .bind(record.version as i64)
    .bind(&record.hash.as_bytes()[..])
    .bind(record.timestamp.to_column())
    .bind(record.device_id.as_str())
    .bind(&record.change_description)
    .bind(record.size_bytes as i64)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::VersionConflict {
                content_id: record.content_id.to_string(),
                expected: record.version.saturating_sub(1),
                found: record.version,
            }
        } else {
            StoreError::database("Failed to append version", e)
        }
    })?;

    Ok(())
}

pub(crate) fn row_to_version(row: SqliteRow) -> Result<VersionRecord, StoreError> {
    let content_id: String = row
        .try_get("content_id")
        .map_err(|e| StoreError::database("Missing content ID", e))?;
    let version: i64 = row
        .try_get("version")
        .map_err(|e| StoreError::database("Missing version", e))?;
    let hash: Vec<u8> = row
        .try_get("hash")
        .map_err(|e| StoreError::database("Missing hash", e))?;
    let timestamp: i64 = row
        .try_get("timestamp")
        .map_err(|e| StoreError::database("Missing timestamp", e))?;
    let device_id: String = row
        .try_get("device_id")
        .map_err(|e| StoreError::database("Missing device ID", e))?;
    let size_bytes: i64 = row
        .try_get("size_bytes")
        .map_err(|e| StoreError::database("Missing size_bytes", e))?;

    Ok(VersionRecord {
        content_id: ContentId::from_string(content_id),
        version: version as u64,
        hash: ContentHash::from_slice(&hash)?,
        timestamp: Timestamp::from_column(timestamp),
        device_id: DeviceId::from_string(device_id),
        change_description: row
            .try_get("change_description")
            .map_err(|e| StoreError::database("Missing change_description", e))?,
        size_bytes: size_bytes as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_in_memory;
    use crate::migrations::run_migrations;
    use crate::DbPool;

    async fn setup() -> DbPool {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn record(id: &str, version: u64) -> VersionRecord {
        VersionRecord {
            content_id: ContentId::from(id),
            version,
            hash: ContentHash::digest(format!("{}-{}", id, version).as_bytes()),
            timestamp: Timestamp::from_millis(version * 10),
            device_id: DeviceId::from("laptop"),
            change_description: format!("edit {}", version),
            size_bytes: version * 100,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_version() {
        let pool = setup().await;
        let owner = Identity::new("alice");
        let rec = record("doc", 2);

        let mut conn = pool.acquire().await.unwrap();
        insert_version(&mut conn, &owner, &rec).await.unwrap();
        drop(conn);

        let loaded = get_version(&pool, &owner, &rec.content_id, 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, rec);
        assert!(get_version(&pool, &owner, &rec.content_id, 3)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_version_is_conflict() {
        let pool = setup().await;
        let owner = Identity::new("alice");
        let mut conn = pool.acquire().await.unwrap();

        insert_version(&mut conn, &owner, &record("doc", 2)).await.unwrap();
        let err = insert_version(&mut conn, &owner, &record("doc", 2))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::VersionConflict { found: 2, .. }));
    }

    #[tokio::test]
    async fn test_list_versions_newest_first_with_limit() {
        let pool = setup().await;
        let owner = Identity::new("alice");
        let mut conn = pool.acquire().await.unwrap();
        for v in 2..=6 {
            insert_version(&mut conn, &owner, &record("doc", v)).await.unwrap();
        }
        drop(conn);

        let listed = list_versions(&pool, &owner, &ContentId::from("doc"), 3)
            .await
            .unwrap();
        let numbers: Vec<u64> = listed.iter().map(|r| r.version).collect();
        assert_eq!(numbers, vec![6, 5, 4]);
    }

    #[tokio::test]
    async fn test_highest_version() {
        let pool = setup().await;
        let owner = Identity::new("alice");
        let doc = ContentId::from("doc");

        assert_eq!(highest_version(&pool, &owner, &doc).await.unwrap(), None);

        let mut conn = pool.acquire().await.unwrap();
        insert_version(&mut conn, &owner, &record("doc", 2)).await.unwrap();
        insert_version(&mut conn, &owner, &record("doc", 3)).await.unwrap();
        drop(conn);

        assert_eq!(highest_version(&pool, &owner, &doc).await.unwrap(), Some(3));
        assert_eq!(
            highest_version(&pool, &Identity::new("bob"), &doc)
                .await
                .unwrap(),
            None
        );
    }
}
