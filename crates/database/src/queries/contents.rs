//! Content catalog operations

use super::is_unique_violation;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use sqlx::{Executor, Row};
use syncledger_core::{ContentId, ContentItem, Identity, StoreError, Timestamp};

const CONTENT_COLUMNS: &str =
    "owner, content_id, title, content_type, created_at, last_modified, size_bytes, latest_version";

/// Gets the catalog row for `(content_id, owner)`
pub async fn get_content<'e, E>(
    executor: E,
    owner: &Identity,
    content_id: &ContentId,
) -> Result<Option<ContentItem>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM contents WHERE owner = ? AND content_id = ?",
        CONTENT_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(owner.as_str())
        .bind(content_id.as_str())
        .fetch_optional(executor)
        .await
        .map_err(|e| StoreError::database("Failed to fetch content", e))?;

    row.map(row_to_content).transpose()
}

/// Creates a catalog row
pub async fn insert_content(
    conn: &mut SqliteConnection,
    item: &ContentItem,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO contents (
            owner, content_id, title, content_type,
            created_at, last_modified, size_bytes, latest_version
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item.owner.as_str())
    .bind(item.content_id.as_str())
    .bind(&item.title)
    .bind(&item.content_type)
    .bind(item.created_at.to_column())
    .bind(item.last_modified.to_column())
    .bind(item.size_bytes as i64)
    .bind(item.latest_version as i64)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::AlreadyExists {
                content_id: item.content_id.to_string(),
            }
        } else {
            StoreError::database("Failed to create content", e)
        }
    })?;

    Ok(())
}

/// Rewrites the caller-editable columns, returning the number of rows updated
///
/// `created_at` and `latest_version` are never touched here.
pub async fn update_content(
    conn: &mut SqliteConnection,
    item: &ContentItem,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE contents
        SET title = ?, content_type = ?, size_bytes = ?, last_modified = ?
        WHERE owner = ? AND content_id = ?
        "#,
    )
    .bind(&item.title)
    .bind(&item.content_type)
    .bind(item.size_bytes as i64)
    .bind(item.last_modified.to_column())
    .bind(item.owner.as_str())
    .bind(item.content_id.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| StoreError::database("Failed to update content", e))?;

    Ok(result.rows_affected())
}

/// Moves `latest_version` forward if it still equals `expected`
///
/// Returns the number of rows updated; zero means the row is missing or
/// another writer advanced it first.
pub async fn advance_content(
    conn: &mut SqliteConnection,
    owner: &Identity,
    content_id: &ContentId,
    expected: u64,
    latest_version: u64,
    size_bytes: u64,
    last_modified: Timestamp,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE contents
        SET latest_version = ?, size_bytes = ?, last_modified = ?
        WHERE owner = ? AND content_id = ? AND latest_version = ?
        "#,
    )
    .bind(latest_version as i64)
    .bind(size_bytes as i64)
    .bind(last_modified.to_column())
    .bind(owner.as_str())
    .bind(content_id.as_str())
    .bind(expected as i64)
    .execute(&mut *conn)
    .await
    .map_err(|e| StoreError::database("Failed to advance content version", e))?;

    Ok(result.rows_affected())
}

/// Deletes a catalog row, returning the number of rows deleted
pub async fn delete_content(
    conn: &mut SqliteConnection,
    owner: &Identity,
    content_id: &ContentId,
) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM contents WHERE owner = ? AND content_id = ?")
        .bind(owner.as_str())
        .bind(content_id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::database("Failed to delete content", e))?;

    Ok(result.rows_affected())
}

pub(crate) fn row_to_content(row: SqliteRow) -> Result<ContentItem, StoreError> {
    let owner: String = row
        .try_get("owner")
        .map_err(|e| StoreError::database("Missing owner", e))?;
    let content_id: String = row
        .try_get("content_id")
        .map_err(|e| StoreError::database("Missing content ID", e))?;
    let created_at: i64 = row
        .try_get("created_at")
        .map_err(|e| StoreError::database("Missing created_at", e))?;
    let last_modified: i64 = row
        .try_get("last_modified")
        .map_err(|e| StoreError::database("Missing last_modified", e))?;
    let size_bytes: i64 = row
        .try_get("size_bytes")
        .map_err(|e| StoreError::database("Missing size_bytes", e))?;
    let latest_version: i64 = row
        .try_get("latest_version")
        .map_err(|e| StoreError::database("Missing latest_version", e))?;

    Ok(ContentItem {
        content_id: ContentId::from_string(content_id),
        owner: Identity::new(owner),
        title: row
            .try_get("title")
            .map_err(|e| StoreError::database("Missing title", e))?,
        content_type: row
            .try_get("content_type")
            .map_err(|e| StoreError::database("Missing content_type", e))?,
        created_at: Timestamp::from_column(created_at),
        last_modified: Timestamp::from_column(last_modified),
        size_bytes: size_bytes as u64,
        latest_version: latest_version as u64,
    })
}
