//! PostgreSQL implementation of TextRepository.
//!
//! Texts live in the `texts` table. The accepted patch history is a JSONB
//! array and followers are a `TEXT[]` column.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row};
use std::collections::BTreeSet;

use super::db_error;
use crate::domain::foundation::{DomainError, ErrorCode, TextId, Timestamp, UserId};
use crate::domain::patch::Patch;
use crate::domain::text::Text;
use crate::ports::TextRepository;

/// PostgreSQL implementation of TextRepository.
#[derive(Clone)]
pub struct PostgresTextRepository {
    pool: PgPool,
}

impl PostgresTextRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TextRepository for PostgresTextRepository {
    async fn save(&self, text: &Text) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO texts (
                id, name, description, body, patches, followers, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(text.id().as_uuid())
        .bind(text.name())
        .bind(text.description())
        .bind(text.body())
        .bind(patches_to_json(text.patches())?)
        .bind(followers_to_vec(text))
        .bind(text.created_at().as_datetime())
        .bind(text.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to insert text"))?;

        Ok(())
    }

    async fn update(&self, text: &Text) -> Result<(), DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("Failed to acquire connection"))?;
        update_text(&mut conn, text).await
    }

    async fn find_by_id(&self, id: &TextId) -> Result<Option<Text>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, body, patches, followers, created_at, updated_at
            FROM texts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch text"))?;

        row.map(row_to_text).transpose()
    }

    async fn list_ids(&self) -> Result<Vec<TextId>, DomainError> {
        let ids: Vec<(uuid::Uuid,)> =
            sqlx::query_as("SELECT id FROM texts ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list texts"))?;

        Ok(ids.into_iter().map(|(id,)| TextId::from_uuid(id)).collect())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

/// Writes a text's mutable columns on an open connection or transaction.
async fn update_text(conn: &mut PgConnection, text: &Text) -> Result<(), DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE texts SET
            body = $2,
            patches = $3,
            followers = $4,
            updated_at = $5
        WHERE id = $1
        "#,
    )
    .bind(text.id().as_uuid())
    .bind(text.body())
    .bind(patches_to_json(text.patches())?)
    .bind(followers_to_vec(text))
    .bind(text.updated_at().as_datetime())
    .execute(&mut *conn)
    .await
    .map_err(db_error("Failed to update text"))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::TextNotFound,
            format!("Text not found: {}", text.id()),
        ));
    }

    Ok(())
}

/// Locks the text row for the rest of the transaction and returns the
/// number of patches stored.
pub(super) async fn lock_text(conn: &mut PgConnection, id: &TextId) -> Result<u32, DomainError> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT jsonb_array_length(patches) FROM texts WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_error("Failed to lock text"))?;

    row.map(|(patches,)| patches as u32).ok_or_else(|| {
        DomainError::new(ErrorCode::TextNotFound, format!("Text not found: {}", id))
    })
}

/// Writes the body and patch history of an accepted amendment. Followers are
/// left alone so a concurrent follow is not overwritten.
pub(super) async fn write_patched(conn: &mut PgConnection, text: &Text) -> Result<(), DomainError> {
    sqlx::query("UPDATE texts SET body = $2, patches = $3, updated_at = $4 WHERE id = $1")
        .bind(text.id().as_uuid())
        .bind(text.body())
        .bind(patches_to_json(text.patches())?)
        .bind(text.updated_at().as_datetime())
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to write patched text"))?;

    Ok(())
}

fn patches_to_json(patches: &[Patch]) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(patches).map_err(|e| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("Failed to serialize patches: {}", e),
        )
    })
}

fn followers_to_vec(text: &Text) -> Vec<String> {
    text.followers()
        .iter()
        .map(|u| u.as_str().to_string())
        .collect()
}

fn row_to_text(row: sqlx::postgres::PgRow) -> Result<Text, DomainError> {
    let id: uuid::Uuid = row.try_get("id").map_err(db_error("Failed to get id"))?;
    let name: String = row.try_get("name").map_err(db_error("Failed to get name"))?;
    let description: String = row
        .try_get("description")
        .map_err(db_error("Failed to get description"))?;
    let body: String = row.try_get("body").map_err(db_error("Failed to get body"))?;
    let patches: serde_json::Value = row
        .try_get("patches")
        .map_err(db_error("Failed to get patches"))?;
    let followers: Vec<String> = row
        .try_get("followers")
        .map_err(db_error("Failed to get followers"))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(db_error("Failed to get created_at"))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(db_error("Failed to get updated_at"))?;

    let patches: Vec<Patch> = serde_json::from_value(patches).map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid patches: {}", e))
    })?;
    let followers = followers
        .into_iter()
        .map(UserId::new)
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid follower: {}", e))
        })?;

    Ok(Text::reconstitute(
        TextId::from_uuid(id),
        name,
        description,
        body,
        patches,
        followers,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patch::PatchEngine;

    #[test]
    fn patch_history_survives_json_column() {
        let engine = PatchEngine::default();
        let mut text = Text::new("Charter".into(), "Founding charter".into()).unwrap();
        text.append_patch(&engine, engine.diff("", "Hello world.")).unwrap();
        text.append_patch(&engine, engine.diff("Hello world.", "Hello earth.")).unwrap();

        let json = patches_to_json(text.patches()).unwrap();
        let restored: Vec<Patch> = serde_json::from_value(json).unwrap();
        assert_eq!(restored.as_slice(), text.patches());
    }
}
