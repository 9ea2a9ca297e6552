//! PostgreSQL implementation of AmendRepository.
//!
//! Amendments live in the `amends` table; the patch and the votes are
//! JSONB columns.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row};
use std::collections::BTreeMap;

use super::db_error;
use crate::domain::amend::{Amend, AmendStatus, Vote};
use crate::domain::foundation::{AmendId, DomainError, ErrorCode, TextId, Timestamp, UserId};
use crate::domain::patch::Patch;
use crate::ports::{stale_changeset, AmendRepository};

const SELECT_AMEND: &str = r#"
    SELECT id, text_id, author, name, description, patch, status, version, votes,
           total_potential_votes_count, finished_at, created_at
    FROM amends
"#;

/// PostgreSQL implementation of AmendRepository.
#[derive(Clone)]
pub struct PostgresAmendRepository {
    pool: PgPool,
}

impl PostgresAmendRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, clause: &str, text_id: &TextId) -> Result<Vec<Amend>, DomainError> {
        let rows = sqlx::query(&format!(
            "{} WHERE {} ORDER BY created_at, id",
            SELECT_AMEND, clause
        ))
        .bind(text_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch amends by text"))?;

        rows.into_iter().map(row_to_amend).collect()
    }
}

#[async_trait]
impl AmendRepository for PostgresAmendRepository {
    async fn save(&self, amend: &Amend) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO amends (
                id, text_id, author, name, description, patch, status, version, votes,
                total_potential_votes_count, finished_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(amend.id().as_uuid())
        .bind(amend.text_id().as_uuid())
        .bind(amend.author().as_str())
        .bind(amend.name())
        .bind(amend.description())
        .bind(to_json(amend.patch(), "patch")?)
        .bind(amend.status().as_str())
        .bind(amend.version() as i32)
        .bind(to_json(amend.votes(), "votes")?)
        .bind(amend.total_potential_votes_count().map(|c| c as i32))
        .bind(amend.finished_at().map(|t| *t.as_datetime()))
        .bind(amend.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to insert amend"))?;

        Ok(())
    }

    async fn update(&self, amend: &Amend) -> Result<(), DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("Failed to acquire connection"))?;
        update_amend(&mut conn, amend).await
    }

    async fn find_by_id(&self, id: &AmendId) -> Result<Option<Amend>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_AMEND))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch amend"))?;

        row.map(row_to_amend).transpose()
    }

    async fn find_open_by_text(&self, text_id: &TextId) -> Result<Vec<Amend>, DomainError> {
        self.fetch_where("text_id = $1 AND status = 'open'", text_id)
            .await
    }

    async fn find_by_text(&self, text_id: &TextId) -> Result<Vec<Amend>, DomainError> {
        self.fetch_where("text_id = $1", text_id).await
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

const UPDATE_AMEND: &str = r#"
    UPDATE amends SET
        status = $2,
        version = $3,
        votes = $4,
        total_potential_votes_count = $5,
        finished_at = $6
    WHERE id = $1
"#;

/// Writes an amendment's mutable columns on an open connection or transaction.
pub(super) async fn update_amend(conn: &mut PgConnection, amend: &Amend) -> Result<(), DomainError> {
    if write_amend(conn, UPDATE_AMEND, amend).await? == 0 {
        return Err(not_found(amend));
    }
    Ok(())
}

/// Like [`update_amend`], but only while the stored row is still open.
pub(super) async fn update_open_amend(
    conn: &mut PgConnection,
    amend: &Amend,
) -> Result<(), DomainError> {
    if write_amend(conn, &update_open_sql(), amend).await? > 0 {
        return Ok(());
    }

    let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM amends WHERE id = $1")
        .bind(amend.id().as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to check amend"))?;
    match exists {
        Some(_) => Err(stale_changeset(format!("Amend {}", amend.id()))),
        None => Err(not_found(amend)),
    }
}

fn update_open_sql() -> String {
    format!("{} AND status = 'open'", UPDATE_AMEND.trim_end())
}

async fn write_amend(conn: &mut PgConnection, sql: &str, amend: &Amend) -> Result<u64, DomainError> {
    let result = sqlx::query(sql)
        .bind(amend.id().as_uuid())
        .bind(amend.status().as_str())
        .bind(amend.version() as i32)
        .bind(to_json(amend.votes(), "votes")?)
        .bind(amend.total_potential_votes_count().map(|c| c as i32))
        .bind(amend.finished_at().map(|t| *t.as_datetime()))
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to update amend"))?;

    Ok(result.rows_affected())
}

fn not_found(amend: &Amend) -> DomainError {
    DomainError::new(
        ErrorCode::AmendNotFound,
        format!("Amend not found: {}", amend.id()),
    )
}

fn to_json<T: serde::Serialize>(value: &T, column: &str) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value).map_err(|e| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("Failed to serialize {}: {}", column, e),
        )
    })
}

fn corrupt(column: &str) -> impl Fn(String) -> DomainError + '_ {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", column, e))
}

fn row_to_amend(row: sqlx::postgres::PgRow) -> Result<Amend, DomainError> {
    let id: uuid::Uuid = row.try_get("id").map_err(db_error("Failed to get id"))?;
    let text_id: uuid::Uuid = row.try_get("text_id").map_err(db_error("Failed to get text_id"))?;
    let author: String = row.try_get("author").map_err(db_error("Failed to get author"))?;
    let name: String = row.try_get("name").map_err(db_error("Failed to get name"))?;
    let description: String = row
        .try_get("description")
        .map_err(db_error("Failed to get description"))?;
    let patch: serde_json::Value = row.try_get("patch").map_err(db_error("Failed to get patch"))?;
    let status: String = row.try_get("status").map_err(db_error("Failed to get status"))?;
    let version: i32 = row.try_get("version").map_err(db_error("Failed to get version"))?;
    let votes: serde_json::Value = row.try_get("votes").map_err(db_error("Failed to get votes"))?;
    let potential: Option<i32> = row
        .try_get("total_potential_votes_count")
        .map_err(db_error("Failed to get total_potential_votes_count"))?;
    let finished_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("finished_at")
        .map_err(db_error("Failed to get finished_at"))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(db_error("Failed to get created_at"))?;

    let patch: Patch = serde_json::from_value(patch).map_err(|e| corrupt("patch")(e.to_string()))?;
    let votes: BTreeMap<UserId, Vote> =
        serde_json::from_value(votes).map_err(|e| corrupt("votes")(e.to_string()))?;
    let status: AmendStatus = status.parse().map_err(corrupt("status"))?;
    let author = UserId::new(author).map_err(|e| corrupt("author")(e.to_string()))?;

    Ok(Amend::reconstitute(
        AmendId::from_uuid(id),
        TextId::from_uuid(text_id),
        author,
        name,
        description,
        patch,
        status,
        version as u32,
        votes,
        potential.map(|c| c as u32),
        finished_at.map(Timestamp::from_datetime),
        Timestamp::from_datetime(created_at),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_serialize_as_user_keyed_object() {
        let mut votes = BTreeMap::new();
        votes.insert(UserId::new("alice").unwrap(), Vote::Up);
        votes.insert(UserId::new("bob").unwrap(), Vote::Indifferent);

        let json = to_json(&votes, "votes").unwrap();
        assert_eq!(json, serde_json::json!({"alice": "up", "bob": "indifferent"}));

        let restored: BTreeMap<UserId, Vote> = serde_json::from_value(json).unwrap();
        assert_eq!(restored, votes);
    }

    #[test]
    fn open_only_update_guards_on_status() {
        let sql = update_open_sql();
        assert!(sql.trim_start().starts_with("UPDATE amends SET"));
        assert!(sql.ends_with("WHERE id = $1 AND status = 'open'"));
    }

    #[test]
    fn unknown_status_is_reported_as_corruption() {
        let err = "merged".parse::<AmendStatus>().map_err(corrupt("status")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.contains("status"));
    }
}
