//! PostgreSQL implementation of ResolutionStore.
//!
//! One resolution is one transaction: the patched text and every changed
//! amendment are written, or the transaction is rolled back on drop.
//!
//! The text row is locked `FOR UPDATE` first, which serializes resolutions of
//! the same text across processes. The commit is then refused unless the
//! stored history is exactly one patch behind and every amendment written is
//! still open.

use async_trait::async_trait;
use sqlx::PgPool;

use super::amend_repository::update_open_amend;
use super::db_error;
use super::text_repository::{lock_text, write_patched};
use crate::domain::foundation::DomainError;
use crate::ports::{stale_changeset, ResolutionChangeset, ResolutionStore};

/// PostgreSQL implementation of ResolutionStore.
#[derive(Clone)]
pub struct PostgresResolutionStore {
    pool: PgPool,
}

impl PostgresResolutionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResolutionStore for PostgresResolutionStore {
    async fn commit(&self, changeset: ResolutionChangeset<'_>) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let text_id = changeset
            .text
            .map(|t| *t.id())
            .or_else(|| changeset.amends.first().map(|a| *a.text_id()));
        if let Some(text_id) = text_id {
            let stored_version = lock_text(&mut tx, &text_id).await?;
            if let Some(text) = changeset.text {
                if stored_version + 1 != text.version() {
                    return Err(stale_changeset(format!("Text {}", text_id)));
                }
                write_patched(&mut tx, text).await?;
            }
        }
        for amend in changeset.amends {
            update_open_amend(&mut tx, amend).await?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        tracing::debug!(
            amends = changeset.amends.len(),
            text_changed = changeset.text.is_some(),
            "resolution committed"
        );
        Ok(())
    }
}
