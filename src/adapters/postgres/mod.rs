//! PostgreSQL adapters.
//!
//! Tables are assumed to exist:
//!
//! - `texts (id UUID PK, name, description, body TEXT, patches JSONB,
//!   followers TEXT[], created_at, updated_at TIMESTAMPTZ)`
//! - `amends (id UUID PK, text_id UUID FK, author, name, description,
//!   patch JSONB, status TEXT, version INT, votes JSONB,
//!   total_potential_votes_count INT NULL, finished_at TIMESTAMPTZ NULL,
//!   created_at TIMESTAMPTZ)`

mod amend_repository;
mod resolution_store;
mod text_repository;

pub use amend_repository::PostgresAmendRepository;
pub use resolution_store::PostgresResolutionStore;
pub use text_repository::PostgresTextRepository;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Maps a sqlx error to a `DatabaseError` with context.
fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}
