//! Amend repository port.
//!
//! Defines the contract for persisting and retrieving Amend aggregates.

use async_trait::async_trait;

use crate::domain::amend::Amend;
use crate::domain::foundation::{AmendId, DomainError, TextId};

/// Repository port for Amend aggregate persistence.
#[async_trait]
pub trait AmendRepository: Send + Sync {
    /// Save a new amendment.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, amend: &Amend) -> Result<(), DomainError>;

    /// Update an existing amendment (votes, status, version).
    ///
    /// # Errors
    ///
    /// - `AmendNotFound` if the amendment doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, amend: &Amend) -> Result<(), DomainError>;

    /// Find an amendment by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &AmendId) -> Result<Option<Amend>, DomainError>;

    /// Open amendments of a text, in creation order (ties broken by id).
    async fn find_open_by_text(&self, text_id: &TextId) -> Result<Vec<Amend>, DomainError>;

    /// Every amendment of a text, in creation order.
    async fn find_by_text(&self, text_id: &TextId) -> Result<Vec<Amend>, DomainError>;
}
