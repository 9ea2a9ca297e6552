//! Text repository port.
//!
//! Defines the contract for persisting and retrieving Text aggregates.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TextId};
use crate::domain::text::Text;

/// Repository port for Text aggregate persistence.
#[async_trait]
pub trait TextRepository: Send + Sync {
    /// Save a new text.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, text: &Text) -> Result<(), DomainError>;

    /// Update an existing text (followers, body and patch history).
    ///
    /// # Errors
    ///
    /// - `TextNotFound` if the text doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, text: &Text) -> Result<(), DomainError>;

    /// Find a text by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &TextId) -> Result<Option<Text>, DomainError>;

    /// IDs of all texts, oldest first.
    async fn list_ids(&self) -> Result<Vec<TextId>, DomainError>;
}
