//! GetTextHandler / ListTextsHandler - Query handlers for texts.

use std::sync::Arc;

use crate::domain::foundation::TextId;
use crate::domain::text::{Text, TextError};
use crate::ports::TextRepository;

/// Query to get a text by ID.
#[derive(Debug, Clone)]
pub struct GetTextQuery {
    pub text_id: TextId,
}

/// Handler for retrieving a text.
pub struct GetTextHandler {
    repository: Arc<dyn TextRepository>,
}

impl GetTextHandler {
    pub fn new(repository: Arc<dyn TextRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetTextQuery) -> Result<Text, TextError> {
        self.repository
            .find_by_id(&query.text_id)
            .await?
            .ok_or_else(|| TextError::not_found(query.text_id))
    }
}

/// Handler for listing text IDs, oldest first.
pub struct ListTextsHandler {
    repository: Arc<dyn TextRepository>,
}

impl ListTextsHandler {
    pub fn new(repository: Arc<dyn TextRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self) -> Result<Vec<TextId>, TextError> {
        Ok(self.repository.list_ids().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStore;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use async_trait::async_trait;

    struct BrokenRepository;

    #[async_trait]
    impl TextRepository for BrokenRepository {
        async fn save(&self, _text: &Text) -> Result<(), DomainError> {
            Err(DomainError::database("down"))
        }
        async fn update(&self, _text: &Text) -> Result<(), DomainError> {
            Err(DomainError::database("down"))
        }
        async fn find_by_id(&self, _id: &TextId) -> Result<Option<Text>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn list_ids(&self) -> Result<Vec<TextId>, DomainError> {
            Err(DomainError::database("down"))
        }
    }

    #[tokio::test]
    async fn returns_stored_text() {
        let store = Arc::new(InMemoryStore::new());
        let text = Text::new("Charter".into(), "Founding charter".into()).unwrap();
        store.save(&text).await.unwrap();

        let handler = GetTextHandler::new(store);
        let found = handler.handle(GetTextQuery { text_id: *text.id() }).await.unwrap();
        assert_eq!(found, text);
    }

    #[tokio::test]
    async fn missing_text_is_not_found() {
        let handler = GetTextHandler::new(Arc::new(InMemoryStore::new()));
        let id = TextId::new();
        let err = handler.handle(GetTextQuery { text_id: id }).await.unwrap_err();
        assert_eq!(err, TextError::NotFound(id));
    }

    #[tokio::test]
    async fn list_surfaces_storage_errors() {
        let handler = ListTextsHandler::new(Arc::new(BrokenRepository));
        let err = handler.handle().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[tokio::test]
    async fn list_returns_every_text() {
        let store = Arc::new(InMemoryStore::new());
        for name in ["One", "Two"] {
            let text = Text::new(name.into(), "d".into()).unwrap();
            store.save(&text).await.unwrap();
        }

        let ids = ListTextsHandler::new(store).handle().await.unwrap();
        assert_eq!(ids.len(), 2);
    }
}
