//! CreateTextHandler - Command handler for creating texts.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, EventId, SerializableDomainEvent};
use crate::domain::text::{Text, TextCreated, TextError};
use crate::ports::{EventPublisher, TextRepository};

/// Command to create a new, empty text.
#[derive(Debug, Clone)]
pub struct CreateTextCommand {
    pub name: String,
    pub description: String,
}

/// Result of successful text creation.
#[derive(Debug, Clone)]
pub struct CreateTextResult {
    pub text: Text,
    pub event: TextCreated,
}

/// Handler for creating texts.
pub struct CreateTextHandler {
    repository: Arc<dyn TextRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateTextHandler {
    pub fn new(
        repository: Arc<dyn TextRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateTextCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateTextResult, TextError> {
        let text = Text::new(cmd.name, cmd.description)?;

        self.repository.save(&text).await?;

        let event = TextCreated {
            event_id: EventId::new(),
            text_id: *text.id(),
            created_by: metadata.user_id.clone(),
            name: text.name().to_string(),
            description: text.description().to_string(),
            created_at: *text.created_at(),
        };
        self.event_publisher
            .publish(metadata.stamp(event.to_envelope()))
            .await?;

        tracing::info!(text_id = %text.id(), "text created");
        Ok(CreateTextResult { text, event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryEventBus, InMemoryStore};

    fn handler() -> (CreateTextHandler, Arc<InMemoryStore>, Arc<InMemoryEventBus>) {
        let store = Arc::new(InMemoryStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        (CreateTextHandler::new(store.clone(), bus.clone()), store, bus)
    }

    fn command(name: &str) -> CreateTextCommand {
        CreateTextCommand {
            name: name.to_string(),
            description: "Founding charter".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_empty_text() {
        let (handler, store, _) = handler();

        let result = handler
            .handle(command("Charter"), CommandMetadata::test_fixture())
            .await
            .unwrap();

        assert_eq!(result.text.version(), 0);
        assert_eq!(result.text.body(), "");
        let stored = store.find_by_id(result.text.id()).await.unwrap();
        assert_eq!(stored, Some(result.text));
    }

    #[tokio::test]
    async fn publishes_stamped_event() {
        let (handler, _, bus) = handler();

        handler
            .handle(command("Charter"), CommandMetadata::test_fixture())
            .await
            .unwrap();

        let events = bus.events_of_type("text.created.v1");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].metadata.correlation_id.as_deref(),
            Some("test-correlation-id")
        );
        assert_eq!(events[0].metadata.user_id.as_deref(), Some("test-user-123"));
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let (handler, store, bus) = handler();

        let err = handler
            .handle(command(" "), CommandMetadata::test_fixture())
            .await
            .unwrap_err();

        assert!(matches!(err, TextError::ValidationFailed { ref field, .. } if field == "name"));
        assert_eq!(store.write_count(), 0);
        assert_eq!(bus.event_count(), 0);
    }
}
