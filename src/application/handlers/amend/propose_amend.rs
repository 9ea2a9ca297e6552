//! ProposeAmendHandler - Command handler for proposing amendments.
//!
//! The author submits the whole body they want; the stored patch is its diff
//! against the text's current body.

use std::sync::Arc;

use crate::application::TextLocks;
use crate::domain::amend::{Amend, AmendError, AmendProposed};
use crate::domain::foundation::{CommandMetadata, EventId, SerializableDomainEvent, TextId, UserId};
use crate::domain::patch::PatchEngine;
use crate::ports::{AmendRepository, EventPublisher, TextRepository};

/// Command to propose an amendment.
#[derive(Debug, Clone)]
pub struct ProposeAmendCommand {
    pub text_id: TextId,
    pub author: UserId,
    pub name: String,
    pub description: String,
    /// Full body of the text as the author wants it.
    pub proposed_body: String,
}

/// Result of a successful proposal.
#[derive(Debug, Clone)]
pub struct ProposeAmendResult {
    pub amend: Amend,
    pub event: AmendProposed,
}

/// Handler for proposing amendments.
pub struct ProposeAmendHandler {
    texts: Arc<dyn TextRepository>,
    amends: Arc<dyn AmendRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    locks: Arc<TextLocks>,
    engine: PatchEngine,
}

impl ProposeAmendHandler {
    pub fn new(
        texts: Arc<dyn TextRepository>,
        amends: Arc<dyn AmendRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        locks: Arc<TextLocks>,
        engine: PatchEngine,
    ) -> Self {
        Self {
            texts,
            amends,
            event_publisher,
            locks,
            engine,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProposeAmendCommand,
        metadata: CommandMetadata,
    ) -> Result<ProposeAmendResult, AmendError> {
        // body and version must be read from the same text state
        let _guard = self.locks.lock(cmd.text_id).await;

        let text = self
            .texts
            .find_by_id(&cmd.text_id)
            .await?
            .ok_or(AmendError::TextNotFound(cmd.text_id))?;

        let limit = self.engine.config().max_body_chars;
        let length = cmd.proposed_body.chars().count();
        if length > limit {
            return Err(AmendError::ValidationFailed {
                field: "proposed_body".to_string(),
                message: format!("at most {} characters, got {}", limit, length),
            });
        }

        let patch = self.engine.diff(text.body(), &cmd.proposed_body);
        let amend = Amend::propose(&text, cmd.author, cmd.name, cmd.description, patch)?;
        self.amends.save(&amend).await?;

        let event = AmendProposed {
            event_id: EventId::new(),
            amend_id: *amend.id(),
            text_id: *amend.text_id(),
            author: amend.author().clone(),
            name: amend.name().to_string(),
            version: amend.version(),
            proposed_at: *amend.created_at(),
        };
        self.event_publisher
            .publish(metadata.stamp(event.to_envelope()))
            .await?;

        let (inserted, deleted) = amend.patch().change_counts();
        tracing::info!(
            amend_id = %amend.id(),
            text_id = %amend.text_id(),
            version = amend.version(),
            inserted,
            deleted,
            "amend proposed"
        );

        Ok(ProposeAmendResult { amend, event })
    }
}
