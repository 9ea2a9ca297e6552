//! CastVoteHandler - Command handler recording a vote on an amendment.

use std::sync::Arc;

use crate::application::TextLocks;
use crate::domain::amend::{Amend, AmendError, AmendVoteCast, Vote};
use crate::domain::foundation::{
    AmendId, CommandMetadata, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{AmendRepository, EventPublisher};

/// Command to vote on an amendment.
#[derive(Debug, Clone)]
pub struct CastVoteCommand {
    pub amend_id: AmendId,
    pub voter: UserId,
    pub vote: Vote,
}

/// Result of a recorded vote.
#[derive(Debug, Clone)]
pub struct CastVoteResult {
    pub amend: Amend,
    pub event: AmendVoteCast,
}

/// Handler for casting votes.
pub struct CastVoteHandler {
    amends: Arc<dyn AmendRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    locks: Arc<TextLocks>,
}

impl CastVoteHandler {
    pub fn new(
        amends: Arc<dyn AmendRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        locks: Arc<TextLocks>,
    ) -> Self {
        Self {
            amends,
            event_publisher,
            locks,
        }
    }

    pub async fn handle(
        &self,
        cmd: CastVoteCommand,
        metadata: CommandMetadata,
    ) -> Result<CastVoteResult, AmendError> {
        let text_id = *self.load(&cmd.amend_id).await?.text_id();
        let _guard = self.locks.lock(text_id).await;

        // a resolution may have closed it while we waited
        let mut amend = self.load(&cmd.amend_id).await?;
        let replaced = amend.cast_vote(cmd.voter.clone(), cmd.vote)?;
        self.amends.update(&amend).await?;

        let event = AmendVoteCast {
            event_id: EventId::new(),
            amend_id: cmd.amend_id,
            text_id,
            voter: cmd.voter,
            vote: cmd.vote,
            replaced,
            tally: amend.tally(),
            voted_at: Timestamp::now(),
        };
        self.event_publisher
            .publish(metadata.stamp(event.to_envelope()))
            .await?;

        tracing::debug!(
            amend_id = %cmd.amend_id,
            vote = cmd.vote.as_str(),
            revote = replaced.is_some(),
            "vote cast"
        );

        Ok(CastVoteResult { amend, event })
    }

    async fn load(&self, amend_id: &AmendId) -> Result<Amend, AmendError> {
        self.amends
            .find_by_id(amend_id)
            .await?
            .ok_or(AmendError::NotFound(*amend_id))
    }
}
