//! FinishVoteHandler - Command handler closing an amendment's vote.
//!
//! An approved tally resolves the amendment as an acceptance; anything
//! else refuses it. Either way the number of text followers at that moment
//! is recorded as the electorate.

use std::sync::Arc;

use serde::Serialize;

use super::resolve_acceptance::{ResolveAcceptanceError, ResolveAcceptanceHandler};
use crate::domain::amend::{AmendResult, VoteTally};
use crate::domain::foundation::{
    AmendId, CommandMetadata, EventEnvelope, SerializableDomainEvent, Timestamp,
};
use crate::domain::resolution::ResolutionReport;
use crate::ports::ResolutionChangeset;

/// Command to close voting on an amendment.
#[derive(Debug, Clone)]
pub struct FinishVoteCommand {
    pub amend_id: AmendId,
}

/// How a vote concluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// The tally did not approve the amendment.
    Refused,
    /// The tally approved it and an acceptance was resolved. The report
    /// still says whether the patch applied.
    Resolved(ResolutionReport),
}

/// Result of closing a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishVoteResult {
    pub amend_id: AmendId,
    pub tally: VoteTally,
    pub total_potential_votes_count: u32,
    pub outcome: VoteOutcome,
}

/// Handler for finishing votes.
pub struct FinishVoteHandler {
    resolver: Arc<ResolveAcceptanceHandler>,
}

impl FinishVoteHandler {
    pub fn new(resolver: Arc<ResolveAcceptanceHandler>) -> Self {
        Self { resolver }
    }

    pub async fn handle(
        &self,
        cmd: FinishVoteCommand,
        metadata: CommandMetadata,
    ) -> Result<FinishVoteResult, ResolveAcceptanceError> {
        let resolver = &self.resolver;
        let text_id = resolver.locate(&cmd.amend_id).await?;
        let _guard = resolver.locks().lock(text_id).await;

        let Concluded {
            tally,
            electorate,
            outcome,
            events,
        } = resolver.with_timeout(self.conclude(&cmd.amend_id)).await?;

        tracing::info!(
            amend_id = %cmd.amend_id,
            up = tally.up,
            down = tally.down,
            indifferent = tally.indifferent,
            electorate,
            refused = matches!(outcome, VoteOutcome::Refused),
            "vote finished"
        );

        resolver.publish(events, &metadata).await;
        Ok(FinishVoteResult {
            amend_id: cmd.amend_id,
            tally,
            total_potential_votes_count: electorate,
            outcome,
        })
    }

    /// Closes the vote. Call with the text lock held.
    async fn conclude(&self, amend_id: &AmendId) -> Result<Concluded, ResolveAcceptanceError> {
        let (text, mut amend) = self.resolver.load_open(amend_id).await?;
        let tally = amend.tally();
        let electorate = text.followers_count();

        if tally.is_approved() {
            let resolution = self
                .resolver
                .commit_acceptance(text, amend, Some(electorate))
                .await?;
            return Ok(Concluded {
                tally,
                electorate,
                outcome: VoteOutcome::Resolved(resolution.report),
                events: resolution.events,
            });
        }

        amend.refuse(Timestamp::now())?;
        amend.record_potential_votes(electorate);
        self.resolver
            .commit(ResolutionChangeset {
                text: None,
                amends: std::slice::from_ref(&amend),
            })
            .await?;
        Ok(Concluded {
            tally,
            electorate,
            outcome: VoteOutcome::Refused,
            events: vec![AmendResult::of(&amend, false).to_envelope()],
        })
    }
}

struct Concluded {
    tally: VoteTally,
    electorate: u32,
    outcome: VoteOutcome,
    events: Vec<EventEnvelope>,
}
