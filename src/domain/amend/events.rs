//! Amend domain events.
//!
//! - `AmendProposed` - New amendment opened against a text
//! - `AmendVoteCast` - A participant voted
//! - `AmendRebased` - An open amendment still applies on a newer text version
//! - `AmendResult` - An amendment was closed

use serde::{Deserialize, Serialize};

use super::{Amend, AmendStatus, Vote, VoteTally};
use crate::domain::foundation::{domain_event, AmendId, EventId, TextId, Timestamp, UserId};

// ════════════════════════════════════════════════════════════════════════════
// AmendProposed
// ════════════════════════════════════════════════════════════════════════════

/// Published when an amendment is proposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendProposed {
    pub event_id: EventId,
    pub amend_id: AmendId,
    pub text_id: TextId,
    pub author: UserId,
    pub name: String,
    /// Text version the amendment was computed against.
    pub version: u32,
    pub proposed_at: Timestamp,
}

domain_event!(
    AmendProposed,
    event_type = "amend.proposed.v1",
    schema_version = 1,
    aggregate_id = amend_id,
    aggregate_type = "Amend",
    occurred_at = proposed_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// AmendVoteCast
// ════════════════════════════════════════════════════════════════════════════

/// Published when a vote is recorded; carries the tally after the vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendVoteCast {
    pub event_id: EventId,
    pub amend_id: AmendId,
    pub text_id: TextId,
    pub voter: UserId,
    pub vote: Vote,
    /// The voter's earlier vote, if this one replaced it.
    pub replaced: Option<Vote>,
    pub tally: VoteTally,
    pub voted_at: Timestamp,
}

domain_event!(
    AmendVoteCast,
    event_type = "amend.voted.v1",
    schema_version = 1,
    aggregate_id = amend_id,
    aggregate_type = "Amend",
    occurred_at = voted_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// AmendRebased
// ════════════════════════════════════════════════════════════════════════════

/// Published when an open amendment survives another amendment's acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendRebased {
    pub event_id: EventId,
    pub amend_id: AmendId,
    pub text_id: TextId,
    pub from_version: u32,
    pub to_version: u32,
    pub rebased_at: Timestamp,
}

domain_event!(
    AmendRebased,
    event_type = "amend.rebased.v1",
    schema_version = 1,
    aggregate_id = amend_id,
    aggregate_type = "Amend",
    occurred_at = rebased_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// AmendResult
// ════════════════════════════════════════════════════════════════════════════

/// Published when an amendment is closed.
///
/// `forced` is set when the amendment was closed as a side effect of another
/// amendment's acceptance rather than by its own resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendResult {
    pub event_id: EventId,
    pub amend_id: AmendId,
    pub text_id: TextId,
    pub outcome: AmendStatus,
    pub forced: bool,
    pub version: u32,
    pub tally: VoteTally,
    pub total_potential_votes_count: Option<u32>,
    pub finished_at: Timestamp,
}

domain_event!(
    AmendResult,
    event_type = "amend.result.v1",
    schema_version = 1,
    aggregate_id = amend_id,
    aggregate_type = "Amend",
    occurred_at = finished_at,
    event_id = event_id
);

impl AmendResult {
    /// Builds the result event of a closed amendment.
    pub fn of(amend: &Amend, forced: bool) -> Self {
        Self {
            event_id: EventId::new(),
            amend_id: *amend.id(),
            text_id: *amend.text_id(),
            outcome: amend.status(),
            forced,
            version: amend.version(),
            tally: amend.tally(),
            total_potential_votes_count: amend.total_potential_votes_count(),
            finished_at: amend.finished_at().copied().unwrap_or_else(Timestamp::now),
        }
    }
}
