//! Amend aggregate entity.
//!
//! An amendment proposes a patch to a text. It stays open while people vote
//! on it and is closed exactly once: accepted, conflicted or refused.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AmendStatus, Vote, VoteTally};
use crate::domain::foundation::{AmendId, DomainError, ErrorCode, TextId, Timestamp, UserId};
use crate::domain::patch::Patch;
use crate::domain::text::{validate_field, Text};

/// Maximum length for an amendment name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length for an amendment description.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Amend aggregate - a proposed patch to a text.
///
/// # Invariants
///
/// - `version` never exceeds the owning text's version
/// - once closed, status, votes and version are frozen
/// - `finished_at` is set if and only if the amendment is closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amend {
    id: AmendId,
    text_id: TextId,
    author: UserId,
    name: String,
    description: String,
    patch: Patch,
    status: AmendStatus,
    /// Text version the patch was last known to apply on.
    version: u32,
    votes: BTreeMap<UserId, Vote>,
    /// Followers of the text when the amendment was closed, if snapshotted.
    total_potential_votes_count: Option<u32>,
    finished_at: Option<Timestamp>,
    created_at: Timestamp,
}

impl Amend {
    /// Proposes a new amendment against the current version of `text`.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the name is blank
    /// - `ValidationFailed` if name or description is too long
    /// - `EmptyAmendment` if the patch changes nothing
    pub fn propose(
        text: &Text,
        author: UserId,
        name: String,
        description: String,
        patch: Patch,
    ) -> Result<Self, DomainError> {
        validate_field("name", &name, MAX_NAME_LENGTH)?;
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(DomainError::validation(
                "description",
                format!("at most {} characters", MAX_DESCRIPTION_LENGTH),
            ));
        }
        if patch.is_empty() {
            return Err(DomainError::new(
                ErrorCode::EmptyAmendment,
                "Amendment does not change the text",
            ));
        }

        Ok(Self {
            id: AmendId::new(),
            text_id: *text.id(),
            author,
            name,
            description,
            patch,
            status: AmendStatus::Open,
            version: text.version(),
            votes: BTreeMap::new(),
            total_potential_votes_count: None,
            finished_at: None,
            created_at: Timestamp::now(),
        })
    }

    /// Reconstitutes an amendment from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: AmendId,
        text_id: TextId,
        author: UserId,
        name: String,
        description: String,
        patch: Patch,
        status: AmendStatus,
        version: u32,
        votes: BTreeMap<UserId, Vote>,
        total_potential_votes_count: Option<u32>,
        finished_at: Option<Timestamp>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            text_id,
            author,
            name,
            description,
            patch,
            status,
            version,
            votes,
            total_potential_votes_count,
            finished_at,
            created_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &AmendId {
        &self.id
    }

    pub fn text_id(&self) -> &TextId {
        &self.text_id
    }

    pub fn author(&self) -> &UserId {
        &self.author
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    pub fn status(&self) -> AmendStatus {
        self.status
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn votes(&self) -> &BTreeMap<UserId, Vote> {
        &self.votes
    }

    pub fn vote_of(&self, user_id: &UserId) -> Option<Vote> {
        self.votes.get(user_id).copied()
    }

    pub fn tally(&self) -> VoteTally {
        self.votes.values().collect()
    }

    pub fn total_potential_votes_count(&self) -> Option<u32> {
        self.total_potential_votes_count
    }

    pub fn finished_at(&self) -> Option<&Timestamp> {
        self.finished_at.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    pub fn is_accepted(&self) -> bool {
        self.status == AmendStatus::Accepted
    }

    pub fn is_conflicted(&self) -> bool {
        self.status == AmendStatus::Conflicted
    }

    pub fn is_refused(&self) -> bool {
        self.status == AmendStatus::Refused
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Records `voter`'s vote, replacing any earlier one.
    ///
    /// Returns the replaced vote, if any.
    ///
    /// # Errors
    ///
    /// - `AmendClosed` if the amendment is closed
    pub fn cast_vote(&mut self, voter: UserId, vote: Vote) -> Result<Option<Vote>, DomainError> {
        self.ensure_open()?;
        Ok(self.votes.insert(voter, vote))
    }

    /// Closes the amendment as accepted; its patch became text version
    /// `version + 1`, so `version` is the version it applied on.
    pub fn accept(&mut self, version: u32, now: Timestamp) -> Result<(), DomainError> {
        self.close(AmendStatus::Accepted, now)?;
        self.version = version;
        Ok(())
    }

    /// Closes the amendment as conflicted. The version stays at the last
    /// text version the patch applied on.
    pub fn conflict(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.close(AmendStatus::Conflicted, now)
    }

    /// Closes the amendment as refused by vote.
    pub fn refuse(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.close(AmendStatus::Refused, now)
    }

    /// Records that the patch still applies on text `version`.
    ///
    /// # Errors
    ///
    /// - `AmendClosed` if the amendment is closed
    pub fn rebase(&mut self, version: u32) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.version = version;
        Ok(())
    }

    /// Snapshots how many people could have voted when voting ended.
    pub fn record_potential_votes(&mut self, count: u32) {
        self.total_potential_votes_count = Some(count);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.is_closed() {
            return Err(DomainError::new(
                ErrorCode::AmendClosed,
                format!("Amend is already {}", self.status),
            )
            .with_detail("amend_id", self.id.to_string()));
        }
        Ok(())
    }

    fn close(&mut self, target: AmendStatus, now: Timestamp) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.status = self.status.transition_to(target)?;
        self.finished_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patch::PatchEngine;

    fn text_with_body(body: &str) -> Text {
        let engine = PatchEngine::default();
        let mut text = Text::new("Charter".into(), "Founding charter".into()).unwrap();
        text.append_patch(&engine, engine.diff("", body)).unwrap();
        text
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn amend() -> Amend {
        let text = text_with_body("Hello world.");
        let patch = PatchEngine::default().diff(text.body(), "Hello earth.");
        Amend::propose(&text, user("author"), "Earth".into(), String::new(), patch).unwrap()
    }

    #[test]
    fn propose_records_current_text_version() {
        let amend = amend();
        assert_eq!(amend.version(), 1);
        assert_eq!(amend.status(), AmendStatus::Open);
        assert!(amend.finished_at().is_none());
        assert!(amend.total_potential_votes_count().is_none());
    }

    #[test]
    fn propose_rejects_empty_patch() {
        let text = text_with_body("Hello world.");
        let patch = PatchEngine::default().diff(text.body(), text.body());
        let err = Amend::propose(&text, user("a"), "Noop".into(), String::new(), patch).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyAmendment);
    }

    #[test]
    fn propose_rejects_blank_name() {
        let text = text_with_body("Hello world.");
        let patch = PatchEngine::default().diff(text.body(), "Hi.");
        let err = Amend::propose(&text, user("a"), "".into(), String::new(), patch).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyField);
    }

    #[test]
    fn revote_replaces_previous_vote() {
        let mut amend = amend();
        assert_eq!(amend.cast_vote(user("v"), Vote::Up).unwrap(), None);
        assert_eq!(amend.cast_vote(user("v"), Vote::Down).unwrap(), Some(Vote::Up));

        let tally = amend.tally();
        assert_eq!((tally.up, tally.down), (0, 1));
    }

    #[test]
    fn accept_closes_with_finish_time() {
        let mut amend = amend();
        let now = Timestamp::now();
        amend.accept(1, now).unwrap();

        assert!(amend.is_closed());
        assert!(amend.is_accepted());
        assert_eq!(amend.finished_at(), Some(&now));
    }

    #[test]
    fn closed_amend_rejects_everything() {
        let mut amend = amend();
        amend.conflict(Timestamp::now()).unwrap();

        assert_eq!(amend.cast_vote(user("v"), Vote::Up).unwrap_err().code, ErrorCode::AmendClosed);
        assert_eq!(amend.rebase(4).unwrap_err().code, ErrorCode::AmendClosed);
        assert_eq!(amend.accept(4, Timestamp::now()).unwrap_err().code, ErrorCode::AmendClosed);
        assert!(amend.is_conflicted());
        assert_eq!(amend.version(), 1);
    }

    #[test]
    fn refuse_keeps_version() {
        let mut amend = amend();
        amend.refuse(Timestamp::now()).unwrap();
        amend.record_potential_votes(3);

        assert!(amend.is_refused());
        assert_eq!(amend.version(), 1);
        assert_eq!(amend.total_potential_votes_count(), Some(3));
    }
}
