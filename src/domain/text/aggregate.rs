//! Text aggregate entity.
//!
//! A text is a living document. Its body only ever changes by appending an
//! accepted patch, so the body is always reproducible by replaying the
//! patch history from the empty string.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, TextId, Timestamp, UserId, ValidationError};
use crate::domain::patch::{Patch, PatchConflict, PatchEngine};

/// Maximum length for a text name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length for a text description.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Text aggregate - a shared document amended by accepted patches.
///
/// # Invariants
///
/// - `body` equals the fold of `patches` over the empty string
/// - `version()` is the number of applied patches
/// - `followers` contains no duplicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    id: TextId,
    name: String,
    description: String,
    body: String,
    /// Accepted patches, in application order.
    patches: Vec<Patch>,
    followers: BTreeSet<UserId>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Text {
    /// Creates a new, empty text.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if name or description is blank
    /// - `ValidationFailed` if either is too long
    pub fn new(name: String, description: String) -> Result<Self, DomainError> {
        validate_field("name", &name, MAX_NAME_LENGTH)?;
        validate_field("description", &description, MAX_DESCRIPTION_LENGTH)?;

        let now = Timestamp::now();
        Ok(Self {
            id: TextId::new(),
            name,
            description,
            body: String::new(),
            patches: Vec::new(),
            followers: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitutes a text from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TextId,
        name: String,
        description: String,
        body: String,
        patches: Vec<Patch>,
        followers: BTreeSet<UserId>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            description,
            body,
            patches,
            followers,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &TextId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the current body.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Number of patches applied so far.
    pub fn version(&self) -> u32 {
        self.patches.len() as u32
    }

    pub fn followers(&self) -> &BTreeSet<UserId> {
        &self.followers
    }

    pub fn followers_count(&self) -> u32 {
        self.followers.len() as u32
    }

    pub fn is_followed_by(&self, user_id: &UserId) -> bool {
        self.followers.contains(user_id)
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies `patch` to the current body and appends it to the history.
    ///
    /// On conflict the text is left untouched.
    pub fn append_patch(
        &mut self,
        engine: &PatchEngine,
        patch: Patch,
    ) -> Result<&str, PatchConflict> {
        let body = engine.apply(&self.body, &patch)?;
        self.body = body;
        self.patches.push(patch);
        self.updated_at = Timestamp::now();
        Ok(&self.body)
    }

    /// Adds a follower.
    ///
    /// # Errors
    ///
    /// - `AlreadyFollowing` if the user already follows this text
    pub fn follow(&mut self, user_id: UserId) -> Result<(), DomainError> {
        if !self.followers.insert(user_id) {
            return Err(DomainError::new(
                ErrorCode::AlreadyFollowing,
                "User already follows this text",
            ));
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Removes a follower.
    ///
    /// # Errors
    ///
    /// - `NotFollowing` if the user does not follow this text
    pub fn unfollow(&mut self, user_id: &UserId) -> Result<(), DomainError> {
        if !self.followers.remove(user_id) {
            return Err(DomainError::new(
                ErrorCode::NotFollowing,
                "User does not follow this text",
            ));
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Rebuilds the body from the patch history.
    pub fn replay(&self, engine: &PatchEngine) -> Result<String, PatchConflict> {
        self.patches
            .iter()
            .try_fold(String::new(), |body, patch| engine.apply(&body, patch))
    }
}

/// Validates a required, length-bounded label.
pub(crate) fn validate_field(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::too_long(field, max, len));
    }
    Ok(())
}
