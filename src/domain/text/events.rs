//! Text domain events.
//!
//! - `TextCreated` - New text created
//! - `TextFollowersChanged` - A user followed or unfollowed a text
//! - `TextPatched` - An accepted amendment was applied to the body

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{domain_event, AmendId, EventId, TextId, Timestamp, UserId};

// ════════════════════════════════════════════════════════════════════════════
// TextCreated
// ════════════════════════════════════════════════════════════════════════════

/// Published when a new text is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextCreated {
    pub event_id: EventId,
    pub text_id: TextId,
    /// User who created the text.
    pub created_by: UserId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
}

domain_event!(
    TextCreated,
    event_type = "text.created.v1",
    schema_version = 1,
    aggregate_id = text_id,
    aggregate_type = "Text",
    occurred_at = created_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// TextFollowersChanged
// ════════════════════════════════════════════════════════════════════════════

/// Published when a user starts or stops following a text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFollowersChanged {
    pub event_id: EventId,
    pub text_id: TextId,
    pub user_id: UserId,
    /// True on follow, false on unfollow.
    pub following: bool,
    /// Follower count after the change.
    pub followers_count: u32,
    pub changed_at: Timestamp,
}

domain_event!(
    TextFollowersChanged,
    event_type = "text.followers_changed.v1",
    schema_version = 1,
    aggregate_id = text_id,
    aggregate_type = "Text",
    occurred_at = changed_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// TextPatched
// ════════════════════════════════════════════════════════════════════════════

/// Published when an accepted amendment has been applied to a text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPatched {
    pub event_id: EventId,
    pub text_id: TextId,
    /// Amendment whose patch was applied.
    pub amend_id: AmendId,
    /// Text version after the patch.
    pub version: u32,
    pub patched_at: Timestamp,
}

domain_event!(
    TextPatched,
    event_type = "text.patched.v1",
    schema_version = 1,
    aggregate_id = text_id,
    aggregate_type = "Text",
    occurred_at = patched_at,
    event_id = event_id
);
