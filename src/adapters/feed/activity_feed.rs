//! ActivityFeed - Event handler projecting public activity into a feed.
//!
//! Subscribes to text creation, amendment proposals and amendment results,
//! and serves them newest first in pages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, EventId, Timestamp};
use crate::ports::EventHandler;

/// Largest page the feed serves.
pub const MAX_PAGE_SIZE: usize = 100;

/// Entries kept by [`ActivityFeed::new`].
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Kind of activity in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    TextCreated,
    AmendProposed,
    AmendResult,
}

impl FeedKind {
    fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "text.created.v1" => Some(FeedKind::TextCreated),
            "amend.proposed.v1" => Some(FeedKind::AmendProposed),
            "amend.result.v1" => Some(FeedKind::AmendResult),
            _ => None,
        }
    }
}

/// One feed item, pointing at the text or amendment it is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub event_id: EventId,
    pub kind: FeedKind,
    pub target_id: String,
    pub created_at: Timestamp,
    /// Arrival order; breaks ties between entries stamped at the same time.
    pub sequence: u64,
}

impl FeedEntry {
    fn position(&self) -> FeedCursor {
        FeedCursor {
            created_at: self.created_at,
            sequence: self.sequence,
        }
    }
}

/// Position in the feed. A page holds entries strictly before its cursor.
///
/// All results of one resolution share a timestamp, so the arrival sequence
/// is part of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeedCursor {
    pub created_at: Timestamp,
    pub sequence: u64,
}

/// A page of the feed, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    pub entries: Vec<FeedEntry>,
    pub has_next_page: bool,
}

impl FeedPage {
    /// Cursor for the next page: the position of the oldest entry.
    pub fn next_cursor(&self) -> Option<FeedCursor> {
        if self.has_next_page {
            self.entries.last().map(FeedEntry::position)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct FeedState {
    entries: VecDeque<FeedEntry>,
    seen: HashSet<EventId>,
    next_sequence: u64,
}

/// In-process activity feed read model.
///
/// Keeps the `capacity` most recently received entries; older ones are
/// evicted together with their dedup ids, so a very late redelivery of an
/// evicted event shows up again.
///
/// # Example
///
/// ```ignore
/// let feed = Arc::new(ActivityFeed::new());
/// event_bus.subscribe_all(ActivityFeed::EVENT_TYPES, feed.clone());
///
/// let page = feed.page(20, None).await;
/// ```
#[derive(Debug)]
pub struct ActivityFeed {
    state: RwLock<FeedState>,
    capacity: usize,
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityFeed {
    /// Event types the feed projects.
    pub const EVENT_TYPES: &'static [&'static str] =
        &["text.created.v1", "amend.proposed.v1", "amend.result.v1"];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(FeedState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns up to `limit` entries strictly before `before`, newest first.
    pub async fn page(&self, limit: usize, before: Option<FeedCursor>) -> FeedPage {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let state = self.state.read().await;

        let mut matching: Vec<&FeedEntry> = state
            .entries
            .iter()
            .filter(|e| before.map_or(true, |cursor| e.position() < cursor))
            .collect();
        matching.sort_by(|a, b| b.position().cmp(&a.position()));

        FeedPage {
            has_next_page: matching.len() > limit,
            entries: matching.into_iter().take(limit).cloned().collect(),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EventHandler for ActivityFeed {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let kind = FeedKind::from_event_type(&event.event_type).ok_or_else(|| {
            DomainError::new(
                ErrorCode::InvalidFormat,
                format!("ActivityFeed cannot project {}", event.event_type),
            )
        })?;

        let mut state = self.state.write().await;
        if !state.seen.insert(event.event_id.clone()) {
            tracing::debug!(event_id = %event.event_id, "duplicate feed event skipped");
            return Ok(());
        }
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.entries.push_back(FeedEntry {
            event_id: event.event_id,
            kind,
            target_id: event.aggregate_id,
            created_at: event.occurred_at,
            sequence,
        });

        while state.entries.len() > self.capacity {
            if let Some(evicted) = state.entries.pop_front() {
                state.seen.remove(&evicted.event_id);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ActivityFeed"
    }
}
