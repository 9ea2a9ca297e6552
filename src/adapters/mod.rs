//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `events` - In-process event bus
//! - `feed` - Activity feed projection fed by the bus
//! - `memory` - In-memory storage for tests and development
//! - `postgres` - PostgreSQL storage (sqlx)

pub mod events;
pub mod feed;
pub mod memory;
pub mod postgres;

pub use events::InMemoryEventBus;
pub use feed::{ActivityFeed, FeedCursor, FeedEntry, FeedKind, FeedPage};
pub use memory::InMemoryStore;
pub use postgres::{PostgresAmendRepository, PostgresResolutionStore, PostgresTextRepository};
