//! Read-model adapters fed by domain events.

mod activity_feed;

pub use activity_feed::{
    ActivityFeed, FeedCursor, FeedEntry, FeedKind, FeedPage, DEFAULT_CAPACITY, MAX_PAGE_SIZE,
};
