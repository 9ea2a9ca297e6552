//! Text command and query handlers.

mod create_text;
mod follow_text;
mod get_text;

pub use create_text::{CreateTextCommand, CreateTextHandler, CreateTextResult};
pub use follow_text::{
    FollowTextCommand, FollowTextHandler, FollowersChangedResult, UnfollowTextCommand,
    UnfollowTextHandler,
};
pub use get_text::{GetTextHandler, GetTextQuery, ListTextsHandler};
