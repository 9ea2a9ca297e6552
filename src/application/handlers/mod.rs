//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod amend;
pub mod text;

pub use amend::{
    AmendView, CastVoteCommand, CastVoteHandler, CastVoteResult, FinishVoteCommand,
    FinishVoteHandler, FinishVoteResult, GetAmendHandler, GetAmendQuery, ListTextAmendsHandler,
    ListTextAmendsQuery, ProposeAmendCommand, ProposeAmendHandler, ProposeAmendResult,
    ResolveAcceptanceCommand, ResolveAcceptanceError, ResolveAcceptanceHandler, VoteOutcome,
};
pub use text::{
    CreateTextCommand, CreateTextHandler, CreateTextResult, FollowTextCommand, FollowTextHandler,
    FollowersChangedResult, GetTextHandler, GetTextQuery, ListTextsHandler, UnfollowTextCommand,
    UnfollowTextHandler,
};
