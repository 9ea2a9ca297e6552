//! Amend command and query handlers.

mod cast_vote;
mod finish_vote;
mod get_amend;
mod propose_amend;
mod resolve_acceptance;

pub use cast_vote::{CastVoteCommand, CastVoteHandler, CastVoteResult};
pub use finish_vote::{FinishVoteCommand, FinishVoteHandler, FinishVoteResult, VoteOutcome};
pub use get_amend::{
    AmendView, GetAmendHandler, GetAmendQuery, ListTextAmendsHandler, ListTextAmendsQuery,
};
pub use propose_amend::{ProposeAmendCommand, ProposeAmendHandler, ProposeAmendResult};
pub use resolve_acceptance::{
    ResolveAcceptanceCommand, ResolveAcceptanceError, ResolveAcceptanceHandler,
};
