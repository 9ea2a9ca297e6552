//! Amend domain module.
//!
//! Amendments are proposed patches to a text. They collect votes while open
//! and are closed once: accepted, conflicted or refused.
//!
//! # Events
//!
//! - `AmendProposed` - Published when an amendment is proposed
//! - `AmendVoteCast` - Published on every vote
//! - `AmendRebased` - Published when an amendment survives another's acceptance
//! - `AmendResult` - Published when an amendment is closed

mod aggregate;
mod errors;
mod events;
mod status;

pub use aggregate::{Amend, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};
pub use errors::AmendError;
pub use events::{AmendProposed, AmendRebased, AmendResult, AmendVoteCast};
pub use status::{AmendStatus, Vote, VoteTally};
