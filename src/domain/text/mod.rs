//! Text domain module.
//!
//! Shared documents, their accepted patch history and their followers.
//!
//! # Events
//!
//! - `TextCreated` - Published when a text is created
//! - `TextFollowersChanged` - Published on follow/unfollow
//! - `TextPatched` - Published when an accepted amendment changes the body

mod aggregate;
mod errors;
mod events;

pub(crate) use aggregate::validate_field;
pub use aggregate::{Text, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};
pub use errors::TextError;
pub use events::{TextCreated, TextFollowersChanged, TextPatched};
