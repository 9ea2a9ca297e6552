//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, events)
//! - `patch` - Diff computation and re-application of patches
//! - `text` - Text aggregate: body, patch history, followers
//! - `amend` - Amend aggregate: proposed patch, votes, lifecycle
//! - `resolution` - Acceptance of an amendment and its cascade

pub mod amend;
pub mod foundation;
pub mod patch;
pub mod resolution;
pub mod text;
