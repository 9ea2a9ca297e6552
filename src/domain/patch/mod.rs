//! Patch module - Diffs between text snapshots and their re-application.
//!
//! A [`Patch`] is computed against one version of a text and may later be
//! applied to a different version. When its anchors can no longer be
//! located the outcome is a [`PatchConflict`] value rather than a failure.

mod diff;
mod engine;
mod value_objects;

pub use engine::PatchEngine;
pub use value_objects::{
    content_checksum, ConflictReason, Edit, Hunk, Patch, PatchConfig, PatchConflict,
};
