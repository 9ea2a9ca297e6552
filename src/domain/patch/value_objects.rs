//! Value objects for text patches.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════════
// Edit - One run of characters in a diff
// ════════════════════════════════════════════════════════════════════════════════

/// A run of characters that is kept, removed or added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "text", rename_all = "snake_case")]
pub enum Edit {
    Equal(String),
    Delete(String),
    Insert(String),
}

impl Edit {
    /// Returns the characters carried by this edit.
    pub fn text(&self) -> &str {
        match self {
            Edit::Equal(t) | Edit::Delete(t) | Edit::Insert(t) => t,
        }
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, Edit::Equal(_))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Hunk - A located group of edits with surrounding context
// ════════════════════════════════════════════════════════════════════════════════

/// A contiguous group of edits, framed by unchanged context from the base text.
///
/// Positions are character offsets: `start1`/`length1` in the base text,
/// `start2`/`length2` in the text the patch was computed to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub start1: usize,
    pub length1: usize,
    pub start2: usize,
    pub length2: usize,
    pub edits: Vec<Edit>,
}

impl Hunk {
    /// Text this hunk expects to find in the target: context plus deletions.
    pub fn anchor(&self) -> String {
        self.edits
            .iter()
            .filter(|e| !matches!(e, Edit::Insert(_)))
            .map(Edit::text)
            .collect()
    }

    /// Text this hunk writes in place of its anchor: context plus insertions.
    pub fn replacement(&self) -> String {
        self.edits
            .iter()
            .filter(|e| !matches!(e, Edit::Delete(_)))
            .map(Edit::text)
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Patch - Serializable diff against a base snapshot
// ════════════════════════════════════════════════════════════════════════════════

/// A diff computed against a base text, re-applicable to texts that have
/// since diverged from that base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    base_checksum: String,
    hunks: Vec<Hunk>,
}

impl Patch {
    /// Creates a patch, recording the checksum of the base it was computed against.
    pub fn new(base: &str, hunks: Vec<Hunk>) -> Self {
        Self {
            base_checksum: content_checksum(base),
            hunks,
        }
    }

    /// Reconstitutes a patch from persistence.
    pub fn reconstitute(base_checksum: String, hunks: Vec<Hunk>) -> Self {
        Self {
            base_checksum,
            hunks,
        }
    }

    /// SHA-256 of the base text, the snapshot this patch refers to.
    pub fn base_checksum(&self) -> &str {
        &self.base_checksum
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// True if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// True if `text` is exactly the snapshot this patch was computed against.
    /// [`PatchEngine::apply`](super::PatchEngine::apply) then trusts the
    /// recorded hunk positions.
    pub fn is_based_on(&self, text: &str) -> bool {
        self.base_checksum == content_checksum(text)
    }

    /// Number of characters inserted and deleted.
    pub fn change_counts(&self) -> (usize, usize) {
        self.hunks
            .iter()
            .flat_map(|h| h.edits.iter())
            .fold((0, 0), |(ins, del), e| match e {
                Edit::Insert(_) => (ins + e.char_len(), del),
                Edit::Delete(_) => (ins, del + e.char_len()),
                Edit::Equal(_) => (ins, del),
            })
    }
}

/// Computes the SHA-256 checksum of a text.
pub fn content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ════════════════════════════════════════════════════════════════════════════════
// PatchConflict - A patch that cannot be located in the target text
// ════════════════════════════════════════════════════════════════════════════════

/// Why a hunk could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// The hunk's context and deleted text no longer occur in the target.
    AnchorNotFound,
    /// The anchor occurs, but further from its expected position than allowed.
    AnchorTooFar { distance: usize },
    /// A patch computed against an empty text, applied to a non-empty one.
    UnanchoredInsert,
}

/// Outcome of applying a patch whose context no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("hunk {hunk_index} cannot be applied: {reason:?}")]
pub struct PatchConflict {
    pub hunk_index: usize,
    pub reason: ConflictReason,
}

impl PatchConflict {
    pub fn new(hunk_index: usize, reason: ConflictReason) -> Self {
        Self { hunk_index, reason }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// PatchConfig - Diff and match tuning
// ════════════════════════════════════════════════════════════════════════════════

/// Tuning knobs of the patch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchConfig {
    /// Cost of an extra edit operation, in characters. Short equalities
    /// between edits are folded into the edits when cheaper than this.
    pub edit_cost: usize,
    /// Characters of context kept on each side of a hunk.
    pub margin: usize,
    /// How far (in characters) a hunk may drift from its expected position.
    pub match_distance: usize,
    /// Upper bound on context when widening it to make an anchor unique.
    pub max_context: usize,
    /// Longest body, in characters, an amendment may propose.
    pub max_body_chars: usize,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            edit_cost: 8,
            margin: 4,
            match_distance: 1000,
            max_context: 64,
            max_body_chars: 20_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hunk() -> Hunk {
        Hunk {
            start1: 2,
            length1: 10,
            start2: 2,
            length2: 10,
            edits: vec![
                Edit::Equal("llo ".into()),
                Edit::Delete("world".into()),
                Edit::Insert("earth".into()),
                Edit::Equal(".".into()),
            ],
        }
    }

    #[test]
    fn anchor_skips_insertions() {
        assert_eq!(sample_hunk().anchor(), "llo world.");
    }

    #[test]
    fn replacement_skips_deletions() {
        assert_eq!(sample_hunk().replacement(), "llo earth.");
    }

    #[test]
    fn char_len_counts_characters_not_bytes() {
        assert_eq!(Edit::Insert("été".into()).char_len(), 3);
    }

    #[test]
    fn patch_knows_its_base() {
        let patch = Patch::new("Hello world.", vec![sample_hunk()]);
        assert!(patch.is_based_on("Hello world."));
        assert!(!patch.is_based_on("Hello brave world."));
    }

    #[test]
    fn change_counts_sum_insertions_and_deletions() {
        let patch = Patch::new("Hello world.", vec![sample_hunk()]);
        assert_eq!(patch.change_counts(), (5, 5));
    }

    #[test]
    fn edit_serializes_as_tagged_object() {
        let json = serde_json::to_value(Edit::Delete("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"op": "delete", "text": "x"}));
    }

    #[test]
    fn checksum_is_stable_hex() {
        let sum = content_checksum("");
        assert_eq!(sum.len(), 64);
        assert_eq!(sum, content_checksum(""));
    }
}
