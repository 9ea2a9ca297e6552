//! PatchEngine - computes patches between text snapshots and re-applies them.
//!
//! Application is strict: every hunk's anchor (its context plus the text it
//! deletes) must occur verbatim in the target. The only tolerance is
//! positional: an anchor may be found away from where the base put it, within
//! `match_distance` characters of its drift-adjusted position. Anything else is
//! a [`PatchConflict`]; hunks are never partially applied.

use super::diff::diff_chars;
use super::{ConflictReason, Edit, Hunk, Patch, PatchConfig, PatchConflict};

/// Pure, deterministic patch computation and application.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchEngine {
    config: PatchConfig,
}

impl PatchEngine {
    pub fn new(config: PatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Computes the patch turning `old` into `new`.
    pub fn diff(&self, old: &str, new: &str) -> Patch {
        let edits = diff_chars(old, new, self.config.edit_cost);
        let hunks = self.make_hunks(old, &edits);
        Patch::new(old, hunks)
    }

    /// Applies `patch` to `target`, which may differ from the patch's base.
    ///
    /// On the exact base each hunk is checked at its recorded position and
    /// the search is skipped.
    pub fn apply(&self, target: &str, patch: &Patch) -> Result<String, PatchConflict> {
        let chars: Vec<char> = target.chars().collect();
        let mut out = String::with_capacity(target.len());
        let mut cursor = 0usize;
        let mut drift: isize = 0;
        let on_base = patch.is_based_on(target);

        for (index, hunk) in patch.hunks().iter().enumerate() {
            let anchor: Vec<char> = hunk.anchor().chars().collect();
            let recorded = hunk.start1..hunk.start1 + anchor.len();

            let location = if anchor.is_empty() {
                if !chars.is_empty() {
                    return Err(PatchConflict::new(index, ConflictReason::UnanchoredInsert));
                }
                0
            } else if on_base
                && hunk.start1 >= cursor
                && chars.get(recorded) == Some(&anchor[..])
            {
                hunk.start1
            } else {
                let expected = (hunk.start1 as isize + drift).max(0) as usize;
                self.locate(&chars, &anchor, cursor, expected)
                    .map_err(|reason| PatchConflict::new(index, reason))?
            };

            out.extend(&chars[cursor..location]);
            out.push_str(&hunk.replacement());
            cursor = location + anchor.len();
            drift = location as isize - hunk.start1 as isize;
        }

        out.extend(&chars[cursor..]);
        Ok(out)
    }

    /// Applies `patch` to `current` and returns the diff between the two,
    /// i.e. what accepting the patch would change right now.
    pub fn preview(&self, current: &str, patch: &Patch) -> Result<Vec<Edit>, PatchConflict> {
        let patched = self.apply(current, patch)?;
        Ok(diff_chars(current, &patched, self.config.edit_cost))
    }

    /// Finds the occurrence of `anchor` at or after `from` nearest to `expected`.
    fn locate(
        &self,
        haystack: &[char],
        anchor: &[char],
        from: usize,
        expected: usize,
    ) -> Result<usize, ConflictReason> {
        if from > haystack.len() || haystack.len() - from < anchor.len() {
            return Err(ConflictReason::AnchorNotFound);
        }

        let nearest = haystack[from..]
            .windows(anchor.len())
            .enumerate()
            .filter(|(_, window)| *window == anchor)
            .map(|(offset, _)| from + offset)
            .min_by_key(|loc| (loc.abs_diff(expected), *loc));

        match nearest {
            None => Err(ConflictReason::AnchorNotFound),
            Some(loc) if loc.abs_diff(expected) > self.config.match_distance => {
                Err(ConflictReason::AnchorTooFar {
                    distance: loc.abs_diff(expected),
                })
            }
            Some(loc) => Ok(loc),
        }
    }

    /// Groups edits into hunks and frames each with context from `base`.
    fn make_hunks(&self, base: &str, edits: &[Edit]) -> Vec<Hunk> {
        let base: Vec<char> = base.chars().collect();
        let margin = self.config.margin.max(1);

        // (first edit, last edit, core start in base, core end in base, core start in new)
        let mut clusters: Vec<(usize, usize, usize, usize, usize)> = Vec::new();
        let mut open: Option<(usize, usize, usize, usize, usize)> = None;
        let (mut pos1, mut pos2) = (0usize, 0usize);

        for (i, edit) in edits.iter().enumerate() {
            let len = edit.char_len();
            match edit {
                Edit::Equal(_) => {
                    if len > 2 * margin {
                        if let Some(cluster) = open.take() {
                            clusters.push(cluster);
                        }
                    }
                    pos1 += len;
                    pos2 += len;
                }
                Edit::Delete(_) | Edit::Insert(_) => {
                    let (next1, next2) = match edit {
                        Edit::Delete(_) => (pos1 + len, pos2),
                        _ => (pos1, pos2 + len),
                    };
                    open = Some(match open {
                        Some((first, _, start1, _, start2)) => (first, i, start1, next1, start2),
                        None => (i, i, pos1, next1, pos2),
                    });
                    pos1 = next1;
                    pos2 = next2;
                }
            }
        }
        if let Some(cluster) = open.take() {
            clusters.push(cluster);
        }

        let mut hunks = Vec::with_capacity(clusters.len());
        let mut previous_end = 0usize;

        for (n, &(first, last, core_start, core_end, core_start2)) in clusters.iter().enumerate() {
            // leave the next hunk at least `margin` characters of leading context
            let upper = clusters
                .get(n + 1)
                .map(|c| c.2 - margin)
                .unwrap_or(base.len());

            let (pre_start, post_end) = self.frame(&base, core_start, core_end, previous_end, upper);
            previous_end = post_end;

            let mut hunk_edits = Vec::with_capacity(last - first + 3);
            if pre_start < core_start {
                hunk_edits.push(Edit::Equal(base[pre_start..core_start].iter().collect()));
            }
            hunk_edits.extend(edits[first..=last].iter().cloned());
            if core_end < post_end {
                hunk_edits.push(Edit::Equal(base[core_end..post_end].iter().collect()));
            }

            let length1 = post_end - pre_start;
            let length2 = hunk_edits
                .iter()
                .filter(|e| !matches!(e, Edit::Delete(_)))
                .map(Edit::char_len)
                .sum();

            hunks.push(Hunk {
                start1: pre_start,
                length1,
                start2: core_start2 - (core_start - pre_start),
                length2,
                edits: hunk_edits,
            });
        }

        hunks
    }

    /// Chooses the context window around a hunk core, widening it by `margin`
    /// steps until the anchor is unique in the base or `max_context` is reached.
    /// The window stays within `lower..upper`.
    fn frame(
        &self,
        base: &[char],
        core_start: usize,
        core_end: usize,
        lower: usize,
        upper: usize,
    ) -> (usize, usize) {
        let margin = self.config.margin.max(1);
        let mut pad = margin;

        loop {
            let pre_start = core_start.saturating_sub(pad).max(lower);
            let post_end = (core_end + pad).min(upper);
            let anchor = &base[pre_start..post_end];

            let exhausted = pre_start == lower && post_end == upper;
            if anchor.is_empty()
                || exhausted
                || pad >= self.config.max_context
                || occurrences(base, anchor) <= 1
            {
                return (pre_start, post_end);
            }
            pad += margin;
        }
    }
}

fn occurrences(haystack: &[char], needle: &[char]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine() -> PatchEngine {
        PatchEngine::default()
    }

    #[test]
    fn diff_of_identical_texts_is_empty() {
        let patch = engine().diff("unchanged", "unchanged");
        assert!(patch.is_empty());
        assert_eq!(engine().apply("anything at all", &patch).unwrap(), "anything at all");
    }

    #[test]
    fn apply_on_own_base_produces_target() {
        let patch = engine().diff("Hello world.", "Hello brave world.");
        assert_eq!(engine().apply("Hello world.", &patch).unwrap(), "Hello brave world.");
    }

    #[test]
    fn misplaced_hunk_on_own_base_is_still_located() {
        let e = engine();
        let base = "Article 1. Article 2. Article 3.";
        let patch = e.diff(base, "Article 1. Article 2 bis. Article 3.");
        let mut hunks = patch.hunks().to_vec();
        hunks[0].start1 += 3;
        let shifted = Patch::reconstitute(patch.base_checksum().to_string(), hunks);

        assert!(shifted.is_based_on(base));
        assert_eq!(e.apply(base, &shifted).unwrap(), "Article 1. Article 2 bis. Article 3.");
    }

    #[test]
    fn hunk_carries_margin_context() {
        let patch = engine().diff("Hello world.", "Hello earth.");
        assert_eq!(patch.hunks().len(), 1);
        let hunk = &patch.hunks()[0];
        assert_eq!(hunk.anchor(), "llo world.");
        assert_eq!(hunk.replacement(), "llo earth.");
        assert_eq!(hunk.start1, 2);
        assert_eq!(hunk.length1, 10);
        assert_eq!(hunk.start2, 2);
        assert_eq!(hunk.length2, 10);
    }

    #[test]
    fn overlapping_edit_conflicts() {
        let e = engine();
        let rename = e.diff("Hello world.", "Hello earth.");
        let accepted = e.apply("Hello world.", &e.diff("Hello world.", "Hello brave world.")).unwrap();

        let conflict = e.apply(&accepted, &rename).unwrap_err();
        assert_eq!(conflict.hunk_index, 0);
        assert_eq!(conflict.reason, ConflictReason::AnchorNotFound);
    }

    #[test]
    fn distant_edit_survives_divergence() {
        let e = engine();
        let base = "The quick brown fox jumps over the lazy dog.";
        let first = e.diff(base, "The slow brown fox jumps over the lazy dog.");
        let second = e.diff(base, "The quick brown fox jumps over the sleepy dog.");

        let after_first = e.apply(base, &first).unwrap();
        assert_eq!(
            e.apply(&after_first, &second).unwrap(),
            "The slow brown fox jumps over the sleepy dog."
        );
    }

    #[test]
    fn multiple_hunks_apply_in_order() {
        let e = engine();
        let base = "alpha one two three four five six seven omega";
        let target = "ALPHA one two three four five six seven OMEGA";
        let patch = e.diff(base, target);
        assert_eq!(patch.hunks().len(), 2);
        assert_eq!(e.apply(base, &patch).unwrap(), target);
    }

    #[test]
    fn one_failing_hunk_fails_whole_patch() {
        let e = engine();
        let base = "alpha one two three four five six seven omega";
        let patch = e.diff(base, "ALPHA one two three four five six seven OMEGA");

        let diverged = "alpha one two three four five six seven finale";
        let conflict = e.apply(diverged, &patch).unwrap_err();
        assert_eq!(conflict.hunk_index, 1);
    }

    #[test]
    fn anchor_is_widened_until_unique() {
        let e = engine();
        let base = "b c d. b c d. b c d. b c d.";
        let patch = e.diff(base, "b c d. b X d. b c d. b c d.");
        let anchor = patch.hunks()[0].anchor();
        assert!(anchor.chars().count() > 9);
        assert_eq!(base.matches(anchor.as_str()).count(), 1);
    }

    #[test]
    fn nearest_occurrence_wins_when_anchor_repeats() {
        let e = PatchEngine::new(PatchConfig {
            max_context: 4,
            ..PatchConfig::default()
        });
        let base = "b c d. b c d. b c d. b c d.";
        let target = "b c d. b c d. b X d. b c d.";
        let patch = e.diff(base, target);
        assert_eq!(patch.hunks()[0].anchor(), ". b c d. ");
        assert_eq!(e.apply(base, &patch).unwrap(), target);
    }

    #[test]
    fn match_distance_bounds_drift() {
        let strict = PatchEngine::new(PatchConfig {
            match_distance: 3,
            ..PatchConfig::default()
        });
        let base = "intro. The article is good.";
        let patch = strict.diff(base, "intro. The article is great.");

        let shifted = "a much longer introduction. The article is good.";
        let conflict = strict.apply(shifted, &patch).unwrap_err();
        assert!(matches!(conflict.reason, ConflictReason::AnchorTooFar { .. }));

        assert_eq!(
            engine().apply(shifted, &patch).unwrap(),
            "a much longer introduction. The article is great."
        );
    }

    #[test]
    fn patch_from_empty_base_only_applies_to_empty_text() {
        let e = engine();
        let patch = e.diff("", "Article 1.");
        assert_eq!(e.apply("", &patch).unwrap(), "Article 1.");

        let conflict = e.apply("Article 0.", &patch).unwrap_err();
        assert_eq!(conflict.reason, ConflictReason::UnanchoredInsert);
    }

    #[test]
    fn preview_shows_changes_against_current_text() {
        let e = engine();
        let base = "The quick brown fox jumps over the lazy dog.";
        let patch = e.diff(base, "The quick brown fox jumps over the sleepy dog.");
        let current = "The slow brown fox jumps over the lazy dog.";

        let preview = e.preview(current, &patch).unwrap();
        let after: String = preview
            .iter()
            .filter(|e| !matches!(e, Edit::Delete(_)))
            .map(Edit::text)
            .collect();
        assert!(preview.iter().any(|e| !e.is_equal()));
        assert!(preview[0].text().starts_with("The slow"));
        assert_eq!(after, "The slow brown fox jumps over the sleepy dog.");
    }

    #[test]
    fn preview_reports_conflicts() {
        let e = engine();
        let patch = e.diff("Hello world.", "Hello earth.");
        assert!(e.preview("Goodbye.", &patch).is_err());
    }

    proptest! {
        #[test]
        fn apply_of_diff_round_trips(old in "[a-d .\n]{0,40}", new in "[a-d .\n]{0,40}") {
            let e = engine();
            let patch = e.diff(&old, &new);
            prop_assert_eq!(e.apply(&old, &patch).unwrap(), new);
        }

        #[test]
        fn round_trip_holds_for_any_edit_cost(
            old in "\\PC{0,30}",
            new in "\\PC{0,30}",
            edit_cost in 0usize..16,
            margin in 1usize..6,
        ) {
            let e = PatchEngine::new(PatchConfig { edit_cost, margin, ..PatchConfig::default() });
            let patch = e.diff(&old, &new);
            prop_assert_eq!(e.apply(&old, &patch).unwrap(), new);
        }
    }
}
