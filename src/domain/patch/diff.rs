//! Character-level diff: linear-space Myers plus cleanup passes.

use super::Edit;

/// Computes a cleaned-up character diff turning `old` into `new`.
///
/// Equalities shorter than `edit_cost` that sit between edits are folded
/// into those edits when that reduces the number of operations.
pub(crate) fn diff_chars(old: &str, new: &str, edit_cost: usize) -> Vec<Edit> {
    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();

    let mut edits = Vec::new();
    diff_slices(&a, &b, &mut edits);

    let mut edits = cleanup_merge(edits);
    cleanup_efficiency(&mut edits, edit_cost);
    edits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

fn push_run(edits: &mut Vec<Edit>, op: Op, chars: &[char]) {
    if chars.is_empty() {
        return;
    }
    let text: String = chars.iter().collect();
    match (edits.last_mut(), op) {
        (Some(Edit::Equal(t)), Op::Equal)
        | (Some(Edit::Delete(t)), Op::Delete)
        | (Some(Edit::Insert(t)), Op::Insert) => t.push_str(&text),
        _ => edits.push(match op {
            Op::Equal => Edit::Equal(text),
            Op::Delete => Edit::Delete(text),
            Op::Insert => Edit::Insert(text),
        }),
    }
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// Appends an edit script turning `a` into `b`.
///
/// Divide and conquer on the middle snake, so memory stays linear in the
/// input however far apart the two texts are.
fn diff_slices(a: &[char], b: &[char], edits: &mut Vec<Edit>) {
    let prefix = common_prefix(a, b);
    push_run(edits, Op::Equal, &a[..prefix]);
    let (a, b) = (&a[prefix..], &b[prefix..]);

    let suffix = common_suffix(a, b);
    let (a_mid, b_mid) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    if a_mid.is_empty() || b_mid.is_empty() {
        push_run(edits, Op::Delete, a_mid);
        push_run(edits, Op::Insert, b_mid);
    } else if let Some((x, y)) = middle_snake(a_mid, b_mid) {
        diff_slices(&a_mid[..x], &b_mid[..y], edits);
        diff_slices(&a_mid[x..], &b_mid[y..], edits);
    } else {
        push_run(edits, Op::Delete, a_mid);
        push_run(edits, Op::Insert, b_mid);
    }

    push_run(edits, Op::Equal, &a[a.len() - suffix..]);
}

/// Runs Myers' search from both ends at once and returns the point where
/// the two frontiers overlap, or `None` if the texts share nothing.
///
/// Both inputs must be non-empty. Only two diagonal arrays of
/// `len(a) + len(b)` entries are kept.
fn middle_snake(a: &[char], b: &[char]) -> Option<(usize, usize)> {
    let (n, m) = (a.len() as isize, b.len() as isize);
    let max_d = (n + m + 1) / 2;
    let offset = max_d;
    let width = 2 * max_d;
    let mut forward = vec![-1isize; width as usize];
    let mut reverse = vec![-1isize; width as usize];
    forward[(offset + 1) as usize] = 0;
    reverse[(offset + 1) as usize] = 0;

    let delta = n - m;
    // odd delta: the forward frontier is the one that can catch up
    let front = delta % 2 != 0;
    // diagonals that ran off the edit graph are skipped from then on
    let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0isize, 0isize, 0isize, 0isize);

    for d in 0..max_d {
        let mut k1 = -d + k1_start;
        while k1 <= d - k1_end {
            let i = (offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && forward[i - 1] < forward[i + 1]) {
                forward[i + 1]
            } else {
                forward[i - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            forward[i] = x1;

            if x1 > n {
                k1_end += 2;
            } else if y1 > m {
                k1_start += 2;
            } else if front {
                let j = offset + delta - k1;
                if (0..width).contains(&j) && reverse[j as usize] != -1 {
                    let x2 = n - reverse[j as usize];
                    if x1 >= x2 {
                        return Some((x1 as usize, y1 as usize));
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2_start;
        while k2 <= d - k2_end {
            let i = (offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && reverse[i - 1] < reverse[i + 1]) {
                reverse[i + 1]
            } else {
                reverse[i - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n && y2 < m && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize] {
                x2 += 1;
                y2 += 1;
            }
            reverse[i] = x2;

            if x2 > n {
                k2_end += 2;
            } else if y2 > m {
                k2_start += 2;
            } else if !front {
                let j = offset + delta - k2;
                if (0..width).contains(&j) && forward[j as usize] != -1 {
                    let x1 = forward[j as usize];
                    let y1 = offset + x1 - j;
                    if x1 >= n - x2 {
                        return Some((x1 as usize, y1 as usize));
                    }
                }
            }
            k2 += 2;
        }
    }

    None
}

/// Normalizes a diff: each run of edits between equalities becomes at most
/// one deletion followed by one insertion, with their common prefix and
/// suffix moved out into the surrounding equalities.
pub(crate) fn cleanup_merge(edits: Vec<Edit>) -> Vec<Edit> {
    let mut merged: Vec<Edit> = Vec::with_capacity(edits.len());
    let mut deleted = String::new();
    let mut inserted = String::new();

    for edit in edits {
        match edit {
            Edit::Delete(t) => deleted.push_str(&t),
            Edit::Insert(t) => inserted.push_str(&t),
            Edit::Equal(t) => {
                flush_changes(&mut merged, &mut deleted, &mut inserted);
                push_equal(&mut merged, &t);
            }
        }
    }
    flush_changes(&mut merged, &mut deleted, &mut inserted);
    merged
}

fn flush_changes(merged: &mut Vec<Edit>, deleted: &mut String, inserted: &mut String) {
    let del: Vec<char> = deleted.chars().collect();
    let ins: Vec<char> = inserted.chars().collect();
    deleted.clear();
    inserted.clear();

    let prefix = del.iter().zip(ins.iter()).take_while(|(x, y)| x == y).count();
    let suffix = del[prefix..]
        .iter()
        .rev()
        .zip(ins[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let common_prefix: String = del[..prefix].iter().collect();
    let common_suffix: String = del[del.len() - suffix..].iter().collect();
    let del_core: String = del[prefix..del.len() - suffix].iter().collect();
    let ins_core: String = ins[prefix..ins.len() - suffix].iter().collect();

    push_equal(merged, &common_prefix);
    if !del_core.is_empty() {
        merged.push(Edit::Delete(del_core));
    }
    if !ins_core.is_empty() {
        merged.push(Edit::Insert(ins_core));
    }
    push_equal(merged, &common_suffix);
}

fn push_equal(merged: &mut Vec<Edit>, text: &str) {
    if text.is_empty() {
        return;
    }
    match merged.last_mut() {
        Some(Edit::Equal(t)) => t.push_str(text),
        _ => merged.push(Edit::Equal(text.to_string())),
    }
}

/// Folds short equalities into neighbouring edits when an extra operation
/// costs more than `edit_cost` characters.
fn cleanup_efficiency(edits: &mut Vec<Edit>, edit_cost: usize) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    // ins/del seen before and after the last equality
    let (mut pre_ins, mut pre_del, mut post_ins, mut post_del) = (false, false, false, false);
    let mut pointer: isize = 0;

    while (pointer as usize) < edits.len() {
        let at = pointer as usize;
        match edits[at].clone() {
            Edit::Equal(text) => {
                if text.chars().count() < edit_cost && (post_ins || post_del) {
                    equalities.push(at);
                    pre_ins = post_ins;
                    pre_del = post_del;
                    last_equality = Some(text);
                } else {
                    equalities.clear();
                    last_equality = None;
                }
                post_ins = false;
                post_del = false;
            }
            change => {
                if matches!(change, Edit::Delete(_)) {
                    post_del = true;
                } else {
                    post_ins = true;
                }

                let sides = [pre_ins, pre_del, post_ins, post_del]
                    .iter()
                    .filter(|s| **s)
                    .count();
                let fold = match (&last_equality, equalities.last()) {
                    (Some(eq), Some(&eq_at)) => {
                        let short = eq.chars().count() * 2 < edit_cost;
                        (sides == 4 || (short && sides == 3)).then(|| (eq.clone(), eq_at))
                    }
                    _ => None,
                };

                if let Some((eq, eq_at)) = fold {
                    edits[eq_at] = Edit::Insert(eq.clone());
                    edits.insert(eq_at, Edit::Delete(eq));
                    equalities.pop();
                    last_equality = None;
                    if pre_ins && pre_del {
                        post_ins = true;
                        post_del = true;
                        equalities.clear();
                    } else {
                        equalities.pop();
                        pointer = equalities.last().map(|&i| i as isize).unwrap_or(-1);
                        post_ins = false;
                        post_del = false;
                    }
                    changed = true;
                }
            }
        }
        pointer += 1;
    }

    if changed {
        *edits = cleanup_merge(std::mem::take(edits));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(edits: &[Edit]) -> (String, String) {
        let old = edits
            .iter()
            .filter(|e| !matches!(e, Edit::Insert(_)))
            .map(Edit::text)
            .collect();
        let new = edits
            .iter()
            .filter(|e| !matches!(e, Edit::Delete(_)))
            .map(Edit::text)
            .collect();
        (old, new)
    }

    #[test]
    fn identical_texts_yield_single_equality() {
        let edits = diff_chars("same text", "same text", 8);
        assert_eq!(edits, vec![Edit::Equal("same text".into())]);
    }

    #[test]
    fn empty_old_text_is_one_insertion() {
        assert_eq!(diff_chars("", "abc", 8), vec![Edit::Insert("abc".into())]);
    }

    #[test]
    fn empty_new_text_is_one_deletion() {
        assert_eq!(diff_chars("abc", "", 8), vec![Edit::Delete("abc".into())]);
    }

    #[test]
    fn insertion_inside_sentence_is_isolated() {
        let edits = diff_chars("Hello world.", "Hello brave world.", 8);
        assert_eq!(
            edits,
            vec![
                Edit::Equal("Hello ".into()),
                Edit::Insert("brave ".into()),
                Edit::Equal("world.".into()),
            ]
        );
    }

    #[test]
    fn efficiency_cleanup_folds_short_equalities() {
        // "world" vs "earth" share only an "r"; one replacement is cheaper.
        let edits = diff_chars("Hello world.", "Hello earth.", 8);
        assert_eq!(
            edits,
            vec![
                Edit::Equal("Hello ".into()),
                Edit::Delete("world".into()),
                Edit::Insert("earth".into()),
                Edit::Equal(".".into()),
            ]
        );
    }

    #[test]
    fn zero_edit_cost_keeps_fine_grained_edits() {
        let edits = diff_chars("Hello world.", "Hello earth.", 0);
        assert!(edits.iter().filter(|e| e.is_equal()).count() > 2);
        assert_eq!(rebuild(&edits), ("Hello world.".into(), "Hello earth.".into()));
    }

    #[test]
    fn diff_reconstructs_both_sides_for_multibyte_text() {
        let old = "L'été sera chaud à Paris.";
        let new = "L'hiver sera froid à Lyon.";
        let edits = diff_chars(old, new, 8);
        assert_eq!(rebuild(&edits), (old.to_string(), new.to_string()));
    }

    #[test]
    fn full_rewrite_of_long_text_is_one_replacement() {
        let old = "a".repeat(4000);
        let new = "b".repeat(4000);

        let edits = diff_chars(&old, &new, 8);

        assert_eq!(edits, vec![Edit::Delete(old), Edit::Insert(new)]);
    }

    #[test]
    fn distant_changes_in_long_text_stay_separate() {
        let filler = "Les citoyens délibèrent. ".repeat(100);
        let old = format!("{f}Article 1 applies.{f}Article 9 applies.{f}", f = filler);
        let new = format!("{f}Article 2 applies.{f}Article 8 applies.{f}", f = filler);

        let edits = diff_chars(&old, &new, 8);

        let changes: Vec<&Edit> = edits.iter().filter(|e| !e.is_equal()).collect();
        assert_eq!(
            changes,
            vec![
                &Edit::Delete("1".into()),
                &Edit::Insert("2".into()),
                &Edit::Delete("9".into()),
                &Edit::Insert("8".into()),
            ]
        );
        assert_eq!(rebuild(&edits), (old, new));
    }

    #[test]
    fn interleaved_rewrite_reconstructs_both_sides() {
        let old: String = (0..3000).map(|i| if i % 3 == 0 { 'x' } else { 'y' }).collect();
        let new: String = (0..2500).map(|i| if i % 5 == 0 { 'y' } else { 'z' }).collect();

        let edits = diff_chars(&old, &new, 0);

        assert_eq!(rebuild(&edits), (old, new));
    }

    #[test]
    fn middle_snake_finds_nothing_without_shared_characters() {
        let a: Vec<char> = "abc".chars().collect();
        let b: Vec<char> = "xyz".chars().collect();
        assert_eq!(middle_snake(&a, &b), None);
    }

    #[test]
    fn cleanup_merge_factors_common_affixes() {
        let edits = cleanup_merge(vec![
            Edit::Equal("a".into()),
            Edit::Delete("xbcz".into()),
            Edit::Insert("xdez".into()),
            Edit::Equal("f".into()),
        ]);
        assert_eq!(
            edits,
            vec![
                Edit::Equal("ax".into()),
                Edit::Delete("bc".into()),
                Edit::Insert("de".into()),
                Edit::Equal("zf".into()),
            ]
        );
    }

    #[test]
    fn cleanup_merge_orders_deletion_before_insertion() {
        let edits = cleanup_merge(vec![
            Edit::Insert("1".into()),
            Edit::Delete("a".into()),
            Edit::Insert("2".into()),
            Edit::Delete("b".into()),
        ]);
        assert_eq!(edits, vec![Edit::Delete("ab".into()), Edit::Insert("12".into())]);
    }
}
