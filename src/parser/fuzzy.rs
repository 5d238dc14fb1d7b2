//! Fuzzy vocabulary matching for misspelled number words.
//!
//! Similarity is the matching-blocks ratio `2·M / (len(a) + len(b))`, where
//! `M` is the number of characters covered by recursively taking the longest
//! common block and matching the pieces on either side of it.

/// Minimum similarity for a misspelling to be accepted as a vocabulary word.
pub const FUZZY_CUTOFF: f64 = 0.8;

/// Similarity ratio in `[0.0, 1.0]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

/// Best vocabulary match for `word` at or above `cutoff`.
///
/// Equal scores are resolved towards the lexicographically greater word so
/// the result never depends on vocabulary order.
pub fn closest_match<'a, I>(word: &str, vocabulary: I, cutoff: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    vocabulary
        .into_iter()
        .map(|candidate| (similarity(candidate, word), candidate))
        .filter(|(score, _)| *score >= cutoff)
        .max_by(|(sa, wa), (sb, wb)| sa.total_cmp(sb).then_with(|| wa.cmp(wb)))
        .map(|(_, candidate)| candidate)
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let Some((i, j, size)) = longest_block(a, b) else {
        return 0;
    };
    size + matched_chars(&a[..i], &b[..j]) + matched_chars(&a[i + size..], &b[j + size..])
}

/// Longest common contiguous block; the earliest one in `a` (then `b`) wins ties.
fn longest_block(a: &[char], b: &[char]) -> Option<(usize, usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;
    let mut prev = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                row[j + 1] = len;
                if best.is_none_or(|(_, _, size)| len > size) {
                    best = Some((i + 1 - len, j + 1 - len, len));
                }
            }
        }
        prev = row;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::vocab;

    #[test]
    fn identical_and_disjoint() {
        assert_eq!(similarity("seven", "seven"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn ratio_counts_blocks_on_both_sides() {
        // "th" + "t" + "e" = 4 matched of 10 characters
        assert!((similarity("tenth", "tieth") - 0.8).abs() < 1e-9);
        // "sev" + "en" = 5 of 11
        assert!((similarity("seven", "sevven") - 10.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn misspellings_resolve_to_number_words() {
        assert_eq!(closest_match("fourty", vocab::number_words(), FUZZY_CUTOFF), Some("forty"));
        assert_eq!(closest_match("sevn", vocab::number_words(), FUZZY_CUTOFF), Some("seven"));
        assert_eq!(closest_match("tweleve", vocab::number_words(), FUZZY_CUTOFF), Some("twelve"));
    }

    #[test]
    fn unrelated_words_do_not_match() {
        assert_eq!(closest_match("banana", vocab::number_words(), FUZZY_CUTOFF), None);
        assert_eq!(closest_match("by", vocab::number_words(), FUZZY_CUTOFF), None);
    }
}
