//! Lexical normalizer: rewrites raw message text into a canonical form
//! before tokenization.
//!
//! Steps run in a fixed order:
//! 1. case-fold and trim
//! 2. quantity phrases ("half a dozen") → digits, longest phrase first
//! 3. keycap digit glyphs → digits
//! 4. hyphens between two letters → space ("twenty-one" → "twenty one")
//! 5. greedy split of run-together number words ("twentyone" → "twenty one ")
//!
//! Step 5 is best-effort: it matches the longest vocabulary word at each
//! position, so ordinary words that happen to contain a number word get split
//! too ("often" → "of ten ").

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::vocab;

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut phrases: Vec<&str> = vocab::QUANTITY_PHRASES.iter().map(|(p, _)| *p).collect();
    // Regex alternation is leftmost-first, so listing longer phrases first
    // makes "half a dozen" win over "a dozen".
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
    let alternation = phrases
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("quantity phrase pattern is valid")
});

/// Number words ordered longest first for the greedy splitter.
static SPLIT_WORDS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut words: Vec<&str> = vocab::number_words().collect();
    words.sort_by_key(|w| std::cmp::Reverse(w.len()));
    words
});

/// Run every normalization step over `raw`.
pub fn normalize(raw: &str) -> String {
    let text = raw.trim().to_lowercase();
    let text = replace_quantity_phrases(&text);
    let text = replace_digit_glyphs(&text);
    let text = split_letter_hyphens(&text);
    split_concatenated_numbers(&text)
}

pub(crate) fn replace_quantity_phrases(text: &str) -> String {
    QUANTITY_RE
        .replace_all(text, |caps: &Captures| {
            let phrase = &caps[0];
            vocab::QUANTITY_PHRASES
                .iter()
                .find(|(p, _)| *p == phrase)
                .map(|(_, n)| n.to_string())
                .unwrap_or_else(|| phrase.to_string())
        })
        .into_owned()
}

pub(crate) fn replace_digit_glyphs(text: &str) -> String {
    vocab::DIGIT_GLYPHS
        .iter()
        .fold(text.to_string(), |acc, (glyph, digits)| acc.replace(glyph, digits))
}

/// Only hyphens with a letter on both sides become spaces; every other
/// hyphen stays available as the subtraction operator.
pub(crate) fn split_letter_hyphens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let between_letters = c == '-'
                && i > 0
                && chars[i - 1].is_alphabetic()
                && chars.get(i + 1).is_some_and(|n| n.is_alphabetic());
            if between_letters { ' ' } else { c }
        })
        .collect()
}

/// Scan left to right; at each position take the longest number word that
/// starts there and emit it followed by a space, otherwise pass the
/// character through unchanged.
pub(crate) fn split_concatenated_numbers(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        match SPLIT_WORDS.iter().find(|w| rest.starts_with(**w)) {
            Some(word) => {
                out.push_str(word);
                out.push(' ');
                rest = &rest[word.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_fold_and_trim() {
        assert_eq!(normalize("  FIVE "), "five ");
    }

    #[test]
    fn quantity_phrases_prefer_longest() {
        assert_eq!(replace_quantity_phrases("half a dozen"), "6");
        assert_eq!(replace_quantity_phrases("a dozen"), "12");
        assert_eq!(replace_quantity_phrases("a gross plus a couple"), "144 plus 2");
        assert_eq!(replace_quantity_phrases("a bakers dozen"), "13");
    }

    #[test]
    fn quantity_phrases_respect_word_boundaries() {
        assert_eq!(replace_quantity_phrases("sea dozen"), "sea dozen");
    }

    #[test]
    fn keycap_glyphs_become_digits() {
        assert_eq!(replace_digit_glyphs("2\u{FE0F}\u{20E3}1\u{FE0F}\u{20E3}"), "21");
        assert_eq!(replace_digit_glyphs("\u{1F51F}"), "10");
        assert_eq!(replace_digit_glyphs("7\u{20E3}"), "7");
    }

    #[test]
    fn hyphen_between_letters_only() {
        assert_eq!(split_letter_hyphens("twenty-one"), "twenty one");
        assert_eq!(split_letter_hyphens("10-3"), "10-3");
        assert_eq!(split_letter_hyphens("ten -3"), "ten -3");
        assert_eq!(split_letter_hyphens("-five"), "-five");
    }

    #[test]
    fn concatenated_number_words_are_split() {
        assert_eq!(split_concatenated_numbers("twentyone"), "twenty one ");
        assert_eq!(split_concatenated_numbers("eighteen"), "eighteen ");
        assert_eq!(split_concatenated_numbers("fourteenth"), "fourteenth ");
        assert_eq!(split_concatenated_numbers("3+4"), "3+4");
    }

    #[test]
    fn splitter_is_lossy_on_ordinary_words() {
        assert_eq!(split_concatenated_numbers("often"), "of ten ");
    }

    #[test]
    fn full_pipeline() {
        assert_eq!(normalize("Twenty-One"), "twenty  one ");
        assert_eq!(normalize("a dozen"), "12");
    }
}
