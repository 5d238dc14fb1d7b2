//! Value resolver: turns normalized text into a plain arithmetic expression.
//!
//! Runs of number words are buffered and converted to a literal when an
//! operator or digit run ends them. Words outside the vocabulary get one fuzzy
//! lookup and one Roman-numeral decode; if both fail the whole message fails.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;

use super::fuzzy::{self, FUZZY_CUTOFF};
use super::vocab;

/// Longest expression handed to the evaluator.
pub const MAX_EXPRESSION_LEN: usize = 50;

/// Characters an assembled expression may contain.
const EXPRESSION_WHITELIST: &str = "0123456789+-*/^().=";

static OPERATOR_PHRASES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vocab::OPERATOR_PHRASES
        .iter()
        .map(|(phrase, joined)| {
            let pattern = phrase
                .split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            let re = Regex::new(&format!(r"\b{pattern}\b")).expect("operator phrase pattern is valid");
            (re, *joined)
        })
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Digits(&'a str),
    Word(&'a str),
    Symbol(char),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut iter = text.char_indices().peekable();

    while let Some((start, c)) = iter.next() {
        if c.is_ascii_digit() || c.is_alphabetic() {
            let digits = c.is_ascii_digit();
            let mut end = start + c.len_utf8();
            while let Some(&(i, n)) = iter.peek() {
                let same_class = if digits { n.is_ascii_digit() } else { n.is_alphabetic() };
                if !same_class {
                    break;
                }
                end = i + n.len_utf8();
                iter.next();
            }
            let run = &text[start..end];
            tokens.push(if digits { Token::Digits(run) } else { Token::Word(run) });
        } else if !c.is_whitespace() && c != '_' {
            tokens.push(Token::Symbol(c));
        }
    }

    tokens
}

fn collapse_operator_phrases(text: &str) -> String {
    OPERATOR_PHRASES
        .iter()
        .fold(text.to_string(), |acc, (re, joined)| re.replace_all(&acc, *joined).into_owned())
}

fn symbol_operator(c: char) -> Option<String> {
    if vocab::OPERATOR_SYMBOLS.contains(&c) {
        return Some(c.to_string());
    }
    let mut buf = [0u8; 4];
    vocab::operator(c.encode_utf8(&mut buf)).map(str::to_string)
}

/// Accumulates the expression while scanning tokens.
#[derive(Default)]
struct Assembler {
    out: String,
    words: Vec<String>,
    last_numeric: bool,
}

impl Assembler {
    fn push_operator(&mut self, op: &str) -> Result<(), ParseError> {
        self.flush_words()?;
        self.out.push_str(op);
        self.last_numeric = false;
        Ok(())
    }

    /// Adjacent numbers with no operator between them are summed.
    fn push_number(&mut self, literal: &str) {
        if self.last_numeric {
            self.out.push('+');
        }
        self.out.push_str(literal);
        self.last_numeric = true;
    }

    fn flush_words(&mut self) -> Result<(), ParseError> {
        if self.words.is_empty() {
            return Ok(());
        }
        let value = words_to_number(&self.words)?;
        self.words.clear();
        self.push_number(&value.to_string());
        Ok(())
    }
}

/// Resolve normalized text into an expression string over the whitelist.
pub fn resolve(normalized: &str) -> Result<String, ParseError> {
    let text = collapse_operator_phrases(normalized);
    let mut asm = Assembler::default();

    for token in tokenize(&text) {
        match token {
            Token::Symbol(c) => match symbol_operator(c) {
                Some(op) => asm.push_operator(&op)?,
                None => return Err(ParseError::UnknownWord(c.to_string())),
            },
            Token::Digits(d) => {
                asm.flush_words()?;
                asm.push_number(d);
            }
            Token::Word(w) => {
                if let Some(op) = vocab::operator(w) {
                    asm.push_operator(op)?;
                } else if vocab::is_number_word(w) {
                    asm.words.push(w.to_string());
                } else if let Some(word) =
                    fuzzy::closest_match(w, vocab::number_words(), FUZZY_CUTOFF)
                {
                    asm.words.push(word.to_string());
                } else if let Some(value) = roman_to_int(w) {
                    asm.flush_words()?;
                    asm.push_number(&value.to_string());
                } else {
                    return Err(ParseError::UnknownWord(w.to_string()));
                }
            }
        }
    }
    asm.flush_words()?;

    let expr = asm.out;
    if expr.is_empty() {
        return Err(ParseError::Empty);
    }
    if expr.len() > MAX_EXPRESSION_LEN {
        return Err(ParseError::TooLong {
            len: expr.len(),
            max: MAX_EXPRESSION_LEN,
        });
    }
    if let Some(bad) = expr.chars().find(|c| !EXPRESSION_WHITELIST.contains(*c)) {
        return Err(ParseError::ForbiddenChar(bad));
    }

    Ok(expr)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Start,
    Unit,
    Teen,
    Tens,
    Hundred,
}

/// Convert a run of number words ("three hundred forty two thousand") into
/// its value. A lone ordinal is looked up directly; an ordinal ending a longer
/// run contributes its cardinal value ("twenty first" → 21).
pub fn words_to_number(words: &[String]) -> Result<i64, ParseError> {
    let malformed = || ParseError::MalformedNumber(words.join(" "));

    if let [word] = words {
        if let Some(v) = vocab::ordinal(word) {
            return Ok(v);
        }
        if word == "zero" {
            return Ok(0);
        }
    }

    let mut total: i64 = 0;
    let mut group: i64 = 0;
    let mut part = Part::Start;
    let mut last_scale: Option<i64> = None;

    for (idx, word) in words.iter().enumerate() {
        let is_last = idx + 1 == words.len();
        let value = match vocab::ordinal(word) {
            Some(v) if is_last => Some(v),
            Some(_) => return Err(malformed()),
            None => vocab::unit(word).or_else(|| vocab::tens(word)),
        };

        if let Some(v) = value {
            let (allowed, next) = match v {
                0 => (false, part),
                1..=9 => (matches!(part, Part::Start | Part::Tens | Part::Hundred), Part::Unit),
                10..=19 => (matches!(part, Part::Start | Part::Hundred), Part::Teen),
                _ => (matches!(part, Part::Start | Part::Hundred), Part::Tens),
            };
            if !allowed {
                return Err(malformed());
            }
            group += v;
            part = next;
            continue;
        }

        match vocab::scale(word) {
            Some(100) => {
                if part == Part::Hundred || group >= 100 {
                    return Err(malformed());
                }
                group = group.max(1) * 100;
                part = Part::Hundred;
            }
            Some(scale) => {
                if last_scale.is_some_and(|prev| scale >= prev) || (group == 0 && idx > 0) {
                    return Err(malformed());
                }
                let closed = group.max(1).checked_mul(scale).ok_or(ParseError::Overflow)?;
                total = total.checked_add(closed).ok_or(ParseError::Overflow)?;
                group = 0;
                part = Part::Start;
                last_scale = Some(scale);
            }
            None => return Err(malformed()),
        }
    }

    total.checked_add(group).ok_or(ParseError::Overflow)
}

/// Decode a Roman numeral by greedily consuming subtractive pairs
/// (`IX`, `CM`, ...) and single letters, summing as it goes.
pub fn roman_to_int(word: &str) -> Option<i64> {
    let upper = word.to_ascii_uppercase();
    if upper.is_empty() || !upper.is_ascii() {
        return None;
    }

    let lookup = |s: &str| vocab::ROMAN.iter().find(|(r, _)| *r == s).map(|(_, v)| *v);
    let mut total: i64 = 0;
    let mut i = 0;

    while i < upper.len() {
        let pair = upper.get(i..i + 2).and_then(lookup);
        let (value, width) = match pair {
            Some(v) => (v, 2),
            None => (lookup(&upper[i..i + 1])?, 1),
        };
        total = total.checked_add(value)?;
        i += width;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::normalize::normalize;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn cardinal_construction() {
        assert_eq!(words_to_number(&words("twenty one")), Ok(21));
        assert_eq!(words_to_number(&words("three hundred forty two")), Ok(342));
        assert_eq!(
            words_to_number(&words("three hundred forty two thousand five hundred")),
            Ok(342_500)
        );
        assert_eq!(words_to_number(&words("nineteen hundred")), Ok(1900));
        assert_eq!(words_to_number(&words("thousand")), Ok(1000));
        assert_eq!(words_to_number(&words("two million five")), Ok(2_000_005));
    }

    #[test]
    fn ordinals() {
        assert_eq!(words_to_number(&words("fifth")), Ok(5));
        assert_eq!(words_to_number(&words("twentieth")), Ok(20));
        assert_eq!(words_to_number(&words("twenty first")), Ok(21));
        assert_eq!(words_to_number(&words("one hundred fifth")), Ok(105));
        assert!(words_to_number(&words("first two")).is_err());
    }

    #[test]
    fn malformed_runs_fail() {
        assert!(words_to_number(&words("one two")).is_err());
        assert!(words_to_number(&words("thousand thousand")).is_err());
        assert!(words_to_number(&words("twenty thirty")).is_err());
        assert!(words_to_number(&words("one hundred hundred")).is_err());
        assert!(words_to_number(&words("zero one")).is_err());
    }

    #[test]
    fn roman_numerals() {
        assert_eq!(roman_to_int("xiv"), Some(14));
        assert_eq!(roman_to_int("MCMXCIV"), Some(1994));
        assert_eq!(roman_to_int("ix"), Some(9));
        assert_eq!(roman_to_int("lol"), None);
        assert_eq!(roman_to_int("ⅻ"), None);
    }

    #[test]
    fn tokenizer_classes() {
        assert_eq!(
            tokenize("12 plus×(x)"),
            vec![
                Token::Digits("12"),
                Token::Word("plus"),
                Token::Symbol('×'),
                Token::Symbol('('),
                Token::Word("x"),
                Token::Symbol(')'),
            ]
        );
    }

    #[test]
    fn resolves_words_and_operators() {
        assert_eq!(resolve(&normalize("twenty-one")), Ok("21".into()));
        assert_eq!(resolve(&normalize("three times seven")), Ok("3*7".into()));
        assert_eq!(resolve(&normalize("3×7")), Ok("3*7".into()));
        assert_eq!(resolve(&normalize("ten divided by two")), Ok("10/2".into()));
        assert_eq!(resolve(&normalize("two to the power of three")), Ok("2**3".into()));
        assert_eq!(resolve(&normalize("one hundred and five")), Ok("100+5".into()));
        assert_eq!(resolve(&normalize("XIV")), Ok("14".into()));
    }

    #[test]
    fn adjacent_numbers_are_summed() {
        assert_eq!(resolve(&normalize("20 1")), Ok("20+1".into()));
        assert_eq!(resolve(&normalize("twenty 1")), Ok("20+1".into()));
        assert_eq!(resolve(&normalize("x iv")), Ok("*4".into()));
    }

    #[test]
    fn misspelled_words_use_fuzzy_match() {
        assert_eq!(resolve(&normalize("sevn")), Ok("7".into()));
    }

    #[test]
    fn unknown_words_fail_the_whole_message() {
        assert_eq!(
            resolve(&normalize("five apples")),
            Err(ParseError::UnknownWord("apples".into()))
        );
        assert_eq!(resolve(&normalize("21!")), Err(ParseError::UnknownWord("!".into())));
    }

    #[test]
    fn length_limit() {
        let long = vec!["1"; 26].join("+");
        assert!(matches!(resolve(&long), Err(ParseError::TooLong { len: 51, .. })));
        assert_eq!(resolve(""), Err(ParseError::Empty));
    }
}
