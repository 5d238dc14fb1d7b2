//! Static vocabulary tables shared by the normalizer and the resolver.

/// Units and teens.
pub const UNITS: &[(&str, i64)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

pub const TENS: &[(&str, i64)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

/// Magnitude words. `hundred` multiplies the current group; the rest close it.
pub const SCALES: &[(&str, i64)] = &[
    ("hundred", 100),
    ("thousand", 1_000),
    ("million", 1_000_000),
    ("billion", 1_000_000_000),
    ("trillion", 1_000_000_000_000),
];

pub const ORDINALS: &[(&str, i64)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
    ("thirteenth", 13),
    ("fourteenth", 14),
    ("fifteenth", 15),
    ("sixteenth", 16),
    ("seventeenth", 17),
    ("eighteenth", 18),
    ("nineteenth", 19),
    ("twentieth", 20),
];

/// Quantity phrases replaced by their digits before tokenization.
pub const QUANTITY_PHRASES: &[(&str, i64)] = &[
    ("a couple", 2),
    ("a few", 3),
    ("several", 7),
    ("a dozen", 12),
    ("half a dozen", 6),
    ("a half dozen", 6),
    ("a bakers dozen", 13),
    ("a score", 20),
    ("a gross", 144),
    ("a hundred", 100),
    ("a thousand", 1_000),
    ("a million", 1_000_000),
    ("one million", 1_000_000),
    ("a billion", 1_000_000_000),
    ("one billion", 1_000_000_000),
];

/// Keycap and pictographic digit glyphs. Fully qualified keycaps come first so
/// the bare `digit + U+20E3` form never leaves a stray variation selector.
pub const DIGIT_GLYPHS: &[(&str, &str)] = &[
    ("0\u{FE0F}\u{20E3}", "0"),
    ("1\u{FE0F}\u{20E3}", "1"),
    ("2\u{FE0F}\u{20E3}", "2"),
    ("3\u{FE0F}\u{20E3}", "3"),
    ("4\u{FE0F}\u{20E3}", "4"),
    ("5\u{FE0F}\u{20E3}", "5"),
    ("6\u{FE0F}\u{20E3}", "6"),
    ("7\u{FE0F}\u{20E3}", "7"),
    ("8\u{FE0F}\u{20E3}", "8"),
    ("9\u{FE0F}\u{20E3}", "9"),
    ("0\u{20E3}", "0"),
    ("1\u{20E3}", "1"),
    ("2\u{20E3}", "2"),
    ("3\u{20E3}", "3"),
    ("4\u{20E3}", "4"),
    ("5\u{20E3}", "5"),
    ("6\u{20E3}", "6"),
    ("7\u{20E3}", "7"),
    ("8\u{20E3}", "8"),
    ("9\u{20E3}", "9"),
    ("\u{1F51F}", "10"),
];

/// Multi-word operator phrases collapsed into one token before tokenization.
pub const OPERATOR_PHRASES: &[(&str, &str)] = &[
    ("to the power of", "tothepowerof"),
    ("multiplied by", "multipliedby"),
    ("divided by", "dividedby"),
    ("power of", "powerof"),
];

/// Word and glyph operators mapped to expression symbols.
pub const OPERATOR_WORDS: &[(&str, &str)] = &[
    ("plus", "+"),
    ("minus", "-"),
    ("times", "*"),
    ("multipliedby", "*"),
    ("multiplied", "*"),
    ("multiply", "*"),
    ("x", "*"),
    ("×", "*"),
    ("dividedby", "/"),
    ("divided", "/"),
    ("divide", "/"),
    ("over", "/"),
    ("powerof", "**"),
    ("tothepowerof", "**"),
    ("equals", "="),
    ("equal", "="),
    ("and", "+"),
];

/// Symbols passed straight through to the expression.
pub const OPERATOR_SYMBOLS: &[char] = &['+', '-', '*', '/', '^', '(', ')', '=', '.'];

/// Roman numeral pairs and singles.
pub const ROMAN: &[(&str, i64)] = &[
    ("CM", 900),
    ("CD", 400),
    ("XC", 90),
    ("XL", 40),
    ("IX", 9),
    ("IV", 4),
    ("M", 1000),
    ("D", 500),
    ("C", 100),
    ("L", 50),
    ("X", 10),
    ("V", 5),
    ("I", 1),
];

fn lookup(table: &[(&str, i64)], word: &str) -> Option<i64> {
    table.iter().find(|(name, _)| *name == word).map(|(_, v)| *v)
}

pub fn unit(word: &str) -> Option<i64> {
    lookup(UNITS, word)
}

pub fn tens(word: &str) -> Option<i64> {
    lookup(TENS, word)
}

pub fn scale(word: &str) -> Option<i64> {
    lookup(SCALES, word)
}

pub fn ordinal(word: &str) -> Option<i64> {
    lookup(ORDINALS, word)
}

pub fn operator(token: &str) -> Option<&'static str> {
    OPERATOR_WORDS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, sym)| *sym)
}

/// Every word a number-word run may contain: cardinals, magnitudes and ordinals.
pub fn number_words() -> impl Iterator<Item = &'static str> {
    UNITS
        .iter()
        .chain(TENS)
        .chain(SCALES)
        .chain(ORDINALS)
        .map(|(word, _)| *word)
}

pub fn is_number_word(word: &str) -> bool {
    number_words().any(|w| w == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_word_vocabulary() {
        assert!(is_number_word("seventeen"));
        assert!(is_number_word("trillion"));
        assert!(is_number_word("twentieth"));
        assert!(!is_number_word("and"));
        assert_eq!(number_words().count(), 53);
    }

    #[test]
    fn operator_table() {
        assert_eq!(operator("times"), Some("*"));
        assert_eq!(operator("×"), Some("*"));
        assert_eq!(operator("tothepowerof"), Some("**"));
        assert_eq!(operator("by"), None);
    }
}
