//! Candidate parsing pipeline: normalizer → resolver → evaluator.
//!
//! Every stage is a pure function of its input and the static vocabulary
//! tables, so parsing runs outside the engine lock and may run concurrently.

pub mod eval;
pub mod fuzzy;
pub mod normalize;
pub mod resolve;
pub mod vocab;

use crate::error::ParseError;

pub use eval::evaluate;
pub use fuzzy::FUZZY_CUTOFF;
pub use normalize::normalize;
pub use resolve::{resolve, MAX_EXPRESSION_LEN};

/// Result of parsing one candidate message.
pub type ParseOutcome = Result<i64, ParseError>;

/// Parse free-form candidate text ("twenty-one", "3×7", "XIV", "a dozen")
/// into an integer.
pub fn parse_candidate(text: &str) -> ParseOutcome {
    let normalized = normalize(text);
    if normalized.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let expr = resolve(&normalized)?;
    evaluate(&expr)
}
