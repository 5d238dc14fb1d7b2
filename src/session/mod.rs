//! Per-channel counting sessions.

pub mod leaderboard;
pub mod mode;
pub mod registry;

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::ConfigError;

pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use mode::{CountingMode, REVERSE_BASELINE};
pub use registry::GuildRegistry;

/// Upper bound on candidates examined while looking for the next prime.
const PRIME_SEARCH_LIMIT: usize = 10_000;

/// Validated parameters for starting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeConfig {
    pub mode: CountingMode,
    pub multiple: Option<i64>,
    pub custom_sequence: Option<Vec<i64>>,
}

impl ModeConfig {
    /// Validate a mode name plus its raw argument text.
    ///
    /// `multiples` takes a positive integer; `custom` takes a comma-separated
    /// list of integers. Other modes ignore `args`.
    pub fn parse(mode: &str, args: &str) -> Result<Self, ConfigError> {
        let mode: CountingMode = mode.parse()?;
        let args = args.trim();
        let mut config = Self {
            mode,
            multiple: None,
            custom_sequence: None,
        };

        match mode {
            CountingMode::Multiples => {
                let raw = args.split_whitespace().next().ok_or_else(|| ConfigError::MissingParam {
                    mode: mode.to_string(),
                    param: "a multiple".into(),
                })?;
                let multiple = raw
                    .parse::<i64>()
                    .ok()
                    .filter(|m| *m >= 1)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: "multiple".into(),
                        message: "must be a positive integer".into(),
                    })?;
                config.multiple = Some(multiple);
            }
            CountingMode::Custom => {
                if args.is_empty() {
                    return Err(ConfigError::MissingParam {
                        mode: mode.to_string(),
                        param: "a comma-separated sequence of numbers".into(),
                    });
                }
                config.custom_sequence = Some(parse_int_list("custom_sequence", args)?);
            }
            _ => {}
        }

        Ok(config)
    }
}

/// Parse `"5, 10,15"` into integers.
pub fn parse_int_list(key: &str, raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{}' is not an integer", part.trim()),
            })
        })
        .collect()
}

/// A mode rule a correctly sequenced value still broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleViolation {
    NotMultiple(i64),
    NotPrime,
}

/// Counting state bound to one channel. Field names on disk follow the
/// persisted document (`current_count`, `last_user`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSession {
    #[serde(default)]
    pub mode: CountingMode,
    #[serde(rename = "current_count", default)]
    pub current_value: i64,
    #[serde(rename = "last_user", default)]
    pub last_contributor: Option<String>,
    #[serde(default)]
    pub taking_turns: bool,
    #[serde(default)]
    pub leaderboard: Leaderboard,
    #[serde(default = "default_step")]
    pub step: i64,
    #[serde(rename = "skip_numbers", default)]
    pub skip_set: BTreeSet<i64>,
    #[serde(default = "default_random_range")]
    pub random_range: (i64, i64),
    #[serde(default)]
    pub multiple: Option<i64>,
    #[serde(default)]
    pub custom_sequence: Option<Vec<i64>>,
    #[serde(default)]
    pub sequence_index: u64,
    /// Unix seconds of the last commit or reset.
    #[serde(default)]
    pub last_count_time: f64,
    #[serde(rename = "reset_on_wrong_count", default)]
    pub reset_on_wrong: bool,
}

fn default_step() -> i64 {
    1
}

fn default_random_range() -> (i64, i64) {
    (1, 3)
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

impl ChannelSession {
    /// Fresh session at the mode's baseline.
    pub fn new(config: ModeConfig, defaults: &EngineConfig) -> Self {
        // Multiples count up in steps of the multiple: 0, 3, 6, ...
        let step = match (config.mode, config.multiple) {
            (CountingMode::Multiples, Some(m)) => m,
            _ => default_step(),
        };
        Self {
            mode: config.mode,
            current_value: config.mode.baseline(),
            last_contributor: None,
            taking_turns: false,
            leaderboard: Leaderboard::default(),
            step,
            skip_set: defaults.default_skip_numbers.iter().copied().collect(),
            random_range: defaults.default_random_range,
            multiple: config.multiple,
            custom_sequence: config.custom_sequence,
            sequence_index: 0,
            last_count_time: now_secs(),
            reset_on_wrong: false,
        }
    }

    pub fn baseline(&self) -> i64 {
        self.mode.baseline()
    }

    /// The value the next accepted candidate must equal, or `None` when the
    /// sequence has no next value (custom sequence exhausted, overflow).
    ///
    /// `rng` is only drawn from in `random` mode.
    pub fn expected_next<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<i64> {
        let current = self.current_value;
        let step = self.step;
        let n = self.sequence_index.checked_add(1)?;

        match self.mode {
            CountingMode::Normal | CountingMode::Multiples => current.checked_add(step),
            CountingMode::Reverse => current.checked_sub(step),
            CountingMode::Skip => {
                let mut candidate = current.checked_add(step)?;
                // each hit moves past one distinct member, so len + 1 attempts suffice
                for _ in 0..=self.skip_set.len() {
                    if !self.skip_set.contains(&candidate) {
                        return Some(candidate);
                    }
                    candidate = candidate.checked_add(step)?;
                }
                None
            }
            CountingMode::Random => {
                let (a, b) = self.random_range;
                let offset = rng.gen_range(a.min(b)..=a.max(b));
                current.checked_add(offset)
            }
            CountingMode::Prime => {
                let mut candidate = current.checked_add(step)?;
                for _ in 0..PRIME_SEARCH_LIMIT {
                    if is_prime(candidate) {
                        return Some(candidate);
                    }
                    candidate = candidate.checked_add(step)?;
                }
                None
            }
            CountingMode::Fibonacci => fibonacci(self.sequence_index),
            CountingMode::Squares => i64::try_from(n).ok()?.checked_pow(2),
            CountingMode::Cubes => i64::try_from(n).ok()?.checked_pow(3),
            CountingMode::Factorials => factorial(n),
            CountingMode::Custom => {
                let index = usize::try_from(self.sequence_index).ok()?;
                self.custom_sequence.as_ref()?.get(index).copied()
            }
        }
    }

    /// Mode rules layered on top of the sequence check.
    ///
    /// A started session never trips these, since the expected value is
    /// already a multiple or a prime. The multiples rule only fires for a
    /// session loaded from a document whose `step` or `current_count` is not
    /// a multiple of `multiple`.
    pub fn post_validate(&self, value: i64) -> Result<(), RuleViolation> {
        match self.mode {
            CountingMode::Multiples => match self.multiple {
                Some(m) if m != 0 && value % m != 0 => Err(RuleViolation::NotMultiple(m)),
                _ => Ok(()),
            },
            CountingMode::Prime if !is_prime(value) => Err(RuleViolation::NotPrime),
            _ => Ok(()),
        }
    }

    /// Apply an accepted count.
    pub fn commit(&mut self, value: i64, participant: &str) {
        self.current_value = value;
        self.last_contributor = Some(participant.to_string());
        self.last_count_time = now_secs();
        if self.mode.is_index_based() {
            self.sequence_index += 1;
        }
        self.leaderboard.record(participant);
    }

    /// Return to the baseline, keeping configuration.
    pub fn reset(&mut self) {
        self.current_value = self.baseline();
        self.sequence_index = 0;
        self.last_contributor = None;
        self.leaderboard.clear();
        self.last_count_time = now_secs();
    }
}

/// Trial division up to ⌊√n⌋.
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d: i64 = 3;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// `k`-th term of 0, 1, 1, 2, 3, 5, ...
fn fibonacci(k: u64) -> Option<i64> {
    let (mut a, mut b): (i64, i64) = (0, 1);
    for _ in 0..k {
        let next = a.checked_add(b)?;
        a = b;
        b = next;
    }
    Some(a)
}

fn factorial(n: u64) -> Option<i64> {
    (2..=n).try_fold(1i64, |acc, k| acc.checked_mul(i64::try_from(k).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn session(mode: &str, args: &str) -> ChannelSession {
        let config = ModeConfig::parse(mode, args).unwrap();
        ChannelSession::new(config, &EngineConfig::default())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn mode_config_validation() {
        assert_eq!(ModeConfig::parse("multiples", "3").unwrap().multiple, Some(3));
        assert!(matches!(
            ModeConfig::parse("multiples", ""),
            Err(ConfigError::MissingParam { .. })
        ));
        assert!(matches!(
            ModeConfig::parse("multiples", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            ModeConfig::parse("multiples", "three"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(
            ModeConfig::parse("custom", "1, 4,9").unwrap().custom_sequence,
            Some(vec![1, 4, 9])
        );
        assert!(matches!(
            ModeConfig::parse("custom", "1,,2"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            ModeConfig::parse("custom", " "),
            Err(ConfigError::MissingParam { .. })
        ));
        assert!(matches!(ModeConfig::parse("nope", ""), Err(ConfigError::InvalidMode(_))));
    }

    #[test]
    fn new_session_defaults() {
        let s = session("normal", "");
        assert_eq!(s.current_value, 0);
        assert_eq!(s.step, 1);
        assert_eq!(s.skip_set, BTreeSet::from([5, 10]));
        assert_eq!(s.random_range, (1, 3));
        assert!(!s.taking_turns);
        assert!(!s.reset_on_wrong);
        assert_eq!(session("reverse", "").current_value, REVERSE_BASELINE);
    }

    #[test]
    fn forward_and_reverse() {
        let mut s = session("normal", "");
        assert_eq!(s.expected_next(&mut rng()), Some(1));
        s.commit(1, "a");
        assert_eq!(s.expected_next(&mut rng()), Some(2));

        let s = session("reverse", "");
        assert_eq!(s.expected_next(&mut rng()), Some(999));
    }

    #[test]
    fn skip_mode_never_expects_a_skipped_number() {
        let mut s = session("skip", "");
        s.skip_set = BTreeSet::from([5, 6, 10]);
        s.current_value = 4;
        assert_eq!(s.expected_next(&mut rng()), Some(7));
        for current in 0..30 {
            s.current_value = current;
            let next = s.expected_next(&mut rng()).unwrap();
            assert!(!s.skip_set.contains(&next));
        }
    }

    #[test]
    fn skip_mode_with_zero_step_gives_up() {
        let mut s = session("skip", "");
        s.step = 0;
        s.current_value = 5;
        assert_eq!(s.expected_next(&mut rng()), None);
    }

    #[test]
    fn random_mode_stays_in_range() {
        let mut s = session("random", "");
        s.current_value = 10;
        let mut r = rng();
        for _ in 0..100 {
            let next = s.expected_next(&mut r).unwrap();
            assert!((11..=13).contains(&next));
        }
    }

    #[test]
    fn index_based_sequences() {
        let mut fib = session("fibonacci", "");
        let mut squares = session("squares", "");
        let mut cubes = session("cubes", "");
        let mut facts = session("factorials", "");
        let mut seen = (vec![], vec![], vec![], vec![]);
        for _ in 0..6 {
            let f = fib.expected_next(&mut rng()).unwrap();
            let s = squares.expected_next(&mut rng()).unwrap();
            let c = cubes.expected_next(&mut rng()).unwrap();
            let x = facts.expected_next(&mut rng()).unwrap();
            seen.0.push(f);
            seen.1.push(s);
            seen.2.push(c);
            seen.3.push(x);
            fib.commit(f, "p");
            squares.commit(s, "p");
            cubes.commit(c, "p");
            facts.commit(x, "p");
        }
        assert_eq!(seen.0, vec![0, 1, 1, 2, 3, 5]);
        assert_eq!(seen.1, vec![1, 4, 9, 16, 25, 36]);
        assert_eq!(seen.2, vec![1, 8, 27, 64, 125, 216]);
        assert_eq!(seen.3, vec![1, 2, 6, 24, 120, 720]);
    }

    #[test]
    fn factorial_overflow_ends_the_sequence() {
        let mut s = session("factorials", "");
        s.sequence_index = 20;
        assert_eq!(s.expected_next(&mut rng()), None);
        s.sequence_index = 19;
        assert_eq!(s.expected_next(&mut rng()), Some(2_432_902_008_176_640_000));
    }

    #[test]
    fn custom_sequence_exhausts() {
        let mut s = session("custom", "2, 4");
        assert_eq!(s.expected_next(&mut rng()), Some(2));
        s.commit(2, "a");
        assert_eq!(s.expected_next(&mut rng()), Some(4));
        s.commit(4, "b");
        assert_eq!(s.expected_next(&mut rng()), None);
    }

    #[test]
    fn multiples_step_by_the_multiple() {
        let mut s = session("multiples", "3");
        assert_eq!(s.expected_next(&mut rng()), Some(3));
        s.commit(3, "a");
        assert_eq!(s.expected_next(&mut rng()), Some(6));
        assert_eq!(s.post_validate(6), Ok(()));
        assert_eq!(s.post_validate(7), Err(RuleViolation::NotMultiple(3)));
    }

    #[test]
    fn prime_mode_expects_next_prime() {
        let mut s = session("prime", "");
        assert_eq!(s.expected_next(&mut rng()), Some(2));
        s.commit(2, "a");
        assert_eq!(s.expected_next(&mut rng()), Some(3));
        s.commit(3, "b");
        assert_eq!(s.expected_next(&mut rng()), Some(5));
        assert_eq!(s.post_validate(9), Err(RuleViolation::NotPrime));
    }

    #[test]
    fn primality() {
        let primes: Vec<i64> = (0..30).filter(|n| is_prime(*n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(!is_prime(-7));
        assert!(is_prime(1_000_000_007));
    }

    #[test]
    fn commit_and_reset() {
        let mut s = session("squares", "");
        s.commit(1, "alice");
        s.commit(4, "bob");
        assert_eq!(s.sequence_index, 2);
        assert_eq!(s.last_contributor.as_deref(), Some("bob"));
        assert_eq!(s.leaderboard.len(), 2);

        s.reset();
        assert_eq!(s.current_value, 0);
        assert_eq!(s.sequence_index, 0);
        assert_eq!(s.last_contributor, None);
        assert!(s.leaderboard.is_empty());
    }

    #[test]
    fn non_index_modes_keep_index_at_zero() {
        let mut s = session("normal", "");
        s.commit(1, "alice");
        assert_eq!(s.sequence_index, 0);
    }

    #[test]
    fn deserializes_sparse_documents() {
        let s: ChannelSession =
            serde_json::from_str(r#"{"mode": "reverse", "current_count": 990, "prime_numbers": []}"#)
                .unwrap();
        assert_eq!(s.mode, CountingMode::Reverse);
        assert_eq!(s.current_value, 990);
        assert_eq!(s.step, 1);
        assert_eq!(s.random_range, (1, 3));
        assert!(s.leaderboard.is_empty());
    }
}
