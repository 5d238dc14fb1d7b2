//! Counting modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Starting value of a `reverse` session.
pub const REVERSE_BASELINE: i64 = 1000;

/// Sequence-generation strategy of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingMode {
    #[default]
    Normal,
    Reverse,
    Skip,
    Random,
    Multiples,
    Prime,
    Fibonacci,
    Squares,
    Cubes,
    Factorials,
    Custom,
}

impl CountingMode {
    pub const ALL: [CountingMode; 11] = [
        Self::Normal,
        Self::Reverse,
        Self::Skip,
        Self::Random,
        Self::Multiples,
        Self::Prime,
        Self::Fibonacci,
        Self::Squares,
        Self::Cubes,
        Self::Factorials,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Reverse => "reverse",
            Self::Skip => "skip",
            Self::Random => "random",
            Self::Multiples => "multiples",
            Self::Prime => "prime",
            Self::Fibonacci => "fibonacci",
            Self::Squares => "squares",
            Self::Cubes => "cubes",
            Self::Factorials => "factorials",
            Self::Custom => "custom",
        }
    }

    /// Modes whose expected value is derived from `sequence_index` rather
    /// than from the current value.
    pub fn is_index_based(&self) -> bool {
        matches!(
            self,
            Self::Fibonacci | Self::Squares | Self::Cubes | Self::Factorials | Self::Custom
        )
    }

    /// Value a session starts from and returns to on reset.
    pub fn baseline(&self) -> i64 {
        match self {
            Self::Reverse => REVERSE_BASELINE,
            _ => 0,
        }
    }
}

impl fmt::Display for CountingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CountingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| ConfigError::InvalidMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Fibonacci".parse::<CountingMode>().unwrap(), CountingMode::Fibonacci);
        assert_eq!(" skip ".parse::<CountingMode>().unwrap(), CountingMode::Skip);
        assert!(matches!(
            "sideways".parse::<CountingMode>(),
            Err(ConfigError::InvalidMode(m)) if m == "sideways"
        ));
    }

    #[test]
    fn display_round_trips() {
        for mode in CountingMode::ALL {
            assert_eq!(mode.to_string().parse::<CountingMode>().unwrap(), mode);
        }
    }

    #[test]
    fn baselines_and_index_modes() {
        assert_eq!(CountingMode::Reverse.baseline(), REVERSE_BASELINE);
        assert_eq!(CountingMode::Normal.baseline(), 0);
        assert!(CountingMode::Custom.is_index_based());
        assert!(!CountingMode::Skip.is_index_based());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&CountingMode::Factorials).unwrap();
        assert_eq!(json, "\"factorials\"");
    }
}
