//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path of the JSON document holding every guild's sessions.
    pub data_path: PathBuf,
    /// How long rejection notices stay visible before the platform removes them.
    pub notice_ttl: Duration,
    /// How long replies to management operations stay visible.
    pub command_notice_ttl: Duration,
    /// Interval of the background status summary.
    pub status_interval: Duration,
    /// Skip numbers given to every new session.
    pub default_skip_numbers: Vec<i64>,
    /// Inclusive step range given to every new session (used by `random` mode).
    pub default_random_range: (i64, i64),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("count_data.json"),
            notice_ttl: Duration::from_secs(5),
            command_notice_ttl: Duration::from_secs(10),
            status_interval: Duration::from_secs(300), // 5 minutes
            default_skip_numbers: vec![5, 10],
            default_random_range: (1, 3),
        }
    }
}

impl EngineConfig {
    /// Build a configuration from `COUNTING_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("COUNTING_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }
        if let Some(secs) = env_secs("COUNTING_NOTICE_TTL_SECS")? {
            config.notice_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs("COUNTING_STATUS_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "COUNTING_STATUS_INTERVAL_SECS".into(),
                    message: "must be greater than zero".into(),
                });
            }
            config.status_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn env_secs(key: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => parse_secs(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.default_skip_numbers, vec![5, 10]);
        assert_eq!(config.default_random_range, (1, 3));
        assert_eq!(config.notice_ttl, Duration::from_secs(5));
    }

    #[test]
    fn parse_secs_rejects_garbage() {
        assert_eq!(parse_secs("K", " 42 ").unwrap(), 42);
        let err = parse_secs("K", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "K"));
    }
}
