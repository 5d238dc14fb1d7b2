//! Error types for the counting engine.

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Invalid engine configuration or operation parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown counting mode: {0}")]
    InvalidMode(String),

    #[error("Mode '{mode}' requires {param}")]
    MissingParam { mode: String, param: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Operation requires '{expected}' mode, session is '{actual}'")]
    ModeMismatch { expected: String, actual: String },
}

/// Session lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("A counting match is already active in channel {channel}")]
    AlreadyActive { channel: String },

    #[error("Counting game is not set up for channel {channel}")]
    NotActive { channel: String },

    #[error("Participant {participant} is not allowed to manage counting games")]
    Unauthorized { participant: String },
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Chat-platform call failures.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Missing permission on channel {name}: {action}")]
    Forbidden { name: String, action: String },
}

/// Reasons a candidate message does not resolve to a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("empty message")]
    Empty,

    #[error("unrecognized word '{0}'")]
    UnknownWord(String),

    #[error("malformed number words '{0}'")]
    MalformedNumber(String),

    #[error("expression is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("character '{0}' is not allowed in an expression")]
    ForbiddenChar(char),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("both sides of '=' must be equal")]
    UnequalSides,

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("result is not a finite number")]
    NotFinite,
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
