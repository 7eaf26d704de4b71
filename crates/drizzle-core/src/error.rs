//! Error types for Drizzle

use thiserror::Error;

/// The main error type for Drizzle operations
#[derive(Debug, Error)]
pub enum DrizzleError {
    #[error("Pool exhausted: {0} is empty and has no factory")]
    PoolExhausted(&'static str),

    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("No camera resolved for {0}")]
    CameraMissing(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Unknown behaviour: {0}")]
    UnknownBehaviour(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Result type alias for Drizzle operations
pub type Result<T> = std::result::Result<T, DrizzleError>;

impl From<toml::de::Error> for DrizzleError {
    fn from(err: toml::de::Error) -> Self {
        DrizzleError::TomlParseError(err.to_string())
    }
}
