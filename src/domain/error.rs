//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration: \"{input}\". Use a number followed by ms, s or m (e.g. 500ms, 15s, 1m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when an unsupported locale code is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid language: \"{input}\". Valid languages are: en, hi, ta, te, bn")]
pub struct InvalidLocaleError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
