//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 5s, 10s, 1m)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when an unknown capture encoding is named
#[derive(Debug, Clone, Error)]
#[error("Invalid encoding: \"{input}\". Valid encodings are: flac, wav")]
pub struct InvalidEncodingError {
    pub input: String,
}

/// Error when a recording produced no audio bytes at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No audio was captured")]
pub struct EmptySampleError;

/// Error when a match payload violates the result contract
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidMatchResult {
    #[error("Match offset must be a non-negative number, got {0}")]
    InvalidOffset(f64),
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
