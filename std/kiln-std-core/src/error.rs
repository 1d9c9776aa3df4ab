///
/// Error types for holder construction and configuration loading.
///
/// Row-level kernel failures are not Rust errors: they are recorded as messages
/// on the execution context. These types cover the fallible setup steps that
/// happen before any row is evaluated.
///

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HolderError {
    #[error("No function holder for '{0}'")]
    UnknownFunction(String),

    #[error("'{function}' expects {expected} literal argument(s), got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("'{function}' literal argument {index} must be {expected}")]
    LiteralType {
        function: String,
        index: usize,
        expected: &'static str,
    },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid escape character '{0}', must be exactly one character")]
    InvalidEscape(String),

    #[error("Invalid format '{format}': {reason}")]
    InvalidFormat { format: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
