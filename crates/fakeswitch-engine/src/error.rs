//! Error types for the command-processing engine.

use thiserror::Error;

/// Errors raised while parsing a pipe command.
#[derive(Debug, Error)]
pub enum PipeError {
    /// The filter keyword is not one we know.
    #[error("unknown pipe command: {0}")]
    UnknownCommand(String),

    /// The filter keyword was given without a pattern.
    #[error("pipe command '{0}' requires a pattern")]
    MissingPattern(String),

    /// The pattern is not a valid regular expression.
    #[error("invalid pipe pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Errors raised when launching sessions.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested shell variant does not exist.
    #[error("unknown shell variant: {0}")]
    UnknownVariant(String),

    /// The device is configured for a mode this core cannot serve.
    #[error("unsupported protocol mode: {0}")]
    UnsupportedMode(String),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
