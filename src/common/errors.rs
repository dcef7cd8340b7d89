//! Error types for the signal router

use thiserror::Error;

/// Result type alias using our RouterError
pub type Result<T> = std::result::Result<T, RouterError>;

/// Main error type for router operations
///
/// Guard rejections and sizing skips are NOT errors; they are normal
/// decision outcomes carried in a `SignalOutcome`. This enum covers
/// everything that is genuinely a failure.
#[derive(Error, Debug)]
pub enum RouterError {
    /// Malformed signal (unknown side, missing symbol)
    #[error("Invalid signal: {0}")]
    Validation(String),

    /// Order placement rejected by the venue (insufficient funds,
    /// invalid parameters). Carries the venue's detail, never retried here.
    #[error("Venue rejected request: {0}")]
    Venue(String),

    /// Network failure talking to an oracle or the order placer
    #[error("Transport error: {0}")]
    Transport(String),

    /// A venue call exceeded its time budget
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RouterError {
    /// Short classification tag for logging and response mapping
    pub fn classification(&self) -> &'static str {
        match self {
            RouterError::Validation(_) => "validation",
            RouterError::Venue(_) => "venue",
            RouterError::Transport(_) => "transport",
            RouterError::Timeout(_) => "timeout",
            RouterError::Configuration(_) => "configuration",
            RouterError::Internal(_) => "internal",
        }
    }
}
