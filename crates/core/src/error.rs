//! Error types for the Brainstem domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator has its own error enum; none of them is ever fatal to
//! the decision engine.

use thiserror::Error;

/// The top-level error type for Brainstem operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- World interface errors ---
    #[error("World error: {0}")]
    World(#[from] WorldError),

    // --- Dialogue errors ---
    #[error("Dialogue error: {0}")]
    Dialogue(#[from] DialogueError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorldError {
    #[error("World interface unavailable: {0}")]
    Unavailable(String),

    #[error("Command {command} failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Agent has no position yet")]
    NoPosition,

    #[error("Block collection failed at {position}: {reason}")]
    CollectFailed { position: String, reason: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl WorldError {
    /// Shorthand for a failed fire-and-forget command.
    pub fn command(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DialogueError {
    #[error("Dialogue provider disabled")]
    Disabled,

    #[error("Dialogue request failed: {message} (status: {status_code})")]
    Request { status_code: u16, message: String },

    #[error("Dialogue provider returned no text")]
    Empty,

    #[error("Dialogue request timed out after {0}ms")]
    Timeout(u64),

    #[error("Rate limited by dialogue provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),
}
