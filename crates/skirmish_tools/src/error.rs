//! Error types for the development tools.

use skirmish_core::error::CombatError;
use thiserror::Error;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Failures the tools report before or instead of a finished report.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The data directory does not exist.
    #[error("Data directory not found: {0}")]
    DirectoryNotFound(String),

    /// Reading a file or directory failed.
    #[error("IO error at {path}: {message}")]
    Io {
        /// Path being read.
        path: String,
        /// Underlying error text.
        message: String,
    },

    /// The rules core rejected an input.
    #[error(transparent)]
    Combat(#[from] CombatError),

    /// JSON output could not be produced.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
