//! Error types for the barrex export toolkit.
//!
//! Three failure families matter to callers: missing prerequisites (fatal,
//! abort the run), export failures (fatal, reported with the subprocess
//! message), and verification failures (non-fatal, downgraded to warnings
//! at the call site).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for barrex operations.
#[derive(Debug, Error)]
pub enum BarrexError {
    // Missing prerequisites
    #[error("Model file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Dependency probe failed: {message}")]
    ProbeFailed {
        message: String,
        /// Remediation hint shown to the user (e.g. a pip install line)
        hint: Option<String>,
    },

    // Export stage
    #[error("Export failed: {message}")]
    ExportFailed { message: String },

    // Verification stage (callers report this as a warning, never fatal)
    #[error("Verification failed: {message}")]
    VerifyFailed { message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for barrex operations.
pub type Result<T> = std::result::Result<T, BarrexError>;

impl From<std::io::Error> for BarrexError {
    fn from(err: std::io::Error) -> Self {
        BarrexError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for BarrexError {
    fn from(err: serde_json::Error) -> Self {
        BarrexError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl BarrexError {
    /// Create an IO error with path context.
    pub fn io(message: impl Into<String>, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        BarrexError::Io {
            message: message.into(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True if this error must abort the whole run (spec families a and b).
    ///
    /// Verification failures are the only non-fatal family: they are printed
    /// as warnings and never overturn a successful export.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BarrexError::VerifyFailed { .. })
    }
}
