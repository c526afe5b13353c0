//src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the library can report.
///
/// Malformed input records are not errors: the reader skips them.
#[derive(Debug, Error)]
pub enum PacificError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid tokenizer: {0}")]
    InvalidTokenizer(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid label encoder: {0}")]
    InvalidLabels(String),

    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("JSON error in '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("none processed reads")]
    NoProcessedReads,
}

impl PacificError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PacificError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PacificError::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PacificError>;
