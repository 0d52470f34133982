//! Error types for reporting and rendering

use crate::error::Error as CrateError;
use std::path::PathBuf;
use thiserror::Error;

/// Error writing the summary report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error rendering the word cloud
#[derive(Debug, Error)]
pub enum RenderError {
    /// None of the candidate font files exists
    #[error("No usable font found (tried {0:?})")]
    FontNotFound(Vec<PathBuf>),

    /// The font file exists but could not be parsed
    #[error("Failed to load font {path}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    /// The text held no words to draw
    #[error("Nothing to render")]
    NoWords,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<ReportError> for CrateError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Io(e) => CrateError::Io(e),
            ReportError::Json(e) => CrateError::Json(e),
        }
    }
}
