//! Error types for the footfall pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, FootfallError>;

/// Errors raised by the collaborators around the crossing counter.
///
/// The counter itself is total and never produces one of these.
#[derive(Error, Debug)]
pub enum FootfallError {
    #[error("cannot open input source {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("cannot open output sink {path}: {reason}")]
    SinkUnavailable { path: PathBuf, reason: String },

    #[error("detection failed on frame {frame}: {reason}")]
    Detection { frame: u64, reason: String },

    #[error("tracking failed on frame {frame}: {reason}")]
    Tracking { frame: u64, reason: String },

    #[error("cannot read frame {frame}: {reason}")]
    Frame { frame: u64, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FootfallError {
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn sink_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SinkUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
