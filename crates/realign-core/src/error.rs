//! Error types for the transform engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::Slot;

/// Errors that can occur while loading, transforming or saving an image.
///
/// Every engine operation that returns one of these leaves the engine state
/// (current data, transform history and samplerate) exactly as it was.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source image is missing or could not be decoded.
    #[error("failed to load image {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// A transform file or output image could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transform history file is malformed.
    #[error("malformed transform file: {0}")]
    Parse(String),

    /// An operation was given a parameter outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Raster encoding failed for a reason other than I/O.
    #[error("image encoding failed: {0}")]
    Encode(String),

    /// Two grids that must share a shape do not.
    #[error(
        "dimension mismatch: {left_width}x{left_height}x{left_channels} vs \
         {right_width}x{right_height}x{right_channels}"
    )]
    DimensionMismatch {
        left_width: u32,
        left_height: u32,
        left_channels: u8,
        right_width: u32,
        right_height: u32,
        right_channels: u8,
    },

    /// The session slot has no image loaded yet.
    #[error("no image loaded in slot {0}")]
    NotLoaded(Slot),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EngineError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
