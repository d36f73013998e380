//! Error types for ShapeCAD

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapecadError {
    // Input errors
    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unreadable {format} input: {message}")]
    UnreadableFormat { format: String, message: String },

    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    // CRS errors
    #[error("Unsupported CRS: {reason}")]
    UnsupportedCrs { reason: String },

    // Conversion errors
    #[error("No convertible geometries found ({skipped} entities skipped)")]
    EmptyResult { skipped: usize },

    #[error("Conversion cancelled")]
    Cancelled,

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShapecadError {
    /// Shorthand for an [`ShapecadError::UnreadableFormat`] error
    pub fn unreadable(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnreadableFormat { format: format.into(), message: message.into() }
    }

    /// Shorthand for an [`ShapecadError::WriteFailed`] error
    pub fn write_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::WriteFailed { path: path.into(), reason: reason.into() }
    }

    /// Classify this error into the conversion error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShapecadError::InputNotFound { .. } => ErrorKind::InputNotFound,
            ShapecadError::UnreadableFormat { .. } => ErrorKind::UnreadableFormat,
            ShapecadError::InvalidGeometry { .. } => ErrorKind::UnreadableFormat,
            ShapecadError::UnsupportedCrs { .. } => ErrorKind::UnsupportedCrs,
            ShapecadError::EmptyResult { .. } => ErrorKind::EmptyResult,
            ShapecadError::Cancelled => ErrorKind::Cancelled,
            ShapecadError::WriteFailed { .. } => ErrorKind::WriteFailed,
            ShapecadError::ConfigInvalid { .. } => ErrorKind::ConfigInvalid,
            ShapecadError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::InputNotFound
            }
            ShapecadError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Error taxonomy surfaced to callers of the conversion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InputNotFound,
    UnreadableFormat,
    UnsupportedCrs,
    EmptyResult,
    Cancelled,
    WriteFailed,
    ConfigInvalid,
    Io,
}

pub type Result<T> = std::result::Result<T, ShapecadError>;
