//! Error types for the annotation overlay.

use folio_scene::ColorParseError;
use thiserror::Error;

/// Result type for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;

#[derive(Error, Debug)]
pub enum OverlayError {
    /// No drawing preset is registered under this name.
    #[error("unknown draw style: {0}")]
    UnknownStyle(String),

    #[error("unknown writing mode: {0}")]
    UnknownWritingMode(String),

    #[error(transparent)]
    Color(#[from] ColorParseError),
}
