//! Error types for the fixed-layout engine.

use thiserror::Error;

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors that can occur while loading and laying out spreads.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A section's content could not be produced.
    #[error("failed to load section {section}: {reason}")]
    Load { section: usize, reason: String },

    /// An attribute value that cannot be interpreted.
    #[error("invalid value {value:?} for {name}")]
    InvalidAttribute { name: &'static str, value: String },
}
