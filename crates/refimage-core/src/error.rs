//! Error types for refimage-rs.

use thiserror::Error;

use crate::view::ViewId;

/// The main error type for refimage-rs setup operations.
///
/// Picking and pixel reads never return this type; they report failure
/// in-band (`None`, `false`, or zero). Errors are reserved for setup-time
/// work such as building a context or loading options.
#[derive(Error, Debug)]
pub enum RefImageError {
    /// The view has not been registered with the context.
    #[error("view {0} is not registered")]
    ViewNotFound(ViewId),

    /// The view was already registered.
    #[error("view {0} is already registered")]
    ViewExists(ViewId),

    /// A color slot index beyond the configured maximum.
    #[error("color slot {slot} not available (max {max})")]
    SlotOutOfRange { slot: usize, max: usize },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Options failed validation.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Rendering error reported by the renderer collaborator.
    #[error("render error: {0}")]
    RenderError(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for refimage-rs operations.
pub type Result<T> = std::result::Result<T, RefImageError>;
