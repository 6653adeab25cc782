//! Rendering error types.

use refimage_core::RefImageError;
use thiserror::Error;

use crate::surface::TextureHandle;

/// Errors raised by a render surface.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// The surface has no view with this id.
    #[error("surface has no view {0}")]
    ViewUnavailable(refimage_core::ViewId),

    /// Texture creation failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// A texture handle that the surface never issued or already dropped.
    #[error("unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),

    /// Pixel buffer size does not match the requested extent.
    #[error("pixel buffer size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Mapping the readback buffer failed.
    #[error("readback failed: {0}")]
    ReadbackFailed(String),

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for RefImageError {
    fn from(err: RenderError) -> Self {
        RefImageError::RenderError(err.to_string())
    }
}
