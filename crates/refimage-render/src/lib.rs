//! Reference-image caches for refimage-rs.
//!
//! This crate owns everything that moves pixels between a renderer and RAM:
//! - [`ReferenceImage`], a CPU raster paired with a renderer texture and
//!   lazy refresh requests
//! - [`ColorCache`], the per-view pool of full-color slots
//! - [`ItemBuffer`], an off-screen render of encoded simplex keys used for
//!   constant-time picking
//! - [`VisibilityCache`], a downscaled item buffer refreshed on scene changes
//! - [`KeyCodec`] and the [`CapabilityProbe`] that picks one for the
//!   framebuffer at hand
//! - [`GpuSurface`], the wgpu implementation of [`RenderSurface`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
// Pixel coordinates are i32 while extents are u32; conversions are range-checked
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
// Query helpers take many coordinate arguments
#![allow(clippy::too_many_arguments)]

pub mod codec;
pub mod color_cache;
pub mod error;
pub mod gpu;
pub mod item_buffer;
pub mod probe;
pub mod reference_image;
pub mod surface;
pub mod visibility;

#[cfg(test)]
mod test_support;

pub use codec::{select_codec, FullColorCodec, KeyCodec, PackedChannelCodec};
pub use color_cache::ColorCache;
pub use error::{RenderError, RenderResult};
pub use gpu::{DrawContext, GpuSurface, SceneDrawer};
pub use item_buffer::{ItemBuffer, ItemView};
pub use probe::CapabilityProbe;
pub use reference_image::{MaskedMatch, PendingUpdate, PixelView, ReferenceImage, SizePolicy};
pub use surface::{ChannelBits, RenderSurface, RenderTarget, TargetKind, TextureHandle};
pub use visibility::{VisibilityCache, VisibilityState, VisibilityView};
