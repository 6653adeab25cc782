//! refimage-rs: off-screen reference images for picking and image-space
//! shading.
//!
//! A reference image is a render of the scene kept in RAM and/or texture
//! memory and refreshed only when asked. Three kinds sit on top of it:
//!
//! - **color slots** ([`ColorCache`]) hold full-color renders for
//!   image-space effects;
//! - the **item buffer** ([`ItemBuffer`]) draws every primitive with its
//!   encoded key, turning picking into a pixel lookup;
//! - the **visibility cache** ([`VisibilityCache`]) is a downscaled item
//!   buffer that follows scene changes through an [`EventBus`].
//!
//! All of them are owned per view by a [`RefImageContext`].
//!
//! # Quick Start
//!
//! ```no_run
//! use refimage::*;
//!
//! fn pick(
//!     surface: &mut dyn RenderSurface,
//!     registry: &dyn SimplexRegistry,
//! ) -> Result<Option<Simplex>> {
//!     init_logging();
//!     let mut ctx = RefImageContext::for_surface(Options::default(), surface)?;
//!     let view = ViewId(0);
//!     ctx.register_view(view)?;
//!     ctx.schedule_item_update(view, false, true, false)?;
//!     ctx.update_all(view, surface, registry)?;
//!
//!     let items = ctx.item_view(view, surface, registry);
//!     Ok(items.and_then(|items| items.find_near_simplex(DVec2::ZERO, 3.0, &AnySimplex)))
//! }
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod context;
pub mod headless;

pub use context::RefImageContext;
pub use headless::create_headless_surface;

// Re-export core types
pub use refimage_core::{
    color,
    error::{RefImageError, Result},
    filter::{And, Not, Or},
    AcceptAll, AnySimplex, CoordinateFrame, DVec2, DVec3, EdgeId, EventBus, FaceId,
    FrontFacingFace, IVec2, KindFilter, Loc, MeshFilter, MeshId, Options, PatchFilter, PatchId,
    Raster2D, SceneEvent, Simplex, SimplexFilter, SimplexKey, SimplexKind, SimplexRegistry,
    SubscriptionId, Vec3, VertexId, ViewId,
};

// Re-export render types
pub use refimage_render::{
    select_codec, CapabilityProbe, ChannelBits, ColorCache, DrawContext, FullColorCodec,
    GpuSurface, ItemBuffer, ItemView, KeyCodec, MaskedMatch, PackedChannelCodec, PendingUpdate,
    PixelView, ReferenceImage, RenderError, RenderResult, RenderSurface, RenderTarget,
    SceneDrawer, SizePolicy, TargetKind, TextureHandle, VisibilityCache, VisibilityState,
    VisibilityView,
};

/// Installs `env_logger` as the log backend. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
