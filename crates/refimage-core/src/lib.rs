//! Core abstractions for refimage-rs.
//!
//! This crate provides the renderer-independent pieces of the reference-image
//! system:
//! - [`CoordinateFrame`] and [`Raster2D`] for pixel, NDC, and index addressing
//! - packed RGBA color helpers in [`color`]
//! - opaque [`Simplex`] identities, the [`SimplexRegistry`] trait, and
//!   [`SimplexFilter`] predicates
//! - scene change notifications through [`EventBus`]
//! - configuration [`Options`] and the shared error type

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Pixel coordinates are i32 while extents are u32; conversions are range-checked
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod color;
pub mod coords;
pub mod error;
pub mod events;
pub mod filter;
pub mod options;
pub mod raster;
pub mod simplex;
pub mod view;

pub use coords::{CoordinateFrame, Loc};
pub use error::{RefImageError, Result};
pub use events::{EventBus, SceneEvent, SubscriptionId};
pub use filter::{
    AcceptAll, AnySimplex, FrontFacingFace, KindFilter, MeshFilter, PatchFilter, SimplexFilter,
};
pub use options::Options;
pub use raster::Raster2D;
pub use simplex::{
    EdgeId, FaceId, MeshId, PatchId, Simplex, SimplexKey, SimplexKind, SimplexRegistry, VertexId,
};
pub use view::ViewId;

// Re-export glam types for convenience
pub use glam::{DVec2, DVec3, IVec2, Vec3};
