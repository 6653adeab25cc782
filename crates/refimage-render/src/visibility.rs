//! Frame-coherent visibility queries.
//!
//! A [`VisibilityCache`] is a downscaled item buffer that re-renders itself
//! after scene changes. Any observed [`SceneEvent`] marks it dirty; it is
//! re-rendered on each [`VisibilityCache::vis_update`] until it has been
//! refreshed `settle_threshold` times with no intervening event.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use glam::{DVec2, DVec3};
use refimage_core::{
    AnySimplex, EdgeId, EventBus, FaceId, FrontFacingFace, KindFilter, MeshId, Options, PatchId,
    SceneEvent, Simplex, SimplexFilter, SimplexRegistry, SubscriptionId, VertexId, ViewId,
};

use crate::codec::KeyCodec;
use crate::error::RenderResult;
use crate::item_buffer::{ItemBuffer, ItemView};
use crate::reference_image::SizePolicy;
use crate::surface::{RenderSurface, TargetKind};

/// Freshness of a visibility cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    /// The scene changed since the last render.
    Dirty,
    /// Rendered this many times since the last change, not yet settled.
    Settling(u32),
    /// Settled; no refresh needed until the next change.
    Clean,
}

/// Visibility item buffer of one view.
#[derive(Debug)]
pub struct VisibilityCache {
    items: ItemBuffer,
    state: Rc<Cell<VisibilityState>>,
    threshold: u32,
    subscription: Option<SubscriptionId>,
}

impl VisibilityCache {
    pub fn new(view: ViewId, codec: Arc<dyn KeyCodec>, options: &Options) -> Self {
        let items = ItemBuffer::with_policy(
            view,
            codec,
            options,
            TargetKind::Visibility,
            SizePolicy::ShortSideAtMost(options.visibility_max_short_side),
        );
        Self {
            items,
            state: Rc::new(Cell::new(VisibilityState::Dirty)),
            threshold: options.settle_threshold.max(1),
            subscription: None,
        }
    }

    pub fn view_id(&self) -> ViewId {
        self.items.view_id()
    }

    pub fn items(&self) -> &ItemBuffer {
        &self.items
    }

    pub fn state(&self) -> VisibilityState {
        self.state.get()
    }

    /// Marks the cache dirty.
    pub fn reset(&self) {
        self.state.set(VisibilityState::Dirty);
    }

    /// Resizes for a view of `width x height`, downscaled by the cache's
    /// size policy. A size change marks the cache dirty.
    pub fn resize(&mut self, width: u32, height: u32, ndc_offset: DVec2) -> bool {
        let (w, h) = self.items.image().policy().size_for(width, height);
        let resized = self.items.resize(w, h, ndc_offset);
        if resized {
            self.reset();
        }
        resized
    }

    // ========== Observation ==========

    /// Subscribes to scene changes affecting this view. Replaces an earlier
    /// subscription on the same bus.
    pub fn observe(&mut self, bus: &mut EventBus) {
        self.unobserve(bus);
        let state = Rc::clone(&self.state);
        let view = self.view_id();
        self.subscription = Some(bus.subscribe(move |event: &SceneEvent| {
            if event.affects(view) {
                state.set(VisibilityState::Dirty);
            }
        }));
    }

    pub fn unobserve(&mut self, bus: &mut EventBus) {
        if let Some(id) = self.subscription.take() {
            bus.unsubscribe(id);
        }
    }

    pub fn is_observing(&self) -> bool {
        self.subscription.is_some()
    }

    // ========== Refresh ==========

    /// Whether anything is unsettled. Resizes to the view first; a resize
    /// marks the cache dirty.
    pub fn need_update(&mut self, surface: &dyn RenderSurface) -> bool {
        if self.items.check_resize(surface) {
            self.reset();
        }
        self.is_dirty()
    }

    /// Whether the cache is unsettled, without checking the view size.
    pub fn is_dirty(&self) -> bool {
        self.state.get() != VisibilityState::Clean
    }

    /// Re-renders if unsettled and advances the settle count. Returns whether
    /// a render happened.
    pub fn vis_update(
        &mut self,
        surface: &mut dyn RenderSurface,
        registry: &dyn SimplexRegistry,
    ) -> RenderResult<bool> {
        if !self.need_update(surface) {
            return Ok(false);
        }
        self.items.schedule_update(false, true, false);
        self.items.update(surface, registry)?;
        let count = match self.state.get() {
            VisibilityState::Settling(n) => n + 1,
            _ => 1,
        };
        self.state.set(if count >= self.threshold {
            VisibilityState::Clean
        } else {
            VisibilityState::Settling(count)
        });
        Ok(true)
    }

    /// Query view. Follows the view size, then re-renders if the scene or
    /// the size changed since the last render. Refresh failures are logged
    /// and the old pixels are served.
    pub fn view<'a>(
        &'a mut self,
        surface: &mut dyn RenderSurface,
        registry: &'a dyn SimplexRegistry,
    ) -> VisibilityView<'a> {
        self.need_update(surface);
        if self.state.get() == VisibilityState::Dirty {
            if let Err(err) = self.vis_update(surface, registry) {
                log::warn!("visibility refresh of {} failed: {err}", self.view_id());
            }
        }
        VisibilityView {
            items: self.items.view(surface, registry),
        }
    }

    /// Query view over the pixels as they are.
    pub fn stale_view<'a>(&'a self, registry: &'a dyn SimplexRegistry) -> VisibilityView<'a> {
        VisibilityView {
            items: self.items.stale_view(registry),
        }
    }
}

/// Visibility queries. Radii are in screen pixels.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityView<'a> {
    items: ItemView<'a>,
}

impl<'a> VisibilityView<'a> {
    /// The underlying item-buffer queries.
    pub fn items(&self) -> ItemView<'a> {
        self.items
    }

    pub fn simplex(&self, ndc: DVec2) -> Option<Simplex> {
        self.items.simplex(ndc)
    }

    /// Nearest simplex passing `filter` within `radius` of `ndc`.
    pub fn get_simplex<F>(&self, ndc: DVec2, radius: f64, filter: &F) -> Option<Simplex>
    where
        F: SimplexFilter + ?Sized,
    {
        self.items.find_near_simplex(ndc, radius, filter)
    }

    /// Nearest face, preferring front-facing faces.
    pub fn get_face(&self, ndc: DVec2, radius: f64) -> Option<FaceId> {
        self.get_simplex(ndc, radius, &FrontFacingFace)
            .or_else(|| self.get_simplex(ndc, radius, &KindFilter::FACE))
            .and_then(Simplex::as_face)
    }

    /// [`get_face`](Self::get_face) at each point, without duplicates.
    pub fn get_faces(&self, points: &[DVec2], radius: f64) -> Vec<FaceId> {
        let mut faces = Vec::new();
        for &p in points {
            if let Some(f) = self.get_face(p, radius) {
                if !faces.contains(&f) {
                    faces.push(f);
                }
            }
        }
        faces
    }

    pub fn get_edge(&self, ndc: DVec2, radius: f64) -> Option<EdgeId> {
        self.get_simplex(ndc, radius, &KindFilter::EDGE)
            .and_then(Simplex::as_edge)
    }

    pub fn get_vert(&self, ndc: DVec2, radius: f64) -> Option<VertexId> {
        self.get_simplex(ndc, radius, &KindFilter::VERTEX)
            .and_then(Simplex::as_vertex)
    }

    pub fn get_patch(&self, ndc: DVec2, radius: f64) -> Option<PatchId> {
        let simplex = self.get_simplex(ndc, radius, &AnySimplex)?;
        self.items.registry().patch_of(simplex)
    }

    pub fn get_mesh(&self, ndc: DVec2, radius: f64) -> Option<MeshId> {
        let simplex = self.get_simplex(ndc, radius, &AnySimplex)?;
        self.items.registry().mesh_of(simplex)
    }

    /// Nearest face and the barycentric coordinate of the point on it nearest
    /// `ndc`. `None` if either cannot be found.
    pub fn get_face_bc(&self, ndc: DVec2, radius: f64) -> Option<(FaceId, DVec3)> {
        let face = self.get_face(ndc, radius)?;
        let bc = self.items.registry().near_barycentric(face, ndc)?;
        Some((face, bc))
    }

    /// [`get_face_bc`](Self::get_face_bc) remapped to subdivision `level`.
    /// Level 0 is the face as drawn.
    pub fn get_sub_face(&self, level: u32, ndc: DVec2, radius: f64) -> Option<(FaceId, DVec3)> {
        let (face, bc) = self.get_face_bc(ndc, radius)?;
        if level == 0 {
            return Some((face, bc));
        }
        self.items.registry().face_at_level(face, level, bc)
    }

    /// [`get_face_bc`](Self::get_face_bc) remapped to the mesh edit level.
    pub fn get_edit_face(&self, ndc: DVec2, radius: f64) -> Option<(FaceId, DVec3)> {
        let (face, bc) = self.get_face_bc(ndc, radius)?;
        self.items.registry().face_at_edit_level(face, bc)
    }

    pub fn is_face_visible(&self, ndc: DVec2, face: FaceId) -> bool {
        self.items.is_face_visible(ndc, face)
    }

    pub fn intersect(&self, ndc: DVec2) -> Option<(FaceId, DVec3)> {
        self.items.intersect(ndc)
    }

    pub fn describe(&self, ndc: DVec2) -> String {
        self.items.describe(ndc)
    }
}
