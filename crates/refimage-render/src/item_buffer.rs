//! Item buffers: reference images of encoded simplex keys.
//!
//! Every primitive is drawn flat-shaded with the color its key encodes to, so
//! the pixel under the cursor names the primitive in front. Queries resolve
//! keys through a [`SimplexRegistry`]; exact geometry stays in the mesh layer.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use glam::{DVec2, DVec3, IVec2};
use refimage_core::{
    EdgeId, FaceId, Loc, Options, PatchId, Simplex, SimplexFilter, SimplexKey, SimplexRegistry,
    VertexId, ViewId,
};

use crate::codec::KeyCodec;
use crate::error::RenderResult;
use crate::reference_image::{MaskedMatch, PixelView, ReferenceImage, SizePolicy};
use crate::surface::{RenderSurface, TargetKind, TextureHandle};

/// The item buffer of one view.
#[derive(Debug)]
pub struct ItemBuffer {
    image: ReferenceImage,
    codec: Arc<dyn KeyCodec>,
    pixels_to_patches: bool,
    patch_pixels: HashMap<PatchId, Vec<usize>>,
    screen_to_raster: f64,
}

impl ItemBuffer {
    /// Creates an item buffer matching the view size.
    pub fn new(view: ViewId, codec: Arc<dyn KeyCodec>, options: &Options) -> Self {
        Self::with_policy(view, codec, options, TargetKind::Item, SizePolicy::MatchView)
    }

    /// Creates an item buffer with an explicit target kind and size policy.
    pub fn with_policy(
        view: ViewId,
        codec: Arc<dyn KeyCodec>,
        options: &Options,
        kind: TargetKind,
        policy: SizePolicy,
    ) -> Self {
        let clear = codec.key_to_color(SimplexKey::EMPTY);
        let image = ReferenceImage::new(kind, view, policy, clear)
            .with_ndc_offset(DVec2::from_array(options.default_ndc_offset))
            .with_debug(options.debug_ref_images);
        Self {
            image,
            codec,
            pixels_to_patches: false,
            patch_pixels: HashMap::new(),
            screen_to_raster: 1.0,
        }
    }

    pub fn image(&self) -> &ReferenceImage {
        &self.image
    }

    /// Mutable access to the underlying image, for direct pixel writes.
    pub fn image_mut(&mut self) -> &mut ReferenceImage {
        &mut self.image
    }

    pub fn codec(&self) -> &Arc<dyn KeyCodec> {
        &self.codec
    }

    pub fn view_id(&self) -> ViewId {
        self.image.view()
    }

    pub fn needs_update(&self) -> bool {
        self.image.needs_update()
    }

    /// Requests a refresh. With `pixels_to_patches`, the next refresh also
    /// records which pixels each patch covers.
    pub fn schedule_update(&mut self, pixels_to_patches: bool, main_mem: bool, tex_mem: bool) {
        self.pixels_to_patches |= pixels_to_patches;
        self.image.schedule_update(main_mem, tex_mem);
    }

    pub fn resize(&mut self, width: u32, height: u32, ndc_offset: DVec2) -> bool {
        self.image.resize(width, height, ndc_offset)
    }

    /// Resizes to the view, following the size policy.
    pub fn check_resize(&mut self, surface: &dyn RenderSurface) -> bool {
        self.image.check_resize(surface)
    }

    /// Services pending requests. See [`ReferenceImage::update`].
    pub fn update(
        &mut self,
        surface: &mut dyn RenderSurface,
        registry: &dyn SimplexRegistry,
    ) -> RenderResult<bool> {
        let refreshed = self.image.update(surface)?;
        if refreshed {
            self.track_screen_scale(surface);
            if self.pixels_to_patches {
                self.pixels_to_patches = false;
                self.patch_pixels = self.stale_view(registry).pixels_by_patch();
            }
        }
        Ok(refreshed)
    }

    /// Query view over fresh pixels, refreshing first if anything is pending.
    /// Refresh failures are logged and the previous pixels are served.
    pub fn view<'a>(
        &'a mut self,
        surface: &mut dyn RenderSurface,
        registry: &'a dyn SimplexRegistry,
    ) -> ItemView<'a> {
        if self.image.needs_update() {
            self.image.schedule_update(true, false);
            if let Err(err) = self.update(surface, registry) {
                log::warn!("refresh of item buffer of {} failed: {err}", self.view_id());
            }
        }
        self.track_screen_scale(surface);
        self.stale_view(registry)
    }

    /// Query view over the pixels as they are.
    pub fn stale_view<'a>(&'a self, registry: &'a dyn SimplexRegistry) -> ItemView<'a> {
        ItemView {
            pixels: self.image.stale_pixels(),
            codec: &*self.codec,
            registry,
            screen_to_raster: self.screen_to_raster,
        }
    }

    /// Pixels covered by each patch, recorded by the last refresh scheduled
    /// with `pixels_to_patches`.
    pub fn patch_pixels(&self) -> &HashMap<PatchId, Vec<usize>> {
        &self.patch_pixels
    }

    pub fn lookup_texture(&self) -> Option<TextureHandle> {
        self.image.texture()
    }

    fn track_screen_scale(&mut self, surface: &dyn RenderSurface) {
        let Some((w, h)) = surface.view_size(self.view_id()) else {
            return;
        };
        let screen_half_min = f64::from(w.min(h)) / 2.0;
        let raster_half_min = self.image.frame().half_min_dim();
        if screen_half_min > 0.0 && raster_half_min > 0.0 {
            self.screen_to_raster = raster_half_min / screen_half_min;
        }
    }
}

/// Pixels around `center` ordered ring by ring, from the center outwards.
fn spiral(center: IVec2, radius: u32) -> impl Iterator<Item = IVec2> {
    let radius = i32::try_from(radius).unwrap_or(i32::MAX);
    (0..=radius).flat_map(move |rad| {
        (-rad..=rad).flat_map(move |i| {
            (-rad..=rad)
                .filter(move |j| i.abs() == rad || j.abs() == rad)
                .map(move |j| center + IVec2::new(i, j))
        })
    })
}

/// The 8-connected neighbourhood of a pixel, the pixel itself first.
const NEIGHBOURHOOD: [IVec2; 9] = [
    IVec2::new(0, 0),
    IVec2::new(-1, 0),
    IVec2::new(1, 0),
    IVec2::new(0, -1),
    IVec2::new(0, 1),
    IVec2::new(-1, -1),
    IVec2::new(-1, 1),
    IVec2::new(1, -1),
    IVec2::new(1, 1),
];

/// Picking queries over an item buffer's pixels.
#[derive(Clone, Copy)]
pub struct ItemView<'a> {
    pixels: PixelView<'a>,
    codec: &'a dyn KeyCodec,
    registry: &'a dyn SimplexRegistry,
    screen_to_raster: f64,
}

impl<'a> ItemView<'a> {
    pub fn pixels(&self) -> PixelView<'a> {
        self.pixels
    }

    pub fn registry(&self) -> &'a dyn SimplexRegistry {
        self.registry
    }

    /// Item-buffer pixels per screen pixel.
    pub fn screen_to_raster(&self) -> f64 {
        self.screen_to_raster
    }

    /// Pixel holding `ndc`, in the offset-aware frame used by every query.
    pub fn ndc_to_pix(&self, ndc: DVec2) -> IVec2 {
        let frame = self.pixels.frame();
        frame.ndc_to_pix(ndc - frame.ndc_offset())
    }

    // ========== Exact resolve ==========

    pub fn key(&self, loc: impl Into<Loc>) -> SimplexKey {
        self.codec.color_to_key(self.pixels.val(loc))
    }

    /// The primitive drawn at `loc`, or `None` for background and stale keys.
    pub fn simplex(&self, loc: impl Into<Loc>) -> Option<Simplex> {
        let key = self.key(loc);
        if key.is_empty() {
            return None;
        }
        self.registry.resolve(key)
    }

    pub fn vert(&self, loc: impl Into<Loc>) -> Option<VertexId> {
        self.simplex(loc).and_then(Simplex::as_vertex)
    }

    pub fn edge(&self, loc: impl Into<Loc>) -> Option<EdgeId> {
        self.simplex(loc).and_then(Simplex::as_edge)
    }

    pub fn face(&self, loc: impl Into<Loc>) -> Option<FaceId> {
        self.simplex(loc).and_then(Simplex::as_face)
    }

    /// Patch owning the face or edge at `loc`.
    pub fn patch(&self, loc: impl Into<Loc>) -> Option<PatchId> {
        self.simplex(loc).and_then(|s| match s {
            Simplex::Vertex(_) => None,
            _ => self.registry.patch_of(s),
        })
    }

    /// Patch owning the face at `loc`. Edges and vertices give `None`.
    pub fn face_patch(&self, loc: impl Into<Loc>) -> Option<PatchId> {
        self.face(loc).and_then(|f| self.registry.patch_of(Simplex::Face(f)))
    }

    // ========== Intersection ==========

    /// Exact hit under `ndc`: the primitive hit (face, or an edge or vertex
    /// hit exactly) and the object-space point.
    pub fn intersect_simplex(&self, ndc: DVec2) -> Option<(Simplex, DVec3)> {
        let simplex = self.simplex(ndc)?;
        let face = self.registry.face_of(simplex)?;
        self.registry.find_intersect(face, ndc)
    }

    /// Exact hit under `ndc`, reported as a face containing the hit primitive.
    pub fn intersect(&self, ndc: DVec2) -> Option<(FaceId, DVec3)> {
        let (hit, point) = self.intersect_simplex(ndc)?;
        Some((self.registry.face_of(hit)?, point))
    }

    /// World-space point under `ndc`: the exact hit if the mesh layer finds
    /// one, otherwise the centroid of the face under the pixel.
    pub fn approx_world_point(&self, ndc: DVec2) -> Option<DVec3> {
        let face = self.face(ndc)?;
        let point = match self.registry.find_intersect(face, ndc) {
            Some((_, point)) => point,
            None => self.registry.face_centroid(face)?,
        };
        Some(self.registry.to_world(face, point))
    }

    /// Whether `face` is visible at `ndc`: it is the face drawn there, or the
    /// exact hit lands on a primitive bordering it.
    pub fn is_face_visible(&self, ndc: DVec2, face: FaceId) -> bool {
        let Some(drawn) = self.face(ndc) else {
            return false;
        };
        if drawn == face {
            return true;
        }
        self.registry
            .find_intersect(drawn, ndc)
            .is_some_and(|(hit, _)| self.registry.on_face(hit, face))
    }

    // ========== Radius search ==========

    /// Nearest pixel within `screen_radius` screen pixels of `center` whose
    /// simplex passes `filter`.
    ///
    /// The filter sees `None` for background pixels, so it can search for
    /// empty space too. Ties go to the first pixel in row order.
    pub fn search<F>(&self, center: DVec2, screen_radius: f64, filter: &F) -> Option<IVec2>
    where
        F: SimplexFilter + ?Sized,
    {
        let r = screen_radius.max(0.0) * self.screen_to_raster;
        let center = self.ndc_to_pix(center);
        let reach = r.ceil().min(f64::from(i32::MAX)) as u32;
        let (lo, hi) = self.pixels.box_bounds(center, reach)?;

        let mut best: Option<(IVec2, f64)> = None;
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                let cur = IVec2::new(x, y);
                let d = (cur - center).as_dvec2().length();
                if d < r
                    && best.map_or(true, |(_, min)| d < min)
                    && filter.accept(self.simplex(cur), self.registry)
                {
                    best = Some((cur, d));
                }
            }
        }
        best.map(|(pix, _)| pix)
    }

    /// The simplex at the pixel found by [`search`](Self::search).
    pub fn find_near_simplex<F>(&self, center: DVec2, screen_radius: f64, filter: &F) -> Option<Simplex>
    where
        F: SimplexFilter + ?Sized,
    {
        self.search(center, screen_radius, filter)
            .and_then(|pix| self.simplex(pix))
    }

    // ========== Neighbour walks ==========

    /// Whether `pix` is on the raster and shows a silhouette edge of `patch`.
    pub fn is_patch_sil_edge(&self, pix: IVec2, patch: PatchId) -> bool {
        if !self.pixels.frame().pix_in_range(pix) {
            return false;
        }
        self.edge(pix).is_some_and(|e| {
            self.registry.patch_of(Simplex::Edge(e)) == Some(patch) && self.registry.is_silhouette(e)
        })
    }

    /// Whether a silhouette edge of `patch` shows within `radius` pixels.
    pub fn is_patch_sil_edge_near(&self, ndc: DVec2, patch: PatchId, radius: u32) -> bool {
        spiral(self.ndc_to_pix(ndc), radius).any(|pix| self.is_patch_sil_edge(pix, patch))
    }

    /// Another silhouette edge of `current`'s patch, nearest ring first.
    pub fn find_neighbor(&self, ndc: DVec2, current: EdgeId, radius: u32) -> Option<EdgeId> {
        let patch = self.registry.patch_of(Simplex::Edge(current))?;
        spiral(self.ndc_to_pix(ndc), radius)
            .filter(|&pix| self.pixels.frame().pix_in_range(pix))
            .filter_map(|pix| self.edge(pix))
            .find(|&e| {
                e != current
                    && self.registry.patch_of(Simplex::Edge(e)) == Some(patch)
                    && self.registry.is_silhouette(e)
            })
    }

    /// Every distinct silhouette edge of `patch` in the box around `ndc`.
    pub fn find_all_neighbors(&self, ndc: DVec2, patch: PatchId, radius: u32) -> Vec<EdgeId> {
        let center = self.ndc_to_pix(ndc);
        let mut found = Vec::new();
        let Some((lo, hi)) = self.pixels.box_bounds(center, radius) else {
            return found;
        };
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                let pix = IVec2::new(x, y);
                if let Some(e) = self.edge(pix) {
                    if !found.contains(&e) && self.is_patch_sil_edge(pix, patch) {
                        found.push(e);
                    }
                }
            }
        }
        found
    }

    /// Whether `simplex` shows within `radius` pixels of `ndc`.
    pub fn is_simplex_near(&self, ndc: DVec2, simplex: Simplex, radius: u32) -> bool {
        spiral(self.ndc_to_pix(ndc), radius)
            .filter(|&pix| self.pixels.frame().pix_in_range(pix))
            .any(|pix| self.simplex(pix) == Some(simplex))
    }

    /// Whether `key` shows in the `(2r+1)^2` box around `center`.
    ///
    /// Only the bits the codec uses for keys are compared, so channel bits
    /// outside the key (alpha, low bits of packed channels) are ignored.
    /// Pixels holding exactly the color of `exclude` are skipped.
    pub fn find_key_in_box(
        &self,
        key: SimplexKey,
        center: impl Into<Loc>,
        radius: u32,
        exclude: Option<SimplexKey>,
    ) -> bool {
        let mut query = MaskedMatch::new(self.codec.key_to_color(key), self.codec.key_mask());
        if let Some(excluded) = exclude {
            query = query.excluding(self.codec.key_to_color(excluded));
        }
        self.pixels.find_masked_in_box(&query, center, radius)
    }

    /// `pix` or an 8-connected neighbour showing a face of `patch`.
    pub fn near_pix(&self, pix: IVec2, patch: PatchId) -> Option<IVec2> {
        NEIGHBOURHOOD
            .iter()
            .map(|&d| pix + d)
            .filter(|&p| self.pixels.frame().pix_in_range(p))
            .find(|&p| self.face_patch(p) == Some(patch))
    }

    // ========== Whole-image ==========

    /// Raster indices covered by each patch's faces.
    pub fn pixels_by_patch(&self) -> HashMap<PatchId, Vec<usize>> {
        let mut by_patch: HashMap<PatchId, Vec<usize>> = HashMap::new();
        for index in 0..self.pixels.values().len() {
            if let Some(patch) = self.face_patch(index) {
                by_patch.entry(patch).or_default().push(index);
            }
        }
        by_patch
    }

    /// The resolve chain at `ndc`, for debugging.
    pub fn describe(&self, ndc: DVec2) -> String {
        let index = self.pixels.frame().ndc_to_index(ndc);
        let val = self.pixels.val(index);
        let key = self.key(index);
        let mut out = format!("ndc: ({:.4}, {:.4}), index: {index}, val: {val:#010x}, key: {key}", ndc.x, ndc.y);
        match self.simplex(index) {
            Some(s) => {
                let _ = write!(out, ", simplex: {s}");
            }
            None => out.push_str(", simplex: none"),
        }
        log::debug!("{out}");
        out
    }
}

impl std::fmt::Debug for ItemView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemView")
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .field("codec", &self.codec)
            .field("screen_to_raster", &self.screen_to_raster)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FullColorCodec, PackedChannelCodec};
    use crate::surface::ChannelBits;
    use crate::test_support::{MockRegistry, MockSurface};
    use refimage_core::{AcceptAll, AnySimplex, KindFilter, MeshId};

    const S7: Simplex = Simplex::Face(FaceId(7));

    fn buffer() -> ItemBuffer {
        ItemBuffer::new(MockSurface::VIEW, Arc::new(FullColorCodec), &Options::default())
    }

    /// 4x4 item buffer with key 7 at (2,2), already refreshed.
    fn scenario() -> (MockSurface, MockRegistry, ItemBuffer) {
        let mut surface = MockSurface::new(4, 4);
        surface.paint(IVec2::new(2, 2), 0x07);
        let mut registry = MockRegistry::default();
        registry.add(0x07, S7);
        let mut items = buffer();
        items.schedule_update(false, true, false);
        items.update(&mut surface, &registry).unwrap();
        (surface, registry, items)
    }

    fn ndc_of(items: &ItemBuffer, x: i32, y: i32) -> DVec2 {
        items.image().frame().index_to_ndc(items.image().frame().pix_to_index(IVec2::new(x, y)))
    }

    #[test]
    fn test_resolve_scenario() {
        let (_, registry, items) = scenario();
        let view = items.stale_view(&registry);
        assert_eq!(view.simplex(ndc_of(&items, 2, 2)), Some(S7));
        assert_eq!(view.simplex(ndc_of(&items, 0, 0)), None);
        assert_eq!(view.search(ndc_of(&items, 2, 2), 1.0, &AcceptAll), Some(IVec2::new(2, 2)));
    }

    #[test]
    fn test_search_finds_nearest_match() {
        let (_, registry, items) = scenario();
        let view = items.stale_view(&registry);
        let from = ndc_of(&items, 0, 2);
        assert_eq!(view.search(from, 3.0, &AnySimplex), Some(IVec2::new(2, 2)));
        assert_eq!(view.search(from, 2.0, &AnySimplex), None);
        assert_eq!(view.find_near_simplex(from, 3.0, &KindFilter::FACE), Some(S7));
        assert_eq!(view.find_near_simplex(from, 3.0, &KindFilter::EDGE), None);
    }

    #[test]
    fn test_search_negative_radius_finds_nothing() {
        let (_, registry, items) = scenario();
        let view = items.stale_view(&registry);
        assert_eq!(view.search(ndc_of(&items, 2, 2), -4.0, &AcceptAll), None);
    }

    #[test]
    fn test_search_radius_is_in_screen_pixels() {
        let mut surface = MockSurface::new(8, 8);
        surface.paint(IVec2::new(3, 1), 0x07);
        let mut registry = MockRegistry::default();
        registry.add(0x07, S7);
        let mut items = ItemBuffer::with_policy(
            MockSurface::VIEW,
            Arc::new(FullColorCodec),
            &Options::default(),
            TargetKind::Visibility,
            SizePolicy::ShortSideAtMost(4),
        );
        items.schedule_update(false, true, false);
        let view = items.view(&mut surface, &registry);
        assert!((view.screen_to_raster() - 0.5).abs() < 1e-12);
        // Two raster pixels away: needs more than four screen pixels.
        let from = view.pixels().frame().pix_to_ndc(IVec2::new(1, 1));
        assert_eq!(view.search(from, 4.0, &AnySimplex), None);
        assert_eq!(view.search(from, 5.0, &AnySimplex), Some(IVec2::new(3, 1)));
    }

    #[test]
    fn test_stale_key_resolves_to_none() {
        let (_, mut registry, items) = scenario();
        registry.keys.clear();
        assert_eq!(items.stale_view(&registry).simplex(IVec2::new(2, 2)), None);
    }

    #[test]
    fn test_view_refreshes_lazily() {
        let mut surface = MockSurface::new(4, 4);
        surface.paint(IVec2::new(1, 1), 0x07);
        let mut registry = MockRegistry::default();
        registry.add(0x07, S7);
        let mut items = buffer();
        items.schedule_update(false, false, true);
        assert_eq!(items.view(&mut surface, &registry).face(IVec2::new(1, 1)), Some(FaceId(7)));
        assert_eq!(surface.renders, 1);
        items.view(&mut surface, &registry);
        assert_eq!(surface.renders, 1);
    }

    #[test]
    fn test_packed_codec_buffer() {
        let mut surface = MockSurface::new(4, 4);
        let codec = Arc::new(PackedChannelCodec::new(ChannelBits {
            red: 5,
            green: 6,
            blue: 5,
            alpha: 0,
        }));
        surface.paint(IVec2::new(0, 3), codec.key_to_color(SimplexKey(0x1234)));
        let mut registry = MockRegistry::default();
        registry.add(0x1234, S7);
        let mut items = ItemBuffer::new(MockSurface::VIEW, codec, &Options::default());
        let view = items.view(&mut surface, &registry);
        // Never scheduled: nothing rendered yet.
        assert_eq!(view.simplex(IVec2::new(0, 3)), None);

        items.schedule_update(false, true, false);
        let view = items.view(&mut surface, &registry);
        assert_eq!(view.simplex(IVec2::new(0, 3)), Some(S7));
        assert_eq!(view.key(IVec2::new(1, 1)), SimplexKey::EMPTY);
    }

    #[test]
    fn test_find_key_in_box_full_color() {
        let (_, registry, items) = scenario();
        let view = items.stale_view(&registry);
        let key = SimplexKey(0x07);

        assert!(view.find_key_in_box(key, IVec2::new(2, 2), 0, None));
        assert!(view.find_key_in_box(key, IVec2::new(0, 0), 2, None));
        assert!(!view.find_key_in_box(key, IVec2::new(0, 0), 1, None));
        assert!(!view.find_key_in_box(key, IVec2::new(2, 2), 3, Some(key)));
        assert!(!view.find_key_in_box(SimplexKey(0x08), IVec2::new(2, 2), 3, None));
    }

    #[test]
    fn test_find_key_in_box_ignores_non_key_bits() {
        let mut surface = MockSurface::new(4, 4);
        let codec = Arc::new(PackedChannelCodec::new(ChannelBits {
            red: 5,
            green: 6,
            blue: 5,
            alpha: 0,
        }));
        let key = SimplexKey(0x1234);
        let exact = codec.key_to_color(key);
        // Low red bits and alpha carry no key bits.
        let noisy = ((exact | 0x0700_0000) & !0xFF) | 0x80;
        assert_ne!(noisy, exact);
        assert_eq!(noisy & codec.key_mask(), exact & codec.key_mask());
        surface.paint(IVec2::new(1, 1), noisy);

        let registry = MockRegistry::default();
        let mut items = ItemBuffer::new(MockSurface::VIEW, codec, &Options::default());
        items.schedule_update(false, true, false);
        let view = items.view(&mut surface, &registry);

        assert_eq!(view.pixels().val(IVec2::new(1, 1)), noisy);
        assert!(!view.pixels().find_val_in_box(exact, IVec2::new(1, 1), 1));
        assert!(view.find_key_in_box(key, IVec2::new(0, 0), 1, None));
        // The pixel is not exactly the excluded color, so it still counts.
        assert!(view.find_key_in_box(key, IVec2::new(0, 0), 1, Some(key)));
        assert!(!view.find_key_in_box(SimplexKey(0x1235), IVec2::new(0, 0), 1, None));
    }

    #[test]
    fn test_intersect_delegates_to_face() {
        let (_, mut registry, items) = scenario();
        let edge = Simplex::Edge(EdgeId(70));
        registry.faces.insert(edge, FaceId(7));
        registry.hits.insert(FaceId(7), (edge, DVec3::new(1.0, 2.0, 3.0)));
        let view = items.stale_view(&registry);
        let ndc = ndc_of(&items, 2, 2);
        assert_eq!(view.intersect_simplex(ndc), Some((edge, DVec3::new(1.0, 2.0, 3.0))));
        assert_eq!(view.intersect(ndc), Some((FaceId(7), DVec3::new(1.0, 2.0, 3.0))));
        assert_eq!(view.intersect(ndc_of(&items, 0, 0)), None);
    }

    #[test]
    fn test_approx_world_point_falls_back_to_centroid() {
        let (_, mut registry, items) = scenario();
        registry.centroids.insert(FaceId(7), DVec3::ONE);
        let ndc = ndc_of(&items, 2, 2);
        assert_eq!(
            items.stale_view(&registry).approx_world_point(ndc),
            Some(DVec3::new(101.0, 1.0, 1.0))
        );
        registry.hits.insert(FaceId(7), (S7, DVec3::ZERO));
        assert_eq!(
            items.stale_view(&registry).approx_world_point(ndc),
            Some(DVec3::new(100.0, 0.0, 0.0))
        );
    }

    #[test]
    fn test_is_face_visible() {
        let (_, mut registry, items) = scenario();
        let ndc = ndc_of(&items, 2, 2);
        assert!(items.stale_view(&registry).is_face_visible(ndc, FaceId(7)));
        assert!(!items.stale_view(&registry).is_face_visible(ndc, FaceId(8)));

        let shared = Simplex::Edge(EdgeId(78));
        registry.hits.insert(FaceId(7), (shared, DVec3::ZERO));
        registry.borders.insert((shared, FaceId(8)));
        assert!(items.stale_view(&registry).is_face_visible(ndc, FaceId(8)));
        assert!(!items.stale_view(&registry).is_face_visible(ndc_of(&items, 0, 0), FaceId(8)));
    }

    /// 6x6 buffer with silhouette edges 1 and 2 of patch 0 and a
    /// non-silhouette edge 3.
    fn edge_scene() -> (MockRegistry, ItemBuffer) {
        let mut registry = MockRegistry::default();
        for (key, edge) in [(1, EdgeId(1)), (2, EdgeId(2)), (3, EdgeId(3))] {
            registry.add(key, Simplex::Edge(edge));
            registry.patches.insert(Simplex::Edge(edge), PatchId(0));
        }
        registry.silhouettes.extend([EdgeId(1), EdgeId(2)]);
        registry.add(9, Simplex::Face(FaceId(9)));
        registry.patches.insert(Simplex::Face(FaceId(9)), PatchId(5));

        let mut items = buffer();
        items.resize(6, 6, DVec2::ZERO);
        items.image_mut().fill(0);
        items.image_mut().set(IVec2::new(2, 2), 1);
        items.image_mut().set(IVec2::new(3, 2), 1);
        items.image_mut().set(IVec2::new(4, 4), 2);
        items.image_mut().set(IVec2::new(1, 2), 3);
        items.image_mut().set(IVec2::new(5, 0), 9);
        (registry, items)
    }

    #[test]
    fn test_silhouette_walks() {
        let (registry, items) = edge_scene();
        let view = items.stale_view(&registry);
        let at = |x, y| view.pixels().frame().pix_to_ndc(IVec2::new(x, y));

        assert!(view.is_patch_sil_edge(IVec2::new(2, 2), PatchId(0)));
        assert!(!view.is_patch_sil_edge(IVec2::new(1, 2), PatchId(0)));
        assert!(!view.is_patch_sil_edge(IVec2::new(-1, 2), PatchId(0)));
        assert!(view.is_patch_sil_edge_near(at(0, 0), PatchId(0), 2));
        assert!(!view.is_patch_sil_edge_near(at(0, 0), PatchId(0), 1));

        assert_eq!(view.find_neighbor(at(3, 3), EdgeId(1), 1), Some(EdgeId(2)));
        assert_eq!(view.find_neighbor(at(2, 2), EdgeId(1), 1), None);

        assert_eq!(view.find_all_neighbors(at(3, 3), PatchId(0), 2), vec![EdgeId(1), EdgeId(2)]);
        assert_eq!(view.find_all_neighbors(at(3, 3), PatchId(1), 2), vec![]);
    }

    #[test]
    fn test_is_simplex_near_and_near_pix() {
        let (registry, items) = edge_scene();
        let view = items.stale_view(&registry);
        let at = |x, y| view.pixels().frame().pix_to_ndc(IVec2::new(x, y));

        assert!(view.is_simplex_near(at(0, 0), Simplex::Edge(EdgeId(3)), 2));
        assert!(!view.is_simplex_near(at(0, 0), Simplex::Edge(EdgeId(3)), 1));

        assert_eq!(view.near_pix(IVec2::new(4, 1), PatchId(5)), Some(IVec2::new(5, 0)));
        assert_eq!(view.near_pix(IVec2::new(5, 0), PatchId(5)), Some(IVec2::new(5, 0)));
        assert_eq!(view.near_pix(IVec2::new(3, 3), PatchId(5)), None);
    }

    #[test]
    fn test_pixels_to_patches() {
        let mut surface = MockSurface::new(3, 1);
        surface.paint(IVec2::new(0, 0), 9);
        surface.paint(IVec2::new(2, 0), 9);
        let mut registry = MockRegistry::default();
        registry.add(9, Simplex::Face(FaceId(9)));
        registry.patches.insert(Simplex::Face(FaceId(9)), PatchId(5));

        let mut items = buffer();
        items.schedule_update(true, true, false);
        items.update(&mut surface, &registry).unwrap();
        assert_eq!(items.patch_pixels().get(&PatchId(5)), Some(&vec![0, 2]));
        assert_eq!(items.stale_view(&registry).patch(IVec2::ZERO), Some(PatchId(5)));
        assert_eq!(registry.mesh_of(Simplex::Face(FaceId(9))), Some(MeshId(0)));
    }

    #[test]
    fn test_describe() {
        let (_, registry, items) = scenario();
        let text = items.stale_view(&registry).describe(ndc_of(&items, 2, 2));
        assert!(text.contains("index: 10"));
        assert!(text.contains("simplex: f7"));
    }
}
