//! Cached off-screen renders with lazy CPU/GPU synchronization.
//!
//! A [`ReferenceImage`] holds a CPU copy of a render (a [`Raster2D`] of
//! packed RGBA) and optionally a texture copy owned by the render surface.
//! Either copy can be stale. Requests for fresh data are recorded with
//! [`ReferenceImage::schedule_update`] and serviced by
//! [`ReferenceImage::update`].
//!
//! Reads go through [`PixelView`]. [`ReferenceImage::pixels`] refreshes first
//! if anything is pending, so reading stale pixels requires the explicit
//! [`ReferenceImage::stale_pixels`].

use glam::{DVec2, IVec2, Vec3};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use refimage_core::color::{
    build_rgba, color_to_rgba, from_bytes, rgba_to_a, rgba_to_b, rgba_to_color, rgba_to_g,
    rgba_to_grey, rgba_to_grey_d, rgba_to_r, to_bytes,
};
use refimage_core::{CoordinateFrame, Loc, Raster2D, RefImageError, ViewId};

use crate::error::RenderResult;
use crate::surface::{RenderSurface, RenderTarget, TargetKind, TextureHandle};

/// Which copies of an image need refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingUpdate {
    /// The CPU raster.
    pub main_mem: bool,
    /// The texture on the render surface.
    pub tex_mem: bool,
}

impl PendingUpdate {
    pub const NONE: Self = Self {
        main_mem: false,
        tex_mem: false,
    };
    pub const MAIN: Self = Self {
        main_mem: true,
        tex_mem: false,
    };
    pub const TEX: Self = Self {
        main_mem: false,
        tex_mem: true,
    };
    pub const BOTH: Self = Self {
        main_mem: true,
        tex_mem: true,
    };

    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.main_mem && !self.tex_mem
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            main_mem: self.main_mem || other.main_mem,
            tex_mem: self.tex_mem || other.tex_mem,
        }
    }
}

/// How an image's size follows its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePolicy {
    /// Same size as the view.
    MatchView,
    /// Same aspect ratio as the view, shorter side at most this many pixels.
    ShortSideAtMost(u32),
}

impl SizePolicy {
    /// Image size for a view of `width x height`.
    #[must_use]
    pub fn size_for(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::MatchView => (width, height),
            Self::ShortSideAtMost(limit) => {
                let min_side = width.min(height);
                if min_side <= limit {
                    return (width, height);
                }
                let s = f64::from(limit) / f64::from(min_side);
                let scale = |v: u32| ((f64::from(v) * s).round() as u32).max(1);
                (scale(width), scale(height))
            }
        }
    }
}

/// A cached render of one view.
#[derive(Debug)]
pub struct ReferenceImage {
    raster: Raster2D<u32>,
    kind: TargetKind,
    view: ViewId,
    policy: SizePolicy,
    clear_rgba: u32,
    ndc_offset: DVec2,
    pending: PendingUpdate,
    texture: Option<TextureHandle>,
    debug: bool,
}

impl ReferenceImage {
    /// Creates an empty image. It takes its size from the view on the first
    /// update.
    pub fn new(kind: TargetKind, view: ViewId, policy: SizePolicy, clear_rgba: u32) -> Self {
        Self {
            raster: Raster2D::default(),
            kind,
            view,
            policy,
            clear_rgba,
            ndc_offset: DVec2::ZERO,
            pending: PendingUpdate::NONE,
            texture: None,
            debug: false,
        }
    }

    /// Sets the NDC offset used for rasters created by later resizes.
    #[must_use]
    pub fn with_ndc_offset(mut self, offset: DVec2) -> Self {
        self.ndc_offset = offset;
        self
    }

    /// Enables debug logging of resizes and refreshes.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn policy(&self) -> SizePolicy {
        self.policy
    }

    pub fn frame(&self) -> &CoordinateFrame {
        self.raster.frame()
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// The texture holding the last texture-memory refresh, if any.
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn pending(&self) -> PendingUpdate {
        self.pending
    }

    pub fn needs_update(&self) -> bool {
        !self.pending.is_empty()
    }

    // ========== Scheduling ==========

    /// Requests a refresh of the given copies. Requests accumulate until the
    /// next [`update`](Self::update).
    pub fn schedule_update(&mut self, main_mem: bool, tex_mem: bool) {
        if !main_mem && !tex_mem {
            log::warn!(
                "{:?} image of {}: update scheduled for neither main nor texture memory",
                self.kind,
                self.view
            );
            return;
        }
        self.pending = self.pending.union(PendingUpdate {
            main_mem,
            tex_mem,
        });
    }

    /// Resizes the raster. When the size actually changes the old pixels are
    /// discarded and every resident copy is marked stale.
    pub fn resize(&mut self, width: u32, height: u32, ndc_offset: DVec2) -> bool {
        self.ndc_offset = ndc_offset;
        if !self.raster.resize(width, height, ndc_offset) {
            return false;
        }
        if self.debug {
            log::debug!(
                "{:?} image of {} resized to {width}x{height}",
                self.kind,
                self.view
            );
        }
        self.pending = self.pending.union(PendingUpdate {
            main_mem: true,
            tex_mem: self.texture.is_some(),
        });
        true
    }

    /// Resizes to the size the policy derives from the current view size.
    /// Returns `false` if the size is unchanged or the view is unknown.
    pub fn check_resize(&mut self, surface: &dyn RenderSurface) -> bool {
        let Some((w, h)) = surface.view_size(self.view) else {
            return false;
        };
        let (w, h) = self.policy.size_for(w, h);
        self.resize(w, h, self.ndc_offset)
    }

    /// Services pending requests: renders the scene into the framebuffer and
    /// copies it to RAM and/or texture memory.
    ///
    /// Returns `Ok(false)` without touching the surface if nothing is
    /// pending. Requests stay pending if rendering fails.
    pub fn update(&mut self, surface: &mut dyn RenderSurface) -> RenderResult<bool> {
        if self.pending.is_empty() {
            return Ok(false);
        }
        self.check_resize(surface);
        let serviced = self.pending;

        if self.debug {
            log::debug!(
                "refreshing {:?} image of {} ({}x{}, {:?})",
                self.kind,
                self.view,
                self.width(),
                self.height(),
                serviced
            );
        }

        surface.render_scene_into(&self.render_target())?;
        if serviced.main_mem {
            self.copy_to_ram(surface)?;
        }
        if serviced.tex_mem {
            self.copy_to_tex(surface)?;
        }
        self.pending = PendingUpdate::NONE;
        Ok(true)
    }

    /// The render request for this image at its current size.
    pub fn render_target(&self) -> RenderTarget {
        RenderTarget {
            kind: self.kind,
            view: self.view,
            width: self.width(),
            height: self.height(),
            clear_rgba: self.clear_rgba,
        }
    }

    // ========== Reads ==========

    /// Pixels, refreshed first if any request is pending.
    ///
    /// A pending texture-only request also refreshes the CPU copy, since the
    /// caller is about to read it. Refresh failures are logged and the
    /// previous pixels are served.
    pub fn pixels(&mut self, surface: &mut dyn RenderSurface) -> PixelView<'_> {
        if !self.pending.is_empty() {
            self.pending.main_mem = true;
            if let Err(err) = self.update(surface) {
                log::warn!(
                    "refresh of {:?} image of {} failed: {err}",
                    self.kind,
                    self.view
                );
            }
        }
        PixelView {
            raster: &self.raster,
        }
    }

    /// Pixels as they are, even if a refresh is pending.
    pub fn stale_pixels(&self) -> PixelView<'_> {
        PixelView {
            raster: &self.raster,
        }
    }

    // ========== Writes ==========

    /// Sets every pixel.
    pub fn fill(&mut self, rgba: u32) {
        self.raster.clear(rgba);
    }

    /// Sets every pixel from components.
    pub fn fill_components(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.fill(build_rgba(r, g, b, a));
    }

    /// Sets one pixel. Off-raster locations write the nearest edge pixel.
    pub fn set(&mut self, loc: impl Into<Loc>, rgba: u32) {
        if let Some(cell) = self.raster.get_mut(loc) {
            *cell = rgba;
        }
    }

    pub fn set_components(&mut self, loc: impl Into<Loc>, r: u8, g: u8, b: u8, a: u8) {
        self.set(loc, build_rgba(r, g, b, a));
    }

    /// Sets one pixel from a linear color and opacity.
    pub fn set_color(&mut self, loc: impl Into<Loc>, color: Vec3, alpha: f64) {
        self.set(loc, color_to_rgba(color, alpha));
    }

    /// Blends `color` over the stored pixel with opacity `alpha`. The result
    /// is opaque.
    pub fn blend(&mut self, loc: impl Into<Loc>, color: Vec3, alpha: f64) {
        let loc = loc.into();
        let Some(&stored) = self.raster.get(loc) else {
            return;
        };
        let t = alpha.clamp(0.0, 1.0) as f32;
        let mixed = rgba_to_color(stored).lerp(color, t);
        self.set(loc, color_to_rgba(mixed, 1.0));
    }

    /// Replaces the raster with `width x height` packed pixels in row-major
    /// order, bottom row first.
    pub fn load_values(&mut self, width: u32, height: u32, values: &[u32]) -> Result<(), RefImageError> {
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(RefImageError::SizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        self.raster.resize(width, height, self.ndc_offset);
        self.raster.values_mut().copy_from_slice(values);
        Ok(())
    }

    /// Replaces the raster with the contents of an image with a top-left
    /// origin.
    pub fn load_rgba(&mut self, img: &RgbaImage) -> Result<(), RefImageError> {
        let (w, h) = img.dimensions();
        let values: Vec<u32> = (0..h)
            .rev()
            .flat_map(|y| (0..w).map(move |x| from_bytes(img.get_pixel(x, y).0)))
            .collect();
        self.load_values(w, h, &values)
    }

    // ========== Surface copies ==========

    /// Reads the framebuffer into the CPU raster.
    pub fn copy_to_ram(&mut self, surface: &mut dyn RenderSurface) -> RenderResult<()> {
        let (w, h) = (self.width(), self.height());
        surface.read_pixels(w, h, self.raster.values_mut())
    }

    /// Writes the CPU raster into the framebuffer.
    pub fn draw_img(&self, surface: &mut dyn RenderSurface) -> RenderResult<()> {
        surface.draw_pixels(self.width(), self.height(), self.raster.values())
    }

    /// Copies the framebuffer into this image's texture.
    pub fn copy_to_tex(&mut self, surface: &mut dyn RenderSurface) -> RenderResult<()> {
        let handle = surface.copy_to_texture(self.texture, self.width(), self.height())?;
        self.texture = Some(handle);
        Ok(())
    }

    /// Draws this image's texture over the framebuffer. Does nothing if the
    /// image has never been copied to texture memory.
    pub fn draw_tex(&self, surface: &mut dyn RenderSurface) -> RenderResult<()> {
        match self.texture {
            Some(handle) => surface.draw_texture(handle),
            None => {
                log::debug!("{:?} image of {} has no texture to draw", self.kind, self.view);
                Ok(())
            }
        }
    }
}

/// Read access to an image's pixels.
///
/// Every accessor takes any [`Loc`] and clamps off-raster locations. An empty
/// raster reads as zero everywhere.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    raster: &'a Raster2D<u32>,
}

impl<'a> PixelView<'a> {
    /// Wraps a raster directly.
    pub fn new(raster: &'a Raster2D<u32>) -> Self {
        Self { raster }
    }

    pub fn frame(&self) -> &'a CoordinateFrame {
        self.raster.frame()
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn values(&self) -> &'a [u32] {
        self.raster.values()
    }

    /// Packed RGBA at `loc`.
    pub fn val(&self, loc: impl Into<Loc>) -> u32 {
        self.raster.get(loc).copied().unwrap_or(0)
    }

    pub fn color(&self, loc: impl Into<Loc>) -> Vec3 {
        rgba_to_color(self.val(loc))
    }

    pub fn red(&self, loc: impl Into<Loc>) -> u8 {
        rgba_to_r(self.val(loc))
    }

    pub fn green(&self, loc: impl Into<Loc>) -> u8 {
        rgba_to_g(self.val(loc))
    }

    pub fn blue(&self, loc: impl Into<Loc>) -> u8 {
        rgba_to_b(self.val(loc))
    }

    pub fn alpha(&self, loc: impl Into<Loc>) -> u8 {
        rgba_to_a(self.val(loc))
    }

    pub fn grey(&self, loc: impl Into<Loc>) -> u8 {
        rgba_to_grey(self.val(loc))
    }

    pub fn grey_d(&self, loc: impl Into<Loc>) -> f64 {
        rgba_to_grey_d(self.val(loc))
    }

    // ========== Box search ==========

    /// Clamped bounds of the `(2r+1)^2` box around `center`, or `None` if the
    /// box misses the raster.
    pub(crate) fn box_bounds(&self, center: IVec2, radius: u32) -> Option<(IVec2, IVec2)> {
        if self.raster.is_empty() {
            return None;
        }
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        let max = IVec2::new(self.width() as i32 - 1, self.height() as i32 - 1);
        let lo = center.saturating_sub(IVec2::splat(r)).max(IVec2::ZERO);
        let hi = center.saturating_add(IVec2::splat(r)).min(max);
        (lo.x <= hi.x && lo.y <= hi.y).then_some((lo, hi))
    }

    fn any_in_box(&self, center: impl Into<Loc>, radius: u32, pred: impl Fn(u32) -> bool) -> bool {
        let center = self.frame().resolve_pix(center.into());
        let Some((lo, hi)) = self.box_bounds(center, radius) else {
            return false;
        };
        let w = self.width() as usize;
        let values = self.values();
        (lo.y..=hi.y).any(|y| {
            let row = y as usize * w;
            (lo.x..=hi.x).any(|x| pred(values[row + x as usize]))
        })
    }

    /// Whether `value` occurs in the `(2r+1)^2` box around `center`.
    pub fn find_val_in_box(&self, value: u32, center: impl Into<Loc>, radius: u32) -> bool {
        self.any_in_box(center, radius, |cell| cell == value)
    }

    /// Whether any pixel in the box around `center` satisfies `query`.
    pub fn find_masked_in_box(&self, query: &MaskedMatch, center: impl Into<Loc>, radius: u32) -> bool {
        self.any_in_box(center, radius, |cell| query.matches(cell))
    }

    // ========== Conversion ==========

    /// Copies the color channels into an image with a top-left origin.
    pub fn copy_rgb(&self) -> RgbImage {
        let (w, h) = (self.width(), self.height());
        RgbImage::from_fn(w, h, |x, y| {
            let [r, g, b, _] = to_bytes(self.val(IVec2::new(x as i32, (h - 1 - y) as i32)));
            Rgb([r, g, b])
        })
    }

    /// Copies all channels into an image with a top-left origin.
    pub fn copy_rgba(&self) -> RgbaImage {
        let (w, h) = (self.width(), self.height());
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba(to_bytes(self.val(IVec2::new(x as i32, (h - 1 - y) as i32))))
        })
    }
}

/// A masked box-search query.
///
/// A pixel matches when its masked bits equal the masked target, it is not
/// the excluded value, and its low byte is within the tolerance of the
/// target's low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskedMatch {
    pub value: u32,
    pub mask: u32,
    pub exclude: Option<u32>,
    pub low_byte_tolerance: Option<u8>,
}

impl MaskedMatch {
    #[must_use]
    pub fn new(value: u32, mask: u32) -> Self {
        Self {
            value,
            mask,
            exclude: None,
            low_byte_tolerance: None,
        }
    }

    /// Skips pixels holding exactly `value`.
    #[must_use]
    pub fn excluding(mut self, value: u32) -> Self {
        self.exclude = Some(value);
        self
    }

    /// Requires the low bytes to differ by at most `tolerance`.
    #[must_use]
    pub fn with_low_byte_tolerance(mut self, tolerance: u8) -> Self {
        self.low_byte_tolerance = Some(tolerance);
        self
    }

    pub fn matches(&self, cell: u32) -> bool {
        if (cell & self.mask) != (self.value & self.mask) || self.exclude == Some(cell) {
            return false;
        }
        self.low_byte_tolerance
            .map_or(true, |tol| (cell & 0xFF).abs_diff(self.value & 0xFF) <= u32::from(tol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockSurface;
    use proptest::prelude::*;
    use refimage_core::color::OPAQUE_WHITE;

    fn color_image() -> ReferenceImage {
        ReferenceImage::new(
            TargetKind::Color { slot: 0 },
            MockSurface::VIEW,
            SizePolicy::MatchView,
            OPAQUE_WHITE,
        )
    }

    #[test]
    fn test_size_policy() {
        assert_eq!(SizePolicy::MatchView.size_for(640, 480), (640, 480));
        assert_eq!(SizePolicy::ShortSideAtMost(256).size_for(200, 100), (200, 100));
        assert_eq!(SizePolicy::ShortSideAtMost(256).size_for(1024, 512), (512, 256));
        assert_eq!(SizePolicy::ShortSideAtMost(256).size_for(512, 1024), (256, 512));
    }

    #[test]
    fn test_new_image_is_clean_and_empty() {
        let image = color_image();
        assert!(!image.needs_update());
        assert_eq!(image.width(), 0);
        assert_eq!(image.stale_pixels().val(IVec2::ZERO), 0);
    }

    #[test]
    fn test_schedule_is_cumulative() {
        let mut image = color_image();
        image.schedule_update(false, true);
        image.schedule_update(true, false);
        assert_eq!(image.pending(), PendingUpdate::BOTH);
    }

    #[test]
    fn test_empty_schedule_is_ignored() {
        let mut image = color_image();
        image.schedule_update(false, false);
        assert!(!image.needs_update());
    }

    #[test]
    fn test_repeated_schedule_updates_once() {
        let mut surface = MockSurface::new(4, 4);
        let mut image = color_image();
        for _ in 0..3 {
            image.schedule_update(true, false);
        }
        assert!(image.update(&mut surface).unwrap());
        assert!(!image.update(&mut surface).unwrap());
        assert_eq!(surface.renders, 1);
        assert!(!image.needs_update());
    }

    #[test]
    fn test_update_sizes_from_view() {
        let mut surface = MockSurface::new(6, 3);
        let mut image = color_image();
        image.schedule_update(true, false);
        image.update(&mut surface).unwrap();
        assert_eq!((image.width(), image.height()), (6, 3));
        assert_eq!(image.stale_pixels().val(IVec2::new(5, 2)), OPAQUE_WHITE);
    }

    #[test]
    fn test_resize_marks_stale() {
        let mut surface = MockSurface::new(4, 4);
        let mut image = color_image();
        image.schedule_update(true, true);
        image.update(&mut surface).unwrap();
        assert!(image.texture().is_some());

        assert!(!image.resize(4, 4, DVec2::ZERO));
        assert!(!image.needs_update());

        assert!(image.resize(8, 2, DVec2::ZERO));
        assert_eq!(image.pending(), PendingUpdate::BOTH);
    }

    #[test]
    fn test_tex_only_request_refreshes_on_read() {
        let mut surface = MockSurface::new(4, 4);
        surface.paint(IVec2::new(1, 1), build_rgba(200, 10, 10, 255));
        let mut image = color_image();
        image.schedule_update(false, true);

        let pixels = image.pixels(&mut surface);
        assert_eq!(pixels.red(IVec2::new(1, 1)), 200);
        assert_eq!(pixels.grey(IVec2::new(0, 0)), 255);
        assert_eq!(surface.renders, 1);
        assert_eq!(surface.texture_copies, 1);

        image.pixels(&mut surface);
        assert_eq!(surface.renders, 1);
    }

    #[test]
    fn test_failed_refresh_keeps_request() {
        let mut surface = MockSurface::new(4, 4);
        surface.fail_renders = true;
        let mut image = color_image();
        image.schedule_update(true, false);
        image.pixels(&mut surface);
        assert!(image.needs_update());
        assert!(image.update(&mut surface).is_err());
    }

    #[test]
    fn test_stale_pixels_do_not_refresh() {
        let mut surface = MockSurface::new(4, 4);
        let mut image = color_image();
        image.schedule_update(true, false);
        let _ = image.stale_pixels();
        assert_eq!(surface.renders, 0);
        image.update(&mut surface).unwrap();
        assert_eq!(surface.renders, 1);
    }

    #[test]
    fn test_blend_is_opaque_mix() {
        let mut image = color_image();
        image.resize(2, 2, DVec2::ZERO);
        image.fill_components(0, 0, 0, 0);
        image.blend(IVec2::new(0, 0), Vec3::ONE, 0.5);
        let px = image.stale_pixels();
        assert_eq!(px.alpha(IVec2::new(0, 0)), 255);
        assert!((i32::from(px.red(IVec2::new(0, 0))) - 128).abs() <= 1);
        assert_eq!(px.val(IVec2::new(1, 1)), 0);
    }

    #[test]
    fn test_find_val_in_box() {
        let mut image = color_image();
        image.resize(9, 9, DVec2::ZERO);
        image.fill(1);
        image.set(IVec2::new(4, 4), 42);
        let px = image.stale_pixels();
        assert!(px.find_val_in_box(42, IVec2::new(4, 4), 0));
        assert!(px.find_val_in_box(42, IVec2::new(6, 2), 2));
        assert!(!px.find_val_in_box(42, IVec2::new(7, 4), 2));
        assert!(!px.find_val_in_box(42, IVec2::new(40, 40), 3));
    }

    #[test]
    fn test_masked_box_search() {
        let mut image = color_image();
        image.resize(5, 5, DVec2::ZERO);
        image.fill(0);
        image.set(IVec2::new(2, 2), 0xAB00_0010);
        image.set(IVec2::new(3, 2), 0xAB00_0090);
        let px = image.stale_pixels();

        let query = MaskedMatch::new(0xAB00_0010, 0xFFFF_FF00).excluding(0xAB00_0010);
        assert!(px.find_masked_in_box(&query, IVec2::new(2, 2), 1));
        assert!(!px.find_masked_in_box(&query, IVec2::new(2, 2), 0));

        let tight = query.with_low_byte_tolerance(0x10);
        assert!(!px.find_masked_in_box(&tight, IVec2::new(2, 2), 1));
    }

    #[test]
    fn test_copy_and_load_flip_rows() {
        let mut image = color_image();
        image.resize(2, 3, DVec2::ZERO);
        image.fill(build_rgba(0, 0, 0, 255));
        image.set(IVec2::new(1, 0), build_rgba(9, 8, 7, 6));

        let rgba = image.stale_pixels().copy_rgba();
        assert_eq!(rgba.get_pixel(1, 2).0, [9, 8, 7, 6]);
        assert_eq!(image.stale_pixels().copy_rgb().get_pixel(1, 2).0, [9, 8, 7]);

        let mut other = color_image();
        other.load_rgba(&rgba).unwrap();
        assert_eq!(other.stale_pixels().values(), image.stale_pixels().values());
    }

    #[test]
    fn test_load_values_checks_length() {
        let mut image = color_image();
        let err = image.load_values(2, 2, &[0; 3]).unwrap_err();
        assert!(matches!(
            err,
            RefImageError::SizeMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    proptest! {
        #[test]
        fn prop_box_search_is_chebyshev(
            w in 1u32..12,
            h in 1u32..12,
            (vx, vy) in (0u32..12, 0u32..12),
            (cx, cy) in (0u32..12, 0u32..12),
            radius in 0u32..4,
        ) {
            let value = IVec2::new((vx % w) as i32, (vy % h) as i32);
            let center = IVec2::new((cx % w) as i32, (cy % h) as i32);
            let mut image = color_image();
            image.resize(w, h, DVec2::ZERO);
            image.fill(1);
            image.set(value, 42);
            let px = image.stale_pixels();

            let d = (value - center).abs();
            let expected = d.x.max(d.y) <= radius as i32;
            prop_assert_eq!(px.find_val_in_box(42, center, radius), expected);
            let query = MaskedMatch::new(42, u32::MAX);
            prop_assert_eq!(px.find_masked_in_box(&query, center, radius), expected);
        }
    }
}
