//! Pixel, NDC, and packed-index coordinates for a `W x H` raster.
//!
//! Three encodings address the same cell:
//! - **pixel**: integer `(x, y)`, origin at the bottom-left cell;
//! - **NDC**: a square of side `2 * min(w, h)` pixels centered on the raster,
//!   so the shorter axis spans `[-1, 1]`;
//! - **index**: `y * w + x`, the position in a flat row-major array.
//!
//! Clamping conversions ([`CoordinateFrame::pix_to_index`],
//! [`CoordinateFrame::ndc_to_index`]) map off-raster locations to the nearest
//! edge cell. Call sites that must detect out-of-range input use
//! [`CoordinateFrame::pix_in_range`] and [`CoordinateFrame::index_in_range`].

use glam::{DVec2, IVec2};

/// Absorbs float error so the corner of pixel `p` maps back to `p`.
const SNAP_EPS: f64 = 1e-9;

/// A cell address in any of the three encodings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loc {
    /// Packed row-major index.
    Index(usize),
    /// Normalized device coordinate.
    Ndc(DVec2),
    /// Integer pixel coordinate.
    Pixel(IVec2),
}

impl From<usize> for Loc {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<DVec2> for Loc {
    fn from(ndc: DVec2) -> Self {
        Self::Ndc(ndc)
    }
}

impl From<IVec2> for Loc {
    fn from(pix: IVec2) -> Self {
        Self::Pixel(pix)
    }
}

impl From<(i32, i32)> for Loc {
    fn from((x, y): (i32, i32)) -> Self {
        Self::Pixel(IVec2::new(x, y))
    }
}

/// Extents of a raster and the conversions between its coordinate encodings.
///
/// A default frame is `0 x 0`; conversions on it are defined but meaningless
/// until [`CoordinateFrame::configure`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordinateFrame {
    width: u32,
    height: u32,
    max: usize,
    half_width: f64,
    half_height: f64,
    half_min_dim: f64,
    ndc_offset: DVec2,
}

impl CoordinateFrame {
    /// Creates a configured frame.
    pub fn new(width: u32, height: u32, ndc_offset: DVec2) -> Self {
        let mut frame = Self::default();
        frame.configure(width, height, ndc_offset);
        frame
    }

    /// Sets the extents and NDC offset.
    pub fn configure(&mut self, width: u32, height: u32, ndc_offset: DVec2) {
        self.width = width;
        self.height = height;
        self.max = width as usize * height as usize;
        self.half_width = f64::from(width) / 2.0;
        self.half_height = f64::from(height) / 2.0;
        self.half_min_dim = self.half_width.min(self.half_height);
        self.ndc_offset = ndc_offset;
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells, `width * height`.
    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max == 0
    }

    /// Half of the shorter side, in pixels. One NDC unit spans this many pixels.
    #[must_use]
    pub fn half_min_dim(&self) -> f64 {
        self.half_min_dim
    }

    #[must_use]
    pub fn ndc_offset(&self) -> DVec2 {
        self.ndc_offset
    }

    /// NDC units covered by one pixel of this frame.
    #[must_use]
    pub fn pix_to_ndc_scale(&self) -> f64 {
        if self.half_min_dim > 0.0 {
            1.0 / self.half_min_dim
        } else {
            0.0
        }
    }

    // ========== Range predicates ==========

    #[must_use]
    pub fn index_in_range(&self, index: usize) -> bool {
        index < self.max
    }

    #[must_use]
    pub fn pix_in_range(&self, pix: IVec2) -> bool {
        pix.x >= 0 && pix.y >= 0 && (pix.x as u32) < self.width && (pix.y as u32) < self.height
    }

    // ========== Pixel <-> index ==========

    /// Clamped pixel to index. Off-raster pixels alias the nearest edge cell.
    #[must_use]
    pub fn pix_to_index(&self, pix: IVec2) -> usize {
        if self.is_empty() {
            return 0;
        }
        let x = pix.x.clamp(0, self.width as i32 - 1);
        let y = pix.y.clamp(0, self.height as i32 - 1);
        y as usize * self.width as usize + x as usize
    }

    #[must_use]
    pub fn index_to_pix(&self, index: usize) -> IVec2 {
        if self.width == 0 {
            return IVec2::ZERO;
        }
        let w = self.width as usize;
        IVec2::new((index % w) as i32, (index / w) as i32)
    }

    // ========== Pixel <-> NDC ==========

    #[must_use]
    pub fn pix_to_ndc(&self, pix: IVec2) -> DVec2 {
        if self.half_min_dim <= 0.0 {
            return DVec2::ZERO;
        }
        DVec2::new(
            (f64::from(pix.x) - self.half_width) / self.half_min_dim,
            (f64::from(pix.y) - self.half_height) / self.half_min_dim,
        )
    }

    #[must_use]
    pub fn ndc_to_pix(&self, ndc: DVec2) -> IVec2 {
        IVec2::new(
            (ndc.x * self.half_min_dim + self.half_width + SNAP_EPS).floor() as i32,
            (ndc.y * self.half_min_dim + self.half_height + SNAP_EPS).floor() as i32,
        )
    }

    // ========== NDC <-> index ==========

    /// Index to NDC in the logical (offset) frame.
    #[must_use]
    pub fn index_to_ndc(&self, index: usize) -> DVec2 {
        self.pix_to_ndc(self.index_to_pix(index)) + self.ndc_offset
    }

    /// Clamped NDC to index; the offset is removed before locating the pixel.
    #[must_use]
    pub fn ndc_to_index(&self, ndc: DVec2) -> usize {
        self.pix_to_index(self.ndc_to_pix(ndc - self.ndc_offset))
    }

    /// Resolves any address to a clamped index.
    #[must_use]
    pub fn resolve(&self, loc: Loc) -> usize {
        match loc {
            Loc::Index(index) => index.min(self.max.saturating_sub(1)),
            Loc::Ndc(ndc) => self.ndc_to_index(ndc),
            Loc::Pixel(pix) => self.pix_to_index(pix),
        }
    }

    /// Resolves any address to a pixel, without clamping NDC or pixel input.
    #[must_use]
    pub fn resolve_pix(&self, loc: Loc) -> IVec2 {
        match loc {
            Loc::Index(index) => self.index_to_pix(index),
            Loc::Ndc(ndc) => self.ndc_to_pix(ndc),
            Loc::Pixel(pix) => pix,
        }
    }
}
