//! Resizable 2D buffers addressed through a [`CoordinateFrame`].

use glam::DVec2;

use crate::coords::{CoordinateFrame, Loc};

/// A `W x H` grid of values stored row-major in a flat vector.
///
/// Resizing reallocates the backing store; previous contents are not
/// preserved. Cell access clamps off-raster addresses to the nearest edge
/// cell, so lookups near the border degrade gracefully instead of faulting.
#[derive(Debug, Clone, Default)]
pub struct Raster2D<T> {
    frame: CoordinateFrame,
    values: Vec<T>,
}

impl<T: Copy + Default> Raster2D<T> {
    /// Creates a raster of the given size filled with `T::default()`.
    pub fn new(width: u32, height: u32) -> Self {
        let mut raster = Self {
            frame: CoordinateFrame::default(),
            values: Vec::new(),
        };
        raster.resize(width, height, DVec2::ZERO);
        raster
    }

    /// Returns the coordinate frame.
    #[must_use]
    pub fn frame(&self) -> &CoordinateFrame {
        &self.frame
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resizes the raster.
    ///
    /// Returns `false` and leaves the raster untouched if the dimensions are
    /// unchanged (a new NDC offset is still recorded). Otherwise the backing
    /// store is reallocated and `true` is returned.
    pub fn resize(&mut self, width: u32, height: u32, ndc_offset: DVec2) -> bool {
        if width == self.frame.width() && height == self.frame.height() {
            self.frame.configure(width, height, ndc_offset);
            return false;
        }
        self.frame.configure(width, height, ndc_offset);
        self.values = vec![T::default(); self.frame.max()];
        true
    }

    /// Sets every cell to `value`.
    pub fn clear(&mut self, value: T) {
        self.values.fill(value);
    }

    /// Returns the cell at `loc`, clamped. `None` only for an empty raster.
    pub fn get(&self, loc: impl Into<Loc>) -> Option<&T> {
        let index = self.frame.resolve(loc.into());
        self.values.get(index)
    }

    /// Returns the mutable cell at `loc`, clamped. `None` only for an empty raster.
    pub fn get_mut(&mut self, loc: impl Into<Loc>) -> Option<&mut T> {
        let index = self.frame.resolve(loc.into());
        self.values.get_mut(index)
    }

    /// Returns all cells in row-major order.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns all cells in row-major order, mutably.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }
}
