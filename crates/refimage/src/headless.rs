//! Headless GPU surfaces.
//!
//! Useful for integration tests and batch picking, where no window exists.

use pollster::FutureExt;
use refimage_core::{RefImageError, Result, ViewId};
use refimage_render::{GpuSurface, SceneDrawer};

/// Creates a wgpu surface with one view of `width x height`, blocking until
/// the device is ready.
pub fn create_headless_surface<D: SceneDrawer>(
    drawer: D,
    view: ViewId,
    width: u32,
    height: u32,
) -> Result<GpuSurface<D>> {
    let mut surface = GpuSurface::new_headless(drawer)
        .block_on()
        .map_err(|e| RefImageError::RenderError(format!("failed to create headless surface: {e}")))?;
    surface.set_view_size(view, width, height);
    Ok(surface)
}
