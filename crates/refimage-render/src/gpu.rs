//! wgpu-backed [`RenderSurface`].
//!
//! The framebuffer is an `Rgba8Unorm` texture sized to the last render
//! target. Pixels cross the CPU boundary as packed RGBA with a bottom-left
//! origin, so rows are flipped on every upload and readback.

use std::collections::HashMap;

use refimage_core::color::{from_bytes, to_bytes};
use refimage_core::ViewId;

use crate::error::{RenderError, RenderResult};
use crate::surface::{ChannelBits, RenderSurface, RenderTarget, TextureHandle};

const FRAMEBUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Everything a [`SceneDrawer`] needs to record one pass.
pub struct DrawContext<'a> {
    /// The wgpu device.
    pub device: &'a wgpu::Device,
    /// The wgpu queue.
    pub queue: &'a wgpu::Queue,
    /// The command encoder. The framebuffer has already been cleared.
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// The framebuffer color view.
    pub color_view: &'a wgpu::TextureView,
    /// The framebuffer depth view, cleared to 1.0.
    pub depth_view: &'a wgpu::TextureView,
}

/// Records the draw calls for a scene.
///
/// Item and visibility targets expect every primitive to be drawn flat with
/// its encoded key as the color and blending disabled.
pub trait SceneDrawer {
    fn draw(&mut self, ctx: &mut DrawContext<'_>, target: &RenderTarget) -> RenderResult<()>;
}

impl<F> SceneDrawer for F
where
    F: FnMut(&mut DrawContext<'_>, &RenderTarget) -> RenderResult<()>,
{
    fn draw(&mut self, ctx: &mut DrawContext<'_>, target: &RenderTarget) -> RenderResult<()> {
        self(ctx, target)
    }
}

struct Framebuffer {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Framebuffer {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("reference framebuffer"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAMEBUFFER_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("reference depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            width: size.width,
            height: size.height,
        }
    }

    /// Texture-space origin of the lower-left `height` rows.
    fn lower_left(&self, height: u32) -> wgpu::Origin3d {
        lower_rows(self.height, height)
    }

    fn holds(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }
}

struct CachedTexture {
    texture: wgpu::Texture,
    width: u32,
    height: u32,
    /// Size of the last framebuffer copy, held in the lower-left corner.
    copied: (u32, u32),
}

/// Origin of the lower-left `height` rows of a top-left-origin texture
/// `alloc_height` rows tall.
fn lower_rows(alloc_height: u32, height: u32) -> wgpu::Origin3d {
    wgpu::Origin3d {
        x: 0,
        y: alloc_height.saturating_sub(height),
        z: 0,
    }
}

/// Renders reference images on a wgpu device.
pub struct GpuSurface<D: SceneDrawer> {
    device: wgpu::Device,
    queue: wgpu::Queue,
    drawer: D,
    framebuffer: Framebuffer,
    views: HashMap<ViewId, (u32, u32)>,
    textures: HashMap<TextureHandle, CachedTexture>,
    next_texture: u64,
}

impl<D: SceneDrawer> GpuSurface<D> {
    /// Wraps an existing device.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, drawer: D) -> Self {
        let framebuffer = Framebuffer::new(&device, 1, 1);
        Self {
            device,
            queue,
            drawer,
            framebuffer,
            views: HashMap::new(),
            textures: HashMap::new(),
            next_texture: 1,
        }
    }

    /// Creates a surface on its own device, without a window.
    pub async fn new_headless(drawer: D) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("refimage device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        log::info!("headless reference surface on {}", adapter.get_info().name);
        Ok(Self::new(device, queue, drawer))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn drawer(&self) -> &D {
        &self.drawer
    }

    pub fn drawer_mut(&mut self) -> &mut D {
        &mut self.drawer
    }

    /// Registers or resizes a view.
    pub fn set_view_size(&mut self, view: ViewId, width: u32, height: u32) {
        self.views.insert(view, (width, height));
    }

    pub fn remove_view(&mut self, view: ViewId) -> bool {
        self.views.remove(&view).is_some()
    }

    /// The wgpu texture behind a handle, for binding in image-space passes.
    pub fn texture(&self, handle: TextureHandle) -> Option<&wgpu::Texture> {
        self.textures.get(&handle).map(|t| &t.texture)
    }

    /// Releases a texture. Returns `false` if the handle was unknown.
    pub fn release_texture(&mut self, handle: TextureHandle) -> bool {
        self.textures.remove(&handle).is_some()
    }

    /// Calculates bytes per row with proper alignment for wgpu buffer copies.
    fn aligned_bytes_per_row(width: u32) -> u32 {
        let unaligned = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        unaligned.div_ceil(align) * align
    }

    fn ensure_framebuffer(&mut self, width: u32, height: u32) {
        if self.framebuffer.width != width.max(1) || self.framebuffer.height != height.max(1) {
            log::debug!("reallocating reference framebuffer to {width}x{height}");
            self.framebuffer = Framebuffer::new(&self.device, width, height);
        }
    }

    fn check_len(width: u32, height: u32, len: usize) -> RenderResult<()> {
        let expected = width as usize * height as usize;
        if len == expected {
            Ok(())
        } else {
            Err(RenderError::SizeMismatch {
                expected,
                actual: len,
            })
        }
    }

    fn extent(width: u32, height: u32) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    fn clear_color(rgba: u32) -> wgpu::Color {
        let [r, g, b, a] = to_bytes(rgba);
        wgpu::Color {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
            a: f64::from(a) / 255.0,
        }
    }
}

impl<D: SceneDrawer> RenderSurface for GpuSurface<D> {
    fn view_size(&self, view: ViewId) -> Option<(u32, u32)> {
        self.views.get(&view).copied()
    }

    fn render_scene_into(&mut self, target: &RenderTarget) -> RenderResult<()> {
        if !self.views.contains_key(&target.view) {
            return Err(RenderError::ViewUnavailable(target.view));
        }
        self.ensure_framebuffer(target.width, target.height);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("reference render encoder"),
            });

        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("reference clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.framebuffer.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(Self::clear_color(target.clear_rgba)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.framebuffer.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
        }

        let mut ctx = DrawContext {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut encoder,
            color_view: &self.framebuffer.color_view,
            depth_view: &self.framebuffer.depth_view,
        };
        self.drawer.draw(&mut ctx, target)?;

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn read_pixels(&mut self, width: u32, height: u32, out: &mut [u32]) -> RenderResult<()> {
        Self::check_len(width, height, out.len())?;
        if width == 0 || height == 0 {
            return Ok(());
        }
        if !self.framebuffer.holds(width, height) {
            return Err(RenderError::SizeMismatch {
                expected: self.framebuffer.width as usize * self.framebuffer.height as usize,
                actual: out.len(),
            });
        }

        let bytes_per_row = Self::aligned_bytes_per_row(width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("reference readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("reference readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.framebuffer.color,
                mip_level: 0,
                origin: self.framebuffer.lower_left(height),
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            Self::extent(width, height),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| RenderError::Timeout)?
            .map_err(|e| RenderError::ReadbackFailed(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let row_bytes = width as usize * 4;
        // Texture rows run top-down; output rows run bottom-up.
        for (dst_row, out_row) in out.chunks_exact_mut(width as usize).enumerate() {
            let src_row = height as usize - 1 - dst_row;
            let start = src_row * bytes_per_row as usize;
            let texels: &[[u8; 4]] = bytemuck::cast_slice(&data[start..start + row_bytes]);
            for (dst, texel) in out_row.iter_mut().zip(texels) {
                *dst = from_bytes(*texel);
            }
        }
        drop(data);
        buffer.unmap();
        Ok(())
    }

    fn draw_pixels(&mut self, width: u32, height: u32, pixels: &[u32]) -> RenderResult<()> {
        Self::check_len(width, height, pixels.len())?;
        if width == 0 || height == 0 {
            return Ok(());
        }
        if !self.framebuffer.holds(width, height) {
            self.ensure_framebuffer(width, height);
        }

        let texels: Vec<[u8; 4]> = pixels
            .chunks_exact(width as usize)
            .rev()
            .flat_map(|row| row.iter().map(|&p| to_bytes(p)))
            .collect();
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.framebuffer.color,
                mip_level: 0,
                origin: self.framebuffer.lower_left(height),
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            Self::extent(width, height),
        );
        Ok(())
    }

    fn copy_to_texture(
        &mut self,
        texture: Option<TextureHandle>,
        width: u32,
        height: u32,
    ) -> RenderResult<TextureHandle> {
        if width == 0 || height == 0 || !self.framebuffer.holds(width, height) {
            return Err(RenderError::TextureCreationFailed(format!(
                "cannot copy {width}x{height} from a {}x{} framebuffer",
                self.framebuffer.width, self.framebuffer.height
            )));
        }

        let handle = texture.unwrap_or_else(|| {
            self.next_texture += 1;
            TextureHandle(self.next_texture)
        });
        let reusable = self
            .textures
            .get(&handle)
            .is_some_and(|t| t.width >= width && t.height >= height);
        if !reusable {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("reference image texture"),
                size: Self::extent(width, height),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FRAMEBUFFER_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            self.textures.insert(
                handle,
                CachedTexture {
                    texture,
                    width,
                    height,
                    copied: (width, height),
                },
            );
        }
        let Some(cached) = self.textures.get_mut(&handle) else {
            return Err(RenderError::UnknownTexture(handle));
        };
        cached.copied = (width, height);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("reference texture copy encoder"),
            });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.framebuffer.color,
                mip_level: 0,
                origin: self.framebuffer.lower_left(height),
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &cached.texture,
                mip_level: 0,
                origin: lower_rows(cached.height, height),
                aspect: wgpu::TextureAspect::All,
            },
            Self::extent(width, height),
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(handle)
    }

    fn draw_texture(&mut self, texture: TextureHandle) -> RenderResult<()> {
        let (width, height) = match self.textures.get(&texture) {
            Some(t) => t.copied,
            None => return Err(RenderError::UnknownTexture(texture)),
        };
        if !self.framebuffer.holds(width, height) {
            self.ensure_framebuffer(width, height);
        }
        let Some(cached) = self.textures.get(&texture) else {
            return Err(RenderError::UnknownTexture(texture));
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("reference texture draw encoder"),
            });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &cached.texture,
                mip_level: 0,
                origin: lower_rows(cached.height, height),
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &self.framebuffer.color,
                mip_level: 0,
                origin: self.framebuffer.lower_left(height),
                aspect: wgpu::TextureAspect::All,
            },
            Self::extent(width, height),
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn channel_bits(&self) -> ChannelBits {
        ChannelBits::RGBA8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        type Surface = GpuSurface<fn(&mut DrawContext<'_>, &RenderTarget) -> RenderResult<()>>;
        assert_eq!(Surface::aligned_bytes_per_row(1), 256);
        assert_eq!(Surface::aligned_bytes_per_row(64), 256);
        assert_eq!(Surface::aligned_bytes_per_row(65), 512);
    }

    #[test]
    fn test_lower_rows_origin() {
        let origin = lower_rows(480, 300);
        assert_eq!((origin.x, origin.y, origin.z), (0, 180, 0));
        assert_eq!(lower_rows(300, 300).y, 0);
        assert_eq!(lower_rows(10, 20).y, 0);
    }

    #[test]
    fn test_clear_color_is_exact_per_byte() {
        type Surface = GpuSurface<fn(&mut DrawContext<'_>, &RenderTarget) -> RenderResult<()>>;
        let c = Surface::clear_color(refimage_core::color::build_rgba(255, 0, 51, 255));
        assert!((c.r - 1.0).abs() < 1e-12);
        assert!(c.g.abs() < 1e-12);
        assert!((c.b - 0.2).abs() < 1e-12);
    }
}
