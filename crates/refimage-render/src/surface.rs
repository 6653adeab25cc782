//! The renderer collaborator.
//!
//! A [`RenderSurface`] owns the framebuffer that scene passes are drawn into
//! and the textures that cached images are uploaded to. Reference images only
//! ever touch the GPU through this trait.

use refimage_core::ViewId;

use crate::error::RenderResult;

/// Opaque handle to a texture owned by a [`RenderSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// What a render target is for. Scene drawers pick their shading from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Full-color render stored in a color slot.
    Color { slot: usize },
    /// Item-buffer render: each primitive drawn with its encoded key.
    Item,
    /// Downscaled item-buffer render used for visibility queries.
    Visibility,
}

/// A request to draw the scene of one view into the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub kind: TargetKind,
    pub view: ViewId,
    pub width: u32,
    pub height: u32,
    /// Packed RGBA the framebuffer is cleared to before drawing.
    pub clear_rgba: u32,
}

/// Bits per channel of the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelBits {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl ChannelBits {
    /// An 8-bit-per-channel RGBA framebuffer.
    pub const RGBA8: Self = Self {
        red: 8,
        green: 8,
        blue: 8,
        alpha: 8,
    };

    /// Whether every channel, including alpha, stores a full byte.
    #[must_use]
    pub fn is_full_rgba(self) -> bool {
        self == Self::RGBA8
    }
}

/// Draws scenes and moves pixels between framebuffer, textures, and RAM.
///
/// Pixels are packed RGBA (see `refimage_core::color`), row-major with the
/// origin at the bottom-left.
pub trait RenderSurface {
    /// Current size of a view in pixels, or `None` if the view is unknown.
    fn view_size(&self, view: ViewId) -> Option<(u32, u32)>;

    /// Clears the framebuffer and draws the scene for `target`.
    fn render_scene_into(&mut self, target: &RenderTarget) -> RenderResult<()>;

    /// Reads the lower-left `width x height` framebuffer region into `out`.
    fn read_pixels(&mut self, width: u32, height: u32, out: &mut [u32]) -> RenderResult<()>;

    /// Writes `pixels` into the lower-left region of the framebuffer.
    fn draw_pixels(&mut self, width: u32, height: u32, pixels: &[u32]) -> RenderResult<()>;

    /// Copies the lower-left framebuffer region into a texture.
    ///
    /// Reuses `texture` when given and large enough; otherwise allocates a new
    /// texture. Returns the handle now holding the pixels.
    fn copy_to_texture(
        &mut self,
        texture: Option<TextureHandle>,
        width: u32,
        height: u32,
    ) -> RenderResult<TextureHandle>;

    /// Draws a texture over the framebuffer.
    fn draw_texture(&mut self, texture: TextureHandle) -> RenderResult<()>;

    /// Bit depths of the framebuffer channels.
    fn channel_bits(&self) -> ChannelBits;
}
