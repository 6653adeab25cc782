//! Shared in-memory collaborators for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use refimage::*;

/// Surface whose scene is a fixed list of painted pixels.
pub struct PaintedSurface {
    pub views: HashMap<ViewId, (u32, u32)>,
    pub scene: Vec<(IVec2, u32)>,
    pub framebuffer: Vec<u32>,
    pub fb_size: (u32, u32),
    pub renders: usize,
    next_texture: u64,
}

impl PaintedSurface {
    pub fn new(view: ViewId, width: u32, height: u32) -> Self {
        Self {
            views: HashMap::from([(view, (width, height))]),
            scene: Vec::new(),
            framebuffer: Vec::new(),
            fb_size: (0, 0),
            renders: 0,
            next_texture: 0,
        }
    }

    pub fn paint(&mut self, x: i32, y: i32, rgba: u32) {
        self.scene.push((IVec2::new(x, y), rgba));
    }
}

impl RenderSurface for PaintedSurface {
    fn view_size(&self, view: ViewId) -> Option<(u32, u32)> {
        self.views.get(&view).copied()
    }

    fn render_scene_into(&mut self, target: &RenderTarget) -> RenderResult<()> {
        self.renders += 1;
        let (w, h) = (target.width as usize, target.height as usize);
        self.fb_size = (target.width, target.height);
        self.framebuffer = vec![target.clear_rgba; w * h];
        for &(pix, rgba) in &self.scene {
            if pix.x >= 0 && pix.y >= 0 && (pix.x as usize) < w && (pix.y as usize) < h {
                self.framebuffer[pix.y as usize * w + pix.x as usize] = rgba;
            }
        }
        Ok(())
    }

    fn read_pixels(&mut self, width: u32, height: u32, out: &mut [u32]) -> RenderResult<()> {
        if self.fb_size != (width, height) {
            return Err(RenderError::SizeMismatch {
                expected: self.framebuffer.len(),
                actual: out.len(),
            });
        }
        out.copy_from_slice(&self.framebuffer);
        Ok(())
    }

    fn draw_pixels(&mut self, width: u32, height: u32, pixels: &[u32]) -> RenderResult<()> {
        self.fb_size = (width, height);
        self.framebuffer = pixels.to_vec();
        Ok(())
    }

    fn copy_to_texture(
        &mut self,
        texture: Option<TextureHandle>,
        _width: u32,
        _height: u32,
    ) -> RenderResult<TextureHandle> {
        Ok(texture.unwrap_or_else(|| {
            self.next_texture += 1;
            TextureHandle(self.next_texture)
        }))
    }

    fn draw_texture(&mut self, _texture: TextureHandle) -> RenderResult<()> {
        Ok(())
    }

    fn channel_bits(&self) -> ChannelBits {
        ChannelBits::RGBA8
    }
}

/// Registry resolving keys through a plain table; every simplex belongs to
/// mesh 0.
#[derive(Default)]
pub struct TableRegistry {
    pub keys: HashMap<SimplexKey, Simplex>,
}

impl TableRegistry {
    pub fn with(entries: &[(u32, Simplex)]) -> Self {
        Self {
            keys: entries
                .iter()
                .map(|&(k, s)| (SimplexKey(k), s))
                .collect(),
        }
    }
}

impl SimplexRegistry for TableRegistry {
    fn resolve(&self, key: SimplexKey) -> Option<Simplex> {
        self.keys.get(&key).copied()
    }

    fn patch_of(&self, _simplex: Simplex) -> Option<PatchId> {
        None
    }

    fn mesh_of(&self, _simplex: Simplex) -> Option<MeshId> {
        Some(MeshId(0))
    }

    fn face_of(&self, simplex: Simplex) -> Option<FaceId> {
        simplex.as_face()
    }
}

/// NDC of the center of pixel `(x, y)` in a frame.
pub fn ndc_of(frame: &CoordinateFrame, x: i32, y: i32) -> DVec2 {
    frame.index_to_ndc(frame.pix_to_index(IVec2::new(x, y)))
}
