//! In-memory render surface and mesh registry for unit tests.

use std::collections::{HashMap, HashSet};

use glam::{DVec2, DVec3, IVec2};
use refimage_core::{
    EdgeId, FaceId, MeshId, PatchId, Simplex, SimplexKey, SimplexRegistry, ViewId,
};

use crate::error::{RenderError, RenderResult};
use crate::surface::{ChannelBits, RenderSurface, RenderTarget, TargetKind, TextureHandle};

/// Surface whose "scene" is a fixed set of painted pixels.
pub struct MockSurface {
    pub views: HashMap<ViewId, (u32, u32)>,
    pub bits: ChannelBits,
    /// Pixels drawn over the clear color by every render.
    pub scene: Vec<(IVec2, u32)>,
    pub framebuffer: Vec<u32>,
    pub fb_size: (u32, u32),
    pub fail_renders: bool,
    /// Renders of this target kind fail.
    pub fail_kind: Option<TargetKind>,
    pub renders: usize,
    pub targets: Vec<RenderTarget>,
    pub texture_copies: usize,
    next_texture: u64,
}

impl MockSurface {
    pub const VIEW: ViewId = ViewId(0);

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            views: HashMap::from([(Self::VIEW, (width, height))]),
            bits: ChannelBits::RGBA8,
            scene: Vec::new(),
            framebuffer: Vec::new(),
            fb_size: (0, 0),
            fail_renders: false,
            fail_kind: None,
            renders: 0,
            targets: Vec::new(),
            texture_copies: 0,
            next_texture: 1,
        }
    }

    pub fn paint(&mut self, pix: IVec2, rgba: u32) {
        self.scene.push((pix, rgba));
    }
}

impl RenderSurface for MockSurface {
    fn view_size(&self, view: ViewId) -> Option<(u32, u32)> {
        self.views.get(&view).copied()
    }

    fn render_scene_into(&mut self, target: &RenderTarget) -> RenderResult<()> {
        if self.fail_renders || self.fail_kind == Some(target.kind) {
            return Err(RenderError::ViewUnavailable(target.view));
        }
        self.renders += 1;
        self.targets.push(*target);
        self.fb_size = (target.width, target.height);
        self.framebuffer = vec![target.clear_rgba; target.width as usize * target.height as usize];
        for &(pix, rgba) in &self.scene {
            if pix.x >= 0 && pix.y >= 0 && (pix.x as u32) < target.width && (pix.y as u32) < target.height {
                self.framebuffer[pix.y as usize * target.width as usize + pix.x as usize] = rgba;
            }
        }
        Ok(())
    }

    fn read_pixels(&mut self, width: u32, height: u32, out: &mut [u32]) -> RenderResult<()> {
        let expected = width as usize * height as usize;
        if out.len() != expected || self.fb_size != (width, height) {
            return Err(RenderError::SizeMismatch {
                expected,
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
        self.texture_copies += 1;
        Ok(texture.unwrap_or_else(|| {
            self.next_texture += 1;
            TextureHandle(self.next_texture)
        }))
    }

    fn draw_texture(&mut self, _texture: TextureHandle) -> RenderResult<()> {
        Ok(())
    }

    fn channel_bits(&self) -> ChannelBits {
        self.bits
    }
}

/// Registry with explicit tables for every capability.
#[derive(Default)]
pub struct MockRegistry {
    pub keys: HashMap<SimplexKey, Simplex>,
    pub patches: HashMap<Simplex, PatchId>,
    pub meshes: HashMap<Simplex, MeshId>,
    pub faces: HashMap<Simplex, FaceId>,
    pub silhouettes: HashSet<EdgeId>,
    pub back_facing: HashSet<FaceId>,
    pub hits: HashMap<FaceId, (Simplex, DVec3)>,
    pub centroids: HashMap<FaceId, DVec3>,
    pub borders: HashSet<(Simplex, FaceId)>,
    pub levels: HashMap<(FaceId, u32), FaceId>,
    pub edit_faces: HashMap<FaceId, FaceId>,
}

impl MockRegistry {
    /// Registers a simplex under `key`, owned by mesh 0.
    pub fn add(&mut self, key: u32, simplex: Simplex) -> &mut Self {
        self.keys.insert(SimplexKey(key), simplex);
        self.meshes.insert(simplex, MeshId(0));
        if let Simplex::Face(f) = simplex {
            self.faces.insert(simplex, f);
        }
        self
    }
}

impl SimplexRegistry for MockRegistry {
    fn resolve(&self, key: SimplexKey) -> Option<Simplex> {
        self.keys.get(&key).copied()
    }

    fn patch_of(&self, simplex: Simplex) -> Option<PatchId> {
        self.patches.get(&simplex).copied()
    }

    fn mesh_of(&self, simplex: Simplex) -> Option<MeshId> {
        self.meshes.get(&simplex).copied()
    }

    fn face_of(&self, simplex: Simplex) -> Option<FaceId> {
        self.faces.get(&simplex).copied()
    }

    fn is_silhouette(&self, edge: EdgeId) -> bool {
        self.silhouettes.contains(&edge)
    }

    fn is_front_facing(&self, face: FaceId) -> bool {
        !self.back_facing.contains(&face)
    }

    fn find_intersect(&self, face: FaceId, _ndc: DVec2) -> Option<(Simplex, DVec3)> {
        self.hits.get(&face).copied()
    }

    fn on_face(&self, simplex: Simplex, face: FaceId) -> bool {
        simplex == Simplex::Face(face) || self.borders.contains(&(simplex, face))
    }

    fn to_world(&self, _face: FaceId, point: DVec3) -> DVec3 {
        point + DVec3::new(100.0, 0.0, 0.0)
    }

    fn face_centroid(&self, face: FaceId) -> Option<DVec3> {
        self.centroids.get(&face).copied()
    }

    fn near_barycentric(&self, _face: FaceId, _ndc: DVec2) -> Option<DVec3> {
        Some(DVec3::new(0.2, 0.3, 0.5))
    }

    fn face_at_level(&self, face: FaceId, level: u32, bc: DVec3) -> Option<(FaceId, DVec3)> {
        self.levels.get(&(face, level)).map(|&f| (f, bc))
    }

    fn face_at_edit_level(&self, face: FaceId, bc: DVec3) -> Option<(FaceId, DVec3)> {
        self.edit_faces.get(&face).map(|&f| (f, bc))
    }
}
