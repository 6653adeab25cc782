//! Per-view pool of full-color reference images.

use glam::DVec2;
use refimage_core::color::OPAQUE_WHITE;
use refimage_core::{Options, ViewId};

use crate::error::RenderResult;
use crate::reference_image::{ReferenceImage, SizePolicy};
use crate::surface::{RenderSurface, TargetKind, TextureHandle};

/// Color slots of one view.
///
/// Each slot holds an independent full-color render, so one frame can carry
/// several shading passes side by side. Slots are created on first lookup.
#[derive(Debug)]
pub struct ColorCache {
    view: ViewId,
    max_slots: usize,
    ndc_offset: DVec2,
    debug: bool,
    slots: Vec<Option<ReferenceImage>>,
}

impl ColorCache {
    pub fn new(view: ViewId, options: &Options) -> Self {
        Self {
            view,
            max_slots: options.max_color_slots,
            ndc_offset: DVec2::from_array(options.default_ndc_offset),
            debug: options.debug_ref_images,
            slots: Vec::new(),
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// The image in `slot`, created if needed. `None` if the slot index is
    /// beyond the configured maximum.
    pub fn lookup(&mut self, slot: usize) -> Option<&mut ReferenceImage> {
        if slot >= self.max_slots {
            log::warn!(
                "color slot {slot} of {} requested, max is {}",
                self.view,
                self.max_slots
            );
            return None;
        }
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        let (view, offset, debug) = (self.view, self.ndc_offset, self.debug);
        let image = self.slots[slot].get_or_insert_with(|| {
            ReferenceImage::new(
                TargetKind::Color { slot },
                view,
                SizePolicy::MatchView,
                OPAQUE_WHITE,
            )
            .with_ndc_offset(offset)
            .with_debug(debug)
        });
        Some(image)
    }

    /// The image in `slot` if it has been created.
    pub fn get(&self, slot: usize) -> Option<&ReferenceImage> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Marks `slot` for refresh. Returns `false` if the slot is unavailable.
    pub fn schedule_update(&mut self, slot: usize, main_mem: bool, tex_mem: bool) -> bool {
        match self.lookup(slot) {
            Some(image) => {
                image.schedule_update(main_mem, tex_mem);
                true
            }
            None => false,
        }
    }

    /// Refreshes every slot with a pending request. Returns how many slots
    /// were refreshed.
    ///
    /// A failing slot does not stop the others. Failed slots stay pending
    /// and the first failure is returned once every slot has been tried.
    pub fn update_images(&mut self, surface: &mut dyn RenderSurface) -> RenderResult<usize> {
        let mut refreshed = 0;
        let mut first_err = None;
        for (slot, image) in self.slots.iter_mut().enumerate() {
            let Some(image) = image else { continue };
            match image.update(surface) {
                Ok(true) => refreshed += 1,
                Ok(false) => {}
                Err(err) => {
                    log::warn!("color slot {slot} of {} failed to refresh: {err}", self.view);
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(refreshed),
        }
    }

    /// Resizes every created slot.
    pub fn resize_all(&mut self, width: u32, height: u32, ndc_offset: DVec2) {
        self.ndc_offset = ndc_offset;
        for image in self.slots.iter_mut().flatten() {
            image.resize(width, height, ndc_offset);
        }
    }

    /// The texture of `slot`, if it has been copied to texture memory.
    pub fn lookup_texture(&self, slot: usize) -> Option<TextureHandle> {
        self.get(slot).and_then(ReferenceImage::texture)
    }

    /// Created slots and their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ReferenceImage)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|image| (i, image)))
    }
}
