//! Per-view registry of reference-image caches.

use std::collections::HashMap;
use std::sync::Arc;

use refimage_core::{
    DVec2, EventBus, Options, RefImageError, Result, SceneEvent, SimplexRegistry, ViewId,
};
use refimage_render::{
    CapabilityProbe, ColorCache, ItemBuffer, ItemView, KeyCodec, ReferenceImage, RenderSurface,
    VisibilityCache,
};

/// Every cache belonging to one view.
#[derive(Debug)]
struct ViewCaches {
    colors: ColorCache,
    items: ItemBuffer,
    visibility: VisibilityCache,
}

/// Owns the caches of every registered view and the event bus that keeps
/// their visibility caches current.
///
/// The context is created by the render loop and lives as long as it does.
/// Removing a view drops its caches, so a later view reusing the same id
/// starts from empty caches.
pub struct RefImageContext {
    options: Options,
    codec: Arc<dyn KeyCodec>,
    views: HashMap<ViewId, ViewCaches>,
    bus: EventBus,
}

impl RefImageContext {
    /// Creates a context with an explicit key codec.
    pub fn new(options: Options, codec: Arc<dyn KeyCodec>) -> Result<Self> {
        options.validate()?;
        log::info!("refimage context created (key mask {:#010x})", codec.key_mask());
        Ok(Self {
            options,
            codec,
            views: HashMap::new(),
            bus: EventBus::new(),
        })
    }

    /// Creates a context whose codec matches the framebuffer of `surface`,
    /// as recorded by the process-wide probe.
    pub fn for_surface(options: Options, surface: &dyn RenderSurface) -> Result<Self> {
        let codec = CapabilityProbe::global().codec(surface);
        Self::new(options, codec)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn codec(&self) -> &Arc<dyn KeyCodec> {
        &self.codec
    }

    // ========== View lifecycle ==========

    /// Creates the caches of a new view.
    pub fn register_view(&mut self, view: ViewId) -> Result<()> {
        if self.views.contains_key(&view) {
            return Err(RefImageError::ViewExists(view));
        }
        let mut visibility = VisibilityCache::new(view, Arc::clone(&self.codec), &self.options);
        visibility.observe(&mut self.bus);
        self.views.insert(
            view,
            ViewCaches {
                colors: ColorCache::new(view, &self.options),
                items: ItemBuffer::new(view, Arc::clone(&self.codec), &self.options),
                visibility,
            },
        );
        log::info!("registered {view}");
        Ok(())
    }

    /// Drops every cache of a view and its event subscription.
    pub fn remove_view(&mut self, view: ViewId) -> Result<()> {
        let mut caches = self
            .views
            .remove(&view)
            .ok_or(RefImageError::ViewNotFound(view))?;
        caches.visibility.unobserve(&mut self.bus);
        log::info!("removed {view}");
        Ok(())
    }

    pub fn has_view(&self, view: ViewId) -> bool {
        self.views.contains_key(&view)
    }

    /// Registered views, in no particular order.
    pub fn views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.keys().copied()
    }

    fn caches_mut(&mut self, view: ViewId) -> Result<&mut ViewCaches> {
        self.views
            .get_mut(&view)
            .ok_or(RefImageError::ViewNotFound(view))
    }

    // ========== Cache access ==========

    pub fn color_cache(&mut self, view: ViewId) -> Option<&mut ColorCache> {
        self.views.get_mut(&view).map(|c| &mut c.colors)
    }

    /// The image in a color slot, created on first use. `None` for unknown
    /// views or slots beyond the configured maximum.
    pub fn color_image(&mut self, view: ViewId, slot: usize) -> Option<&mut ReferenceImage> {
        self.color_cache(view)?.lookup(slot)
    }

    /// Requests a refresh of one color slot.
    pub fn schedule_color_update(
        &mut self,
        view: ViewId,
        slot: usize,
        main_mem: bool,
        tex_mem: bool,
    ) -> Result<()> {
        let colors = &mut self.caches_mut(view)?.colors;
        if colors.schedule_update(slot, main_mem, tex_mem) {
            Ok(())
        } else {
            Err(RefImageError::SlotOutOfRange {
                slot,
                max: colors.max_slots(),
            })
        }
    }

    pub fn item_buffer(&mut self, view: ViewId) -> Option<&mut ItemBuffer> {
        self.views.get_mut(&view).map(|c| &mut c.items)
    }

    /// Requests a refresh of a view's item buffer.
    pub fn schedule_item_update(
        &mut self,
        view: ViewId,
        pixels_to_patches: bool,
        main_mem: bool,
        tex_mem: bool,
    ) -> Result<()> {
        self.caches_mut(view)?
            .items
            .schedule_update(pixels_to_patches, main_mem, tex_mem);
        Ok(())
    }

    /// Item-buffer queries over fresh pixels.
    pub fn item_view<'a>(
        &'a mut self,
        view: ViewId,
        surface: &mut dyn RenderSurface,
        registry: &'a dyn SimplexRegistry,
    ) -> Option<ItemView<'a>> {
        let items = self.item_buffer(view)?;
        Some(items.view(surface, registry))
    }

    pub fn visibility(&mut self, view: ViewId) -> Option<&mut VisibilityCache> {
        self.views.get_mut(&view).map(|c| &mut c.visibility)
    }

    // ========== Per-frame work ==========

    /// Services pending requests of a view: the item buffer first, then every
    /// color slot. Returns how many images were refreshed.
    pub fn update_all(
        &mut self,
        view: ViewId,
        surface: &mut dyn RenderSurface,
        registry: &dyn SimplexRegistry,
    ) -> Result<usize> {
        let caches = self.caches_mut(view)?;
        let mut refreshed = usize::from(caches.items.update(surface, registry)?);
        refreshed += caches.colors.update_images(surface)?;
        Ok(refreshed)
    }

    /// Resizes every cache of a view to a new view size.
    pub fn view_resize(&mut self, view: ViewId, width: u32, height: u32) -> Result<()> {
        let offset = DVec2::from_array(self.options.default_ndc_offset);
        let caches = self.caches_mut(view)?;
        caches.items.resize(width, height, offset);
        caches.colors.resize_all(width, height, offset);
        caches.visibility.resize(width, height, offset);
        log::debug!("{view} resized to {width}x{height}");
        Ok(())
    }

    /// Broadcasts a scene change to every subscribed cache.
    pub fn publish(&mut self, event: SceneEvent) {
        self.bus.publish(event);
    }

    /// The event bus, for host-side subscribers.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }
}

impl std::fmt::Debug for RefImageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefImageContext")
            .field("options", &self.options)
            .field("codec", &self.codec)
            .field("views", &self.views.len())
            .field("subscribers", &self.bus.len())
            .finish()
    }
}
