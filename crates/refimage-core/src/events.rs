//! Scene change notifications.
//!
//! The host publishes a [`SceneEvent`] whenever something that affects what
//! is drawn changes. Caches subscribe with a closure and are notified
//! synchronously, on the thread that publishes.

use crate::simplex::MeshId;
use crate::view::ViewId;

/// Something changed that invalidates cached renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// Mesh topology or vertex positions changed.
    MeshChanged(MeshId),
    /// A mesh's object-to-world transform changed.
    MeshTransformed(MeshId),
    /// The camera of a view moved or changed projection.
    CameraChanged(ViewId),
    /// A mesh was added to or removed from the scene, or shown or hidden.
    MembershipChanged(MeshId),
    /// A new frame started. Carries the frame stamp.
    FrameTick(u64),
}

impl SceneEvent {
    /// Whether the event can affect renders of `view`.
    ///
    /// Camera changes are per view; every other event is scene-wide.
    #[must_use]
    pub fn affects(&self, view: ViewId) -> bool {
        match self {
            Self::CameraChanged(v) => *v == view,
            _ => true,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&SceneEvent)>;

/// Fan-out of scene events to subscribers, in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns its subscription handle.
    pub fn subscribe(&mut self, handler: impl FnMut(&SceneEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Removes a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    /// Delivers `event` to every handler.
    pub fn publish(&mut self, event: SceneEvent) {
        for (_, handler) in &mut self.handlers {
            handler(&event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
