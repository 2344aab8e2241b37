//! Capabilities a page host lends to the parallax bindings.
//!
//! The bindings never reach for a window, a clock or a DOM node directly.
//! Everything they read or write goes through these traits, so the same
//! state machines run in the browser and under [`crate::headless`].

use std::fmt;
use std::rc::Rc;

use crate::geometry::{ElementRect, ImageSize, ViewportMetrics};

pub type FrameCallback = Box<dyn FnOnce(f64)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

pub trait FrameScheduler {
    /// Runs `callback` once before the next repaint with the frame timestamp.
    fn request_frame(&self, callback: FrameCallback) -> FrameId;
    /// Cancelling an id that already fired is a no-op.
    fn cancel_frame(&self, id: FrameId);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewportEvent {
    Scroll,
    Resize,
}

impl ViewportEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewportEvent::Scroll => "scroll",
            ViewportEvent::Resize => "resize",
        }
    }
}

pub trait Viewport {
    fn metrics(&self) -> ViewportMetrics;
    fn subscribe(&self, event: ViewportEvent, handler: Rc<dyn Fn()>) -> Subscription;
}

/// Listener registration; the listener is removed when this is dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription that was never attached to anything.
    pub fn detached() -> Self {
        Self { release: None }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

pub trait ParallaxSurface {
    fn is_attached(&self) -> bool;
    /// `None` once the element has left the document.
    fn bounding_rect(&self) -> Option<ElementRect>;
    fn set_translate_y(&self, px: f64);
    fn set_height(&self, px: f64);
}

pub type ImageLoadCallback = Box<dyn FnOnce(Result<ImageSize, ImageLoadError>)>;

pub trait ImageLoader {
    fn load(&self, path: &str, done: ImageLoadCallback);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLoadError {
    Unavailable,
    Failed { path: String },
    Empty { path: String },
}

impl fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLoadError::Unavailable => write!(f, "image loading is not available"),
            ImageLoadError::Failed { path } => write!(f, "failed to load image '{path}'"),
            ImageLoadError::Empty { path } => write!(f, "image '{path}' has no pixels"),
        }
    }
}

impl std::error::Error for ImageLoadError {}

#[derive(Clone)]
pub struct ParallaxHost {
    pub scheduler: Rc<dyn FrameScheduler>,
    pub viewport: Rc<dyn Viewport>,
}

impl ParallaxHost {
    pub fn new(scheduler: Rc<dyn FrameScheduler>, viewport: Rc<dyn Viewport>) -> Self {
        Self {
            scheduler,
            viewport,
        }
    }
}

impl fmt::Debug for ParallaxHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallaxHost").finish_non_exhaustive()
    }
}
