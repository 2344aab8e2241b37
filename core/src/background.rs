//! Full-bleed background that lags behind the scroll position.
//!
//! Nothing happens until the image has loaded: the natural size is needed to
//! work out how far the background may travel. After that, scroll events
//! only move the target; a frame loop eases the rendered offset toward it
//! and stops once it is within [`SNAP_THRESHOLD`](crate::geometry::SNAP_THRESHOLD)
//! of the target.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::geometry::{ease_toward, max_parallax_offset, target_offset, EaseStep, ImageSize};
use crate::host::{
    FrameId, ImageLoadError, ImageLoader, ParallaxHost, ParallaxSurface, Subscription,
    ViewportEvent,
};
use crate::watch::{Watch, WatchHook};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundPhase {
    Loading,
    Ready,
    Failed,
    Detached,
    TornDown,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundEvent {
    ImageLoaded { path: String, size: ImageSize },
    ImageFailed { path: String, error: ImageLoadError },
    GeometrySkipped,
}

#[derive(Clone)]
pub struct BackgroundHooks {
    pub on_event: Rc<dyn Fn(BackgroundEvent)>,
}

impl BackgroundHooks {
    pub fn new(on_event: Rc<dyn Fn(BackgroundEvent)>) -> Self {
        Self { on_event }
    }

    pub fn empty() -> Self {
        Self {
            on_event: Rc::new(|_| {}),
        }
    }
}

impl Default for BackgroundHooks {
    fn default() -> Self {
        Self::empty()
    }
}

struct BackgroundState {
    phase: BackgroundPhase,
    image: Option<ImageSize>,
    current_offset: f64,
    target_offset: f64,
    animating: bool,
    frame: Option<FrameId>,
    listeners: Vec<Subscription>,
}

pub struct BackgroundParallax {
    host: ParallaxHost,
    surface: Rc<dyn ParallaxSurface>,
    image_path: String,
    hooks: BackgroundHooks,
    max_offset: Watch<f64>,
    state: RefCell<BackgroundState>,
}

impl BackgroundParallax {
    pub fn bind(
        host: ParallaxHost,
        loader: &dyn ImageLoader,
        surface: Rc<dyn ParallaxSurface>,
        image_path: &str,
        hooks: BackgroundHooks,
    ) -> Rc<Self> {
        let binding = Rc::new(Self {
            host,
            surface,
            image_path: image_path.to_string(),
            hooks,
            max_offset: Watch::new(0.0),
            state: RefCell::new(BackgroundState {
                phase: BackgroundPhase::Loading,
                image: None,
                current_offset: 0.0,
                target_offset: 0.0,
                animating: false,
                frame: None,
                listeners: Vec::new(),
            }),
        });
        let weak = Rc::downgrade(&binding);
        loader.load(
            image_path,
            Box::new(move |result| {
                if let Some(binding) = weak.upgrade() {
                    binding.on_image_result(result);
                }
            }),
        );
        binding
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    pub fn phase(&self) -> BackgroundPhase {
        self.state.borrow().phase
    }

    pub fn image_size(&self) -> Option<ImageSize> {
        self.state.borrow().image
    }

    pub fn current_offset(&self) -> f64 {
        self.state.borrow().current_offset
    }

    pub fn target_offset(&self) -> f64 {
        self.state.borrow().target_offset
    }

    pub fn is_animating(&self) -> bool {
        self.state.borrow().animating
    }

    pub fn has_pending_frame(&self) -> bool {
        self.state.borrow().frame.is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn max_offset(&self) -> f64 {
        self.max_offset.get()
    }

    /// `hook` runs whenever the maximum travel changes.
    pub fn watch_max_offset(&self, hook: WatchHook<f64>) -> u64 {
        self.max_offset.subscribe(hook)
    }

    pub fn unwatch_max_offset(&self, id: u64) {
        self.max_offset.unsubscribe(id);
    }

    pub fn handle_scroll(self: &Rc<Self>) {
        if self.phase() != BackgroundPhase::Ready {
            return;
        }
        let scroll_y = self.host.viewport.metrics().scroll_y;
        let target = target_offset(scroll_y, self.max_offset.get());
        self.state.borrow_mut().target_offset = target;
        self.start_animation();
    }

    pub fn handle_resize(self: &Rc<Self>) {
        if self.phase() != BackgroundPhase::Ready {
            return;
        }
        self.recompute_geometry();
        self.handle_scroll();
    }

    /// Advances the easing by one frame. Returns `true` while more frames
    /// are needed.
    pub fn step_frame(self: &Rc<Self>) -> bool {
        if !self.surface.is_attached() {
            let mut state = self.state.borrow_mut();
            state.animating = false;
            state.frame = None;
            return false;
        }
        let (offset, settled) = {
            let mut state = self.state.borrow_mut();
            if state.phase != BackgroundPhase::Ready {
                state.animating = false;
                return false;
            }
            let step = ease_toward(state.current_offset, state.target_offset);
            state.current_offset = step.value();
            if let EaseStep::Settled(_) = step {
                state.animating = false;
            }
            (state.current_offset, step.is_settled())
        };
        self.surface.set_translate_y(-offset);
        if !settled {
            self.schedule();
        }
        !settled
    }

    pub fn teardown(&self) {
        let (listeners, frame) = {
            let mut state = self.state.borrow_mut();
            state.phase = BackgroundPhase::TornDown;
            state.animating = false;
            (std::mem::take(&mut state.listeners), state.frame.take())
        };
        drop(listeners);
        if let Some(id) = frame {
            self.host.scheduler.cancel_frame(id);
        }
    }

    fn on_image_result(self: &Rc<Self>, result: Result<ImageSize, ImageLoadError>) {
        if self.phase() != BackgroundPhase::Loading {
            return;
        }
        let size = match result {
            Ok(size) if size.is_degenerate() => Err(ImageLoadError::Empty {
                path: self.image_path.clone(),
            }),
            other => other,
        };
        let size = match size {
            Ok(size) => size,
            Err(error) => {
                self.state.borrow_mut().phase = BackgroundPhase::Failed;
                (self.hooks.on_event)(BackgroundEvent::ImageFailed {
                    path: self.image_path.clone(),
                    error,
                });
                return;
            }
        };
        if !self.surface.is_attached() {
            self.state.borrow_mut().phase = BackgroundPhase::Detached;
            return;
        }
        {
            let mut state = self.state.borrow_mut();
            state.image = Some(size);
            state.phase = BackgroundPhase::Ready;
        }
        (self.hooks.on_event)(BackgroundEvent::ImageLoaded {
            path: self.image_path.clone(),
            size,
        });
        self.recompute_geometry();
        self.attach_listeners();
        self.handle_scroll();
    }

    fn attach_listeners(self: &Rc<Self>) {
        let scroll_target = Rc::downgrade(self);
        let scroll = self.host.viewport.subscribe(
            ViewportEvent::Scroll,
            Rc::new(move || {
                if let Some(binding) = scroll_target.upgrade() {
                    binding.handle_scroll();
                }
            }),
        );
        let resize_target = Rc::downgrade(self);
        let resize = self.host.viewport.subscribe(
            ViewportEvent::Resize,
            Rc::new(move || {
                if let Some(binding) = resize_target.upgrade() {
                    binding.handle_resize();
                }
            }),
        );
        let mut state = self.state.borrow_mut();
        state.listeners.push(scroll);
        state.listeners.push(resize);
    }

    fn recompute_geometry(&self) {
        let Some(image) = self.image_size() else {
            return;
        };
        let metrics = self.host.viewport.metrics();
        let Some(max_offset) = max_parallax_offset(image, metrics) else {
            (self.hooks.on_event)(BackgroundEvent::GeometrySkipped);
            return;
        };
        self.surface.set_height(metrics.height + max_offset);
        self.max_offset.set(max_offset);
    }

    fn start_animation(self: &Rc<Self>) {
        {
            let mut state = self.state.borrow_mut();
            if state.animating || state.frame.is_some() {
                return;
            }
            state.animating = true;
        }
        self.schedule();
    }

    fn schedule(self: &Rc<Self>) {
        if self.state.borrow().frame.is_some() {
            return;
        }
        let weak: Weak<Self> = Rc::downgrade(self);
        let id = self.host.scheduler.request_frame(Box::new(move |_timestamp| {
            let Some(binding) = weak.upgrade() else {
                return;
            };
            binding.state.borrow_mut().frame = None;
            binding.step_frame();
        }));
        self.state.borrow_mut().frame = Some(id);
    }
}

impl Drop for BackgroundParallax {
    fn drop(&mut self) {
        self.teardown();
        self.max_offset.clear_hooks();
    }
}

impl fmt::Debug for BackgroundParallax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("BackgroundParallax")
            .field("image_path", &self.image_path)
            .field("phase", &state.phase)
            .field("current_offset", &state.current_offset)
            .field("target_offset", &state.target_offset)
            .field("max_offset", &self.max_offset.get())
            .field("animating", &state.animating)
            .finish()
    }
}
