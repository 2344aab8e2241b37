//! Scroll-linked offset for a single element.
//!
//! The element is pushed away from the viewport center in proportion to its
//! distance from it. A scroll event arms a frame loop that recomputes the
//! offset every frame; by default the loop goes idle again once the offset
//! has stopped moving for [`DEFAULT_SETTLE_FRAMES`] frames.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::geometry::{element_offset, DEFAULT_ELEMENT_MULTIPLIER, SNAP_THRESHOLD};
use crate::host::{FrameId, ParallaxHost, ParallaxSurface, Subscription, ViewportEvent};

pub const DEFAULT_SETTLE_FRAMES: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementParallaxOptions {
    pub multiplier: f64,
    /// Stable frames before the loop idles. `None` keeps it running until
    /// the element is detached.
    pub settle_frames: Option<u32>,
}

impl ElementParallaxOptions {
    pub fn new(multiplier: f64) -> Self {
        Self {
            multiplier,
            settle_frames: Some(DEFAULT_SETTLE_FRAMES),
        }
    }

    pub fn always_on(multiplier: f64) -> Self {
        Self {
            multiplier,
            settle_frames: None,
        }
    }
}

impl Default for ElementParallaxOptions {
    fn default() -> Self {
        Self::new(DEFAULT_ELEMENT_MULTIPLIER)
    }
}

#[derive(Default)]
struct ElementState {
    frame: Option<FrameId>,
    scroll_listener: Option<Subscription>,
    last_offset: Option<f64>,
    stable_frames: u32,
    torn_down: bool,
}

pub struct ElementParallax {
    host: ParallaxHost,
    surface: Rc<dyn ParallaxSurface>,
    options: ElementParallaxOptions,
    state: RefCell<ElementState>,
}

impl ElementParallax {
    pub fn bind(host: ParallaxHost, surface: Rc<dyn ParallaxSurface>, multiplier: f64) -> Rc<Self> {
        Self::bind_with_options(host, surface, ElementParallaxOptions::new(multiplier))
    }

    pub fn bind_with_options(
        host: ParallaxHost,
        surface: Rc<dyn ParallaxSurface>,
        options: ElementParallaxOptions,
    ) -> Rc<Self> {
        let binding = Rc::new(Self {
            host,
            surface,
            options,
            state: RefCell::new(ElementState::default()),
        });
        let weak = Rc::downgrade(&binding);
        let listener = binding.host.viewport.subscribe(
            ViewportEvent::Scroll,
            Rc::new(move || {
                if let Some(binding) = weak.upgrade() {
                    binding.handle_scroll();
                }
            }),
        );
        binding.state.borrow_mut().scroll_listener = Some(listener);
        binding.update();
        binding
    }

    pub fn options(&self) -> ElementParallaxOptions {
        self.options
    }

    pub fn last_offset(&self) -> Option<f64> {
        self.state.borrow().last_offset
    }

    pub fn has_pending_frame(&self) -> bool {
        self.state.borrow().frame.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.borrow().torn_down
    }

    pub fn handle_scroll(self: &Rc<Self>) {
        {
            let mut state = self.state.borrow_mut();
            if state.torn_down {
                return;
            }
            state.stable_frames = 0;
            if state.frame.is_some() {
                return;
            }
        }
        self.schedule();
    }

    /// Recomputes and applies the offset, then re-arms the frame loop.
    /// Returns the applied offset.
    pub fn update(self: &Rc<Self>) -> Option<f64> {
        if self.state.borrow().torn_down {
            return None;
        }
        let Some(rect) = self.surface.bounding_rect() else {
            self.state.borrow_mut().frame = None;
            return None;
        };
        let metrics = self.host.viewport.metrics();
        let offset = element_offset(rect, metrics, self.options.multiplier);
        if !offset.is_finite() {
            self.state.borrow_mut().frame = None;
            return None;
        }
        self.surface.set_translate_y(offset);

        let settled = {
            let mut state = self.state.borrow_mut();
            let moved = match state.last_offset {
                Some(last) => (offset - last).abs() >= SNAP_THRESHOLD,
                None => true,
            };
            state.last_offset = Some(offset);
            state.stable_frames = if moved { 0 } else { state.stable_frames.saturating_add(1) };
            match self.options.settle_frames {
                Some(limit) => state.stable_frames >= limit,
                None => false,
            }
        };
        if !settled {
            self.schedule();
        }
        Some(offset)
    }

    pub fn teardown(&self) {
        let (listener, frame) = {
            let mut state = self.state.borrow_mut();
            state.torn_down = true;
            (state.scroll_listener.take(), state.frame.take())
        };
        drop(listener);
        if let Some(id) = frame {
            self.host.scheduler.cancel_frame(id);
        }
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
            binding.update();
        }));
        self.state.borrow_mut().frame = Some(id);
    }
}

impl Drop for ElementParallax {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for ElementParallax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ElementParallax")
            .field("options", &self.options)
            .field("frame", &state.frame)
            .field("last_offset", &state.last_offset)
            .field("torn_down", &state.torn_down)
            .finish()
    }
}
