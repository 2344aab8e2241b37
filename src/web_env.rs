use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{request_animation_frame, AnimationFrame};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlImageElement};
use yew::NodeRef;

use meadow_core::geometry::{ElementRect, ImageSize, ViewportMetrics};
use meadow_core::host::{FrameCallback, ImageLoadCallback};
use meadow_core::{
    FrameId, FrameScheduler, ImageLoadError, ImageLoader, ParallaxHost, ParallaxSurface,
    Subscription, Viewport, ViewportEvent,
};

/// `requestAnimationFrame` behind the core's scheduler trait. Handles stay in
/// the map until the frame fires or is cancelled; dropping one cancels it.
#[derive(Default)]
pub(crate) struct BrowserScheduler {
    frames: Rc<RefCell<HashMap<u64, AnimationFrame>>>,
    next_id: Cell<u64>,
}

impl BrowserScheduler {
    #[cfg(test)]
    pub(crate) fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }
}

impl FrameScheduler for BrowserScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameId {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        let frames = Rc::downgrade(&self.frames);
        let handle = request_animation_frame(move |timestamp| {
            if let Some(frames) = frames.upgrade() {
                frames.borrow_mut().remove(&id);
            }
            callback(timestamp);
        });
        self.frames.borrow_mut().insert(id, handle);
        FrameId(id)
    }

    fn cancel_frame(&self, id: FrameId) {
        let handle = self.frames.borrow_mut().remove(&id.0);
        drop(handle);
    }
}

pub(crate) struct WindowViewport;

impl Viewport for WindowViewport {
    fn metrics(&self) -> ViewportMetrics {
        let Some(window) = web_sys::window() else {
            return ViewportMetrics::new(0.0, 0.0, 0.0);
        };
        let scroll_y = window.scroll_y().unwrap_or(0.0);
        let width = window
            .inner_width()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        let height = window
            .inner_height()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        ViewportMetrics::new(scroll_y, width, height)
    }

    fn subscribe(&self, event: ViewportEvent, handler: Rc<dyn Fn()>) -> Subscription {
        let Some(window) = web_sys::window() else {
            return Subscription::detached();
        };
        let options = EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: true,
        };
        let listener =
            EventListener::new_with_options(&window, event.as_str(), options, move |_| handler());
        Subscription::new(move || drop(listener))
    }
}

/// A Yew node seen as a parallax surface. Only writes inline `transform`
/// and `height`; everything else stays with the stylesheet.
pub(crate) struct NodeSurface {
    node: NodeRef,
}

impl NodeSurface {
    pub(crate) fn new(node: NodeRef) -> Self {
        Self { node }
    }

    fn element(&self) -> Option<HtmlElement> {
        self.node
            .cast::<HtmlElement>()
            .filter(|element| element.is_connected())
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Some(element) = self.element() {
            let _ = element.style().set_property(property, value);
        }
    }
}

impl ParallaxSurface for NodeSurface {
    fn is_attached(&self) -> bool {
        self.element().is_some()
    }

    fn bounding_rect(&self) -> Option<ElementRect> {
        let rect = self.element()?.get_bounding_client_rect();
        Some(ElementRect::new(rect.top(), rect.height()))
    }

    fn set_translate_y(&self, px: f64) {
        self.set_style("transform", &format!("translate3d(0, {px}px, 0)"));
    }

    fn set_height(&self, px: f64) {
        self.set_style("height", &format!("{px}px"));
    }
}

pub(crate) struct BrowserImageLoader;

impl ImageLoader for BrowserImageLoader {
    fn load(&self, path: &str, done: ImageLoadCallback) {
        let Ok(img) = HtmlImageElement::new() else {
            done(Err(ImageLoadError::Unavailable));
            return;
        };
        let img = Rc::new(img);
        let done = Rc::new(RefCell::new(Some(done)));

        let onload = {
            let img = img.clone();
            let done = done.clone();
            Closure::once(move || {
                let callback = done.borrow_mut().take();
                if let Some(callback) = callback {
                    callback(Ok(ImageSize::new(
                        f64::from(img.natural_width()),
                        f64::from(img.natural_height()),
                    )));
                }
            })
        };
        let onerror = {
            let path = path.to_string();
            Closure::once(move || {
                let callback = done.borrow_mut().take();
                if let Some(callback) = callback {
                    callback(Err(ImageLoadError::Failed { path }));
                }
            })
        };
        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        img.set_src(path);
        onload.forget();
        onerror.forget();
    }
}

thread_local! {
    static BROWSER_SCHEDULER: Rc<BrowserScheduler> = Rc::new(BrowserScheduler::default());
}

pub(crate) fn browser_scheduler() -> Rc<BrowserScheduler> {
    BROWSER_SCHEDULER.with(Rc::clone)
}

pub(crate) fn browser_host() -> ParallaxHost {
    ParallaxHost::new(browser_scheduler(), Rc::new(WindowViewport))
}
