//! In-memory host for driving the parallax bindings without a browser.
//!
//! Frames only run when [`HeadlessScheduler::run_frame`] is called, image
//! loads only complete when the loader is told to, and the viewport only
//! scrolls when asked. Tests and `meadow-cli parallax trace` use this.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::geometry::{ElementRect, ImageSize, ViewportMetrics};
use crate::host::{
    FrameCallback, FrameId, FrameScheduler, ImageLoadCallback, ImageLoadError, ImageLoader,
    ParallaxSurface, Subscription, Viewport, ViewportEvent,
};

pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

#[derive(Default)]
pub struct HeadlessScheduler {
    pending: RefCell<Vec<(FrameId, FrameCallback)>>,
    next_id: Cell<u64>,
    requests: Cell<u64>,
    cancels: Cell<u64>,
    clock_ms: Cell<f64>,
}

impl HeadlessScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_frames(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn total_requests(&self) -> u64 {
        self.requests.get()
    }

    pub fn total_cancels(&self) -> u64 {
        self.cancels.get()
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms.get()
    }

    /// Runs every callback queued before this frame started. Callbacks
    /// requested while running land in the next frame.
    pub fn run_frame(&self) -> usize {
        let due = std::mem::take(&mut *self.pending.borrow_mut());
        if due.is_empty() {
            return 0;
        }
        let timestamp = self.clock_ms.get() + FRAME_INTERVAL_MS;
        self.clock_ms.set(timestamp);
        let count = due.len();
        for (_, callback) in due {
            callback(timestamp);
        }
        count
    }

    /// Runs frames until nothing is queued or `max_frames` ran. Returns the
    /// number of frames that had work.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.run_frame() > 0 {
            frames += 1;
        }
        frames
    }
}

impl FrameScheduler for HeadlessScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameId {
        let id = FrameId(self.next_id.get());
        self.next_id.set(self.next_id.get().saturating_add(1));
        self.requests.set(self.requests.get() + 1);
        self.pending.borrow_mut().push((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameId) {
        let mut pending = self.pending.borrow_mut();
        let before = pending.len();
        pending.retain(|(frame_id, _)| *frame_id != id);
        if pending.len() != before {
            self.cancels.set(self.cancels.get() + 1);
        }
    }
}

type ListenerList = Rc<RefCell<Vec<(u64, ViewportEvent, Rc<dyn Fn()>)>>>;

pub struct HeadlessViewport {
    metrics: Rc<Cell<ViewportMetrics>>,
    listeners: ListenerList,
    next_listener_id: Cell<u64>,
}

impl HeadlessViewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            metrics: Rc::new(Cell::new(ViewportMetrics::new(0.0, width, height))),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener_id: Cell::new(1),
        }
    }

    pub fn scroll_to(&self, scroll_y: f64) {
        let mut metrics = self.metrics.get();
        metrics.scroll_y = scroll_y;
        self.metrics.set(metrics);
        self.dispatch(ViewportEvent::Scroll);
    }

    pub fn resize(&self, width: f64, height: f64) {
        let mut metrics = self.metrics.get();
        metrics.width = width;
        metrics.height = height;
        self.metrics.set(metrics);
        self.dispatch(ViewportEvent::Resize);
    }

    pub fn dispatch(&self, event: ViewportEvent) {
        let handlers: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn listener_count_for(&self, event: ViewportEvent) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event)
            .count()
    }
}

impl Viewport for HeadlessViewport {
    fn metrics(&self) -> ViewportMetrics {
        self.metrics.get()
    }

    fn subscribe(&self, event: ViewportEvent, handler: Rc<dyn Fn()>) -> Subscription {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id.saturating_add(1));
        self.listeners.borrow_mut().push((id, event, handler));
        let listeners = Rc::clone(&self.listeners);
        Subscription::new(move || {
            listeners.borrow_mut().retain(|(listener_id, _, _)| *listener_id != id);
        })
    }
}

/// Element laid out at a fixed document position.
pub struct HeadlessSurface {
    metrics: Rc<Cell<ViewportMetrics>>,
    document_top: Cell<f64>,
    height: Cell<f64>,
    attached: Cell<bool>,
    translate_y: Cell<Option<f64>>,
    style_height: Cell<Option<f64>>,
    writes: Cell<u64>,
}

impl HeadlessSurface {
    pub fn new(viewport: &HeadlessViewport, document_top: f64, height: f64) -> Self {
        Self {
            metrics: Rc::clone(&viewport.metrics),
            document_top: Cell::new(document_top),
            height: Cell::new(height),
            attached: Cell::new(true),
            translate_y: Cell::new(None),
            style_height: Cell::new(None),
            writes: Cell::new(0),
        }
    }

    pub fn detach(&self) {
        self.attached.set(false);
    }

    pub fn move_to(&self, document_top: f64) {
        self.document_top.set(document_top);
    }

    pub fn translate_y(&self) -> Option<f64> {
        self.translate_y.get()
    }

    pub fn style_height(&self) -> Option<f64> {
        self.style_height.get()
    }

    pub fn transform_writes(&self) -> u64 {
        self.writes.get()
    }
}

impl ParallaxSurface for HeadlessSurface {
    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn bounding_rect(&self) -> Option<ElementRect> {
        if !self.attached.get() {
            return None;
        }
        let scroll_y = self.metrics.get().scroll_y;
        Some(ElementRect::new(
            self.document_top.get() - scroll_y,
            self.height.get(),
        ))
    }

    fn set_translate_y(&self, px: f64) {
        self.translate_y.set(Some(px));
        self.writes.set(self.writes.get() + 1);
    }

    fn set_height(&self, px: f64) {
        self.style_height.set(Some(px));
    }
}

#[derive(Default)]
pub struct HeadlessImageLoader {
    pending: RefCell<Vec<(String, ImageLoadCallback)>>,
}

impl HeadlessImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_paths(&self) -> Vec<String> {
        self.pending
            .borrow()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Completes the oldest pending load. Returns `false` if none was queued.
    pub fn complete_next(&self, size: ImageSize) -> bool {
        self.finish_next(|_| Ok(size))
    }

    pub fn fail_next(&self) -> bool {
        self.finish_next(|path| Err(ImageLoadError::Failed { path }))
    }

    fn finish_next(
        &self,
        outcome: impl FnOnce(String) -> Result<ImageSize, ImageLoadError>,
    ) -> bool {
        let next = {
            let mut pending = self.pending.borrow_mut();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };
        let Some((path, done)) = next else {
            return false;
        };
        done(outcome(path));
        true
    }
}

impl ImageLoader for HeadlessImageLoader {
    fn load(&self, path: &str, done: ImageLoadCallback) {
        self.pending.borrow_mut().push((path.to_string(), done));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_requested_during_a_frame_run_next_time() {
        let scheduler = Rc::new(HeadlessScheduler::new());
        let runs = Rc::new(Cell::new(0));
        let inner_scheduler = scheduler.clone();
        let inner_runs = runs.clone();
        scheduler.request_frame(Box::new(move |_| {
            inner_runs.set(inner_runs.get() + 1);
            let again = inner_runs.clone();
            inner_scheduler.request_frame(Box::new(move |_| again.set(again.get() + 1)));
        }));
        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(runs.get(), 1);
        assert_eq!(scheduler.pending_frames(), 1);
        assert_eq!(scheduler.run_until_idle(10), 1);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn cancelled_frames_never_run() {
        let scheduler = HeadlessScheduler::new();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let id = scheduler.request_frame(Box::new(move |_| flag.set(true)));
        scheduler.cancel_frame(id);
        scheduler.cancel_frame(id);
        assert_eq!(scheduler.run_frame(), 0);
        assert!(!ran.get());
        assert_eq!(scheduler.total_cancels(), 1);
    }

    #[test]
    fn surface_rect_tracks_scroll() {
        let viewport = HeadlessViewport::new(1280.0, 800.0);
        let surface = HeadlessSurface::new(&viewport, 1000.0, 200.0);
        viewport.scroll_to(250.0);
        assert_eq!(surface.bounding_rect(), Some(ElementRect::new(750.0, 200.0)));
        surface.detach();
        assert_eq!(surface.bounding_rect(), None);
    }

    #[test]
    fn dropped_subscription_stops_dispatch() {
        let viewport = HeadlessViewport::new(800.0, 600.0);
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let subscription = viewport.subscribe(
            ViewportEvent::Resize,
            Rc::new(move || counter.set(counter.get() + 1)),
        );
        viewport.resize(900.0, 600.0);
        viewport.scroll_to(10.0);
        drop(subscription);
        viewport.resize(1000.0, 600.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(viewport.listener_count(), 0);
    }
}
