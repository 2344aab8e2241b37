use std::rc::Rc;

use meadow_core::headless::{HeadlessScheduler, HeadlessSurface, HeadlessViewport};
use meadow_core::{
    ElementParallax, ElementParallaxOptions, ParallaxHost, ViewportEvent, DEFAULT_SETTLE_FRAMES,
};

struct Rig {
    scheduler: Rc<HeadlessScheduler>,
    viewport: Rc<HeadlessViewport>,
    surface: Rc<HeadlessSurface>,
}

impl Rig {
    fn new(document_top: f64, height: f64) -> Self {
        let viewport = Rc::new(HeadlessViewport::new(1280.0, 800.0));
        let surface = Rc::new(HeadlessSurface::new(&viewport, document_top, height));
        Self {
            scheduler: Rc::new(HeadlessScheduler::new()),
            viewport,
            surface,
        }
    }

    fn host(&self) -> ParallaxHost {
        ParallaxHost::new(self.scheduler.clone(), self.viewport.clone())
    }

    fn bind(&self, options: ElementParallaxOptions) -> Rc<ElementParallax> {
        ElementParallax::bind_with_options(self.host(), self.surface.clone(), options)
    }
}

fn expected_offset(document_top: f64, height: f64, viewport_height: f64, multiplier: f64) -> f64 {
    (document_top + height / 2.0 - viewport_height / 2.0) * multiplier
}

#[test]
fn bind_positions_immediately_and_listens_for_scroll() {
    let rig = Rig::new(1200.0, 400.0);
    let binding = ElementParallax::bind(rig.host(), rig.surface.clone(), 0.1);
    let applied = rig.surface.translate_y().unwrap();
    assert!((applied - expected_offset(1200.0, 400.0, 800.0, 0.1)).abs() < 1e-9);
    assert_eq!(rig.viewport.listener_count_for(ViewportEvent::Scroll), 1);
    assert!(binding.has_pending_frame());
    assert_eq!(binding.options(), ElementParallaxOptions::new(0.1));
}

#[test]
fn scrolling_shifts_a_static_element_against_the_scroll() {
    let rig = Rig::new(2400.0, 300.0);
    let binding = rig.bind(ElementParallaxOptions::always_on(0.15));
    let at_top = binding.last_offset().unwrap();
    assert!((at_top - expected_offset(2400.0, 300.0, 800.0, 0.15)).abs() < 1e-9);

    rig.viewport.scroll_to(1750.0);
    rig.scheduler.run_frame();
    let scrolled = binding.last_offset().unwrap();

    assert!((scrolled - at_top - (-1750.0 * 0.15)).abs() < 1e-9);
    assert_eq!(rig.surface.translate_y(), Some(scrolled));
}

#[test]
fn element_pinned_in_the_viewport_keeps_its_offset() {
    let rig = Rig::new(2400.0, 300.0);
    let binding = rig.bind(ElementParallaxOptions::always_on(0.15));
    let at_top = binding.last_offset().unwrap();

    rig.viewport.scroll_to(1750.0);
    rig.surface.move_to(2400.0 + 1750.0);
    rig.scheduler.run_frame();

    assert!((binding.last_offset().unwrap() - at_top).abs() < 1e-9);
}

#[test]
fn loop_goes_idle_once_offset_stops_moving() {
    let rig = Rig::new(900.0, 200.0);
    let _binding = rig.bind(ElementParallaxOptions::new(0.1));

    let frames = rig.scheduler.run_until_idle(1000);
    assert_eq!(frames, DEFAULT_SETTLE_FRAMES as usize);
    assert_eq!(rig.scheduler.pending_frames(), 0);

    let requests = rig.scheduler.total_requests();
    assert_eq!(rig.scheduler.run_until_idle(100), 0);
    assert_eq!(rig.scheduler.total_requests(), requests);
}

#[test]
fn scroll_rearms_a_single_frame() {
    let rig = Rig::new(900.0, 200.0);
    let binding = rig.bind(ElementParallaxOptions::new(0.1));
    rig.scheduler.run_until_idle(1000);
    assert!(!binding.has_pending_frame());

    rig.viewport.scroll_to(100.0);
    rig.viewport.scroll_to(300.0);
    rig.viewport.scroll_to(700.0);
    assert_eq!(rig.scheduler.pending_frames(), 1);
}

#[test]
fn scrolling_keeps_the_loop_alive() {
    let rig = Rig::new(900.0, 200.0);
    let _binding = rig.bind(ElementParallaxOptions::new(0.1));
    for step in 0..(DEFAULT_SETTLE_FRAMES * 3) {
        rig.viewport.scroll_to(f64::from(step) * 10.0);
        assert_eq!(rig.scheduler.run_frame(), 1);
    }
    assert_eq!(rig.scheduler.pending_frames(), 1);
}

#[test]
fn always_on_loop_never_idles() {
    let rig = Rig::new(900.0, 200.0);
    let _binding = rig.bind(ElementParallaxOptions::always_on(0.1));
    assert_eq!(rig.scheduler.run_until_idle(240), 240);
    assert_eq!(rig.scheduler.pending_frames(), 1);
}

#[test]
fn layout_shift_is_picked_up_next_frame() {
    let rig = Rig::new(900.0, 200.0);
    let _binding = rig.bind(ElementParallaxOptions::new(0.2));
    rig.surface.move_to(1500.0);
    rig.scheduler.run_frame();
    let applied = rig.surface.translate_y().unwrap();
    assert!((applied - expected_offset(1500.0, 200.0, 800.0, 0.2)).abs() < 1e-9);
}

#[test]
fn detached_element_stops_the_loop_quietly() {
    let rig = Rig::new(900.0, 200.0);
    let binding = rig.bind(ElementParallaxOptions::always_on(0.1));
    let writes = rig.surface.transform_writes();

    rig.surface.detach();
    rig.scheduler.run_frame();

    assert_eq!(rig.scheduler.pending_frames(), 0);
    assert!(!binding.has_pending_frame());
    assert_eq!(rig.surface.transform_writes(), writes);
}

#[test]
fn non_finite_offset_is_not_written() {
    let rig = Rig::new(900.0, 200.0);
    let binding = rig.bind(ElementParallaxOptions::new(f64::NAN));
    assert_eq!(rig.surface.transform_writes(), 0);
    assert!(!binding.has_pending_frame());
}

#[test]
fn teardown_twice_leaves_nothing_behind() {
    let rig = Rig::new(900.0, 200.0);
    let binding = rig.bind(ElementParallaxOptions::always_on(0.1));
    assert_eq!(rig.scheduler.pending_frames(), 1);

    binding.teardown();
    binding.teardown();

    assert!(binding.is_torn_down());
    assert_eq!(rig.scheduler.pending_frames(), 0);
    assert_eq!(rig.viewport.listener_count(), 0);
    assert_eq!(rig.scheduler.total_cancels(), 1);

    rig.viewport.scroll_to(500.0);
    assert_eq!(rig.scheduler.pending_frames(), 0);
}

#[test]
fn dropping_the_binding_releases_everything() {
    let rig = Rig::new(900.0, 200.0);
    let binding = rig.bind(ElementParallaxOptions::always_on(0.1));
    drop(binding);
    assert_eq!(rig.viewport.listener_count(), 0);
    assert_eq!(rig.scheduler.pending_frames(), 0);
    rig.viewport.scroll_to(400.0);
    assert_eq!(rig.scheduler.run_frame(), 0);
}
