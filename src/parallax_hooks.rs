use std::rc::Rc;

use yew::prelude::*;

use meadow_core::{BackgroundEvent, BackgroundHooks, BackgroundParallax, ElementParallax};

use crate::web_env::{self, BrowserImageLoader, NodeSurface};

/// Moves `node` against the scroll direction by `multiplier` times its
/// distance from the middle of the viewport.
#[hook]
pub(crate) fn use_element_parallax(node: NodeRef, multiplier: f64) {
    use_effect_with((node, multiplier), move |(node, multiplier)| {
        let surface = Rc::new(NodeSurface::new(node.clone()));
        let binding = ElementParallax::bind(web_env::browser_host(), surface, *multiplier);
        move || binding.teardown()
    });
}

/// Binds `node` as the full-bleed background for `image_path` and returns the
/// current maximum offset (zero until the image has loaded).
#[hook]
pub(crate) fn use_background_parallax(node: NodeRef, image_path: AttrValue) -> f64 {
    let max_offset = use_state(|| 0.0_f64);
    {
        let max_offset = max_offset.clone();
        use_effect_with((node, image_path), move |(node, image_path)| {
            let surface = Rc::new(NodeSurface::new(node.clone()));
            let hooks = BackgroundHooks::new(Rc::new(log_background_event));
            let binding = BackgroundParallax::bind(
                web_env::browser_host(),
                &BrowserImageLoader,
                surface,
                image_path,
                hooks,
            );
            let watch_id =
                binding.watch_max_offset(Rc::new(move |value: f64| max_offset.set(value)));
            move || {
                binding.unwatch_max_offset(watch_id);
                binding.teardown();
            }
        });
    }
    *max_offset
}

fn log_background_event(event: BackgroundEvent) {
    match event {
        BackgroundEvent::ImageLoaded { path, size } => {
            gloo::console::log!(format!(
                "background: loaded {path} ({}x{})",
                size.width, size.height
            ));
        }
        BackgroundEvent::ImageFailed { error, .. } => {
            gloo::console::error!(format!("background: {error}"));
        }
        BackgroundEvent::GeometrySkipped => {
            gloo::console::warn!("background: viewport has no area, geometry skipped");
        }
    }
}
