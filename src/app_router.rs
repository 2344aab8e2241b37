use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use yew::prelude::*;

use crate::keyword_runtime::KeywordContext;

/// Section id named by a location hash such as `#contact`.
pub(crate) fn section_from_hash(hash: &str) -> Option<String> {
    let raw = hash.trim().trim_start_matches('#').trim();
    if raw.is_empty() {
        return None;
    }
    let decoded = js_sys::decode_uri_component(raw)
        .ok()
        .and_then(|decoded| decoded.as_string())
        .unwrap_or_else(|| raw.to_string());
    Some(decoded)
}

pub(crate) fn current_section() -> Option<String> {
    let window = web_sys::window()?;
    let hash = window.location().hash().ok()?;
    section_from_hash(&hash)
}

/// Tracks the location hash. Every navigation clears the keyword reveal.
#[hook]
pub(crate) fn use_hash_navigation(context: KeywordContext) -> Option<String> {
    let section = use_state(current_section);
    {
        let section = section.clone();
        use_effect_with(context, move |context| {
            let context = context.clone();
            let listener = web_sys::window().map(|window| {
                let options = EventListenerOptions {
                    phase: EventListenerPhase::Bubble,
                    passive: true,
                };
                EventListener::new_with_options(&window, "hashchange", options, move |_| {
                    context.clear_reveal();
                    let next = current_section();
                    gloo::console::log!(format!(
                        "route: #{}",
                        next.as_deref().unwrap_or_default()
                    ));
                    section.set(next);
                })
            });
            move || drop(listener)
        });
    }
    (*section).clone()
}
