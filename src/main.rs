use std::rc::Rc;

use meadow_core::KeywordReveal;

mod app_router;
mod app_runtime;
mod contact_form;
mod keyword_runtime;
mod keyword_sections;
mod parallax_hooks;
mod search;
mod web_env;
mod yew_app;

use crate::keyword_runtime::KeywordContext;
use crate::yew_app::{App, AppProps};

fn main() {
    app_runtime::set_site_config(app_runtime::SiteConfig::from_env());
    let keywords = KeywordContext::new(Rc::new(KeywordReveal::new()));
    yew::Renderer::<App>::with_props(AppProps { keywords }).render();
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn hash_names_a_section() {
        assert_eq!(app_router::section_from_hash("#contact"), Some("contact".to_string()));
        assert_eq!(app_router::section_from_hash("#"), None);
        assert_eq!(app_router::section_from_hash(""), None);
        assert_eq!(app_router::section_from_hash("#two%20words"), Some("two words".to_string()));
    }
}
