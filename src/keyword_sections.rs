use web_sys::{Element, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};
use yew::prelude::*;

use crate::keyword_runtime::{use_keyword_context, use_reveal_snapshot};

/// Renders the content of the active keyword, if any, and brings it into
/// view right after a reveal.
#[function_component(KeywordSections)]
pub(crate) fn keyword_sections() -> Html {
    let context = use_keyword_context();
    let snapshot = use_reveal_snapshot(context);
    let section_ref = use_node_ref();

    {
        let section_ref = section_ref.clone();
        use_effect_with(
            (snapshot.active_key(), snapshot.scrolling_to_keyword),
            move |(key, scrolling)| {
                if key.is_some() && *scrolling {
                    if let Some(element) = section_ref.cast::<Element>() {
                        let options = ScrollIntoViewOptions::new();
                        options.set_behavior(ScrollBehavior::Smooth);
                        options.set_block(ScrollLogicalPosition::Start);
                        element.scroll_into_view_with_scroll_into_view_options(&options);
                    }
                }
                || ()
            },
        );
    }

    let Some(keyword) = snapshot.active else {
        return html! {
            <section ref={section_ref} class="keyword-section keyword-section-empty" aria-hidden="true" />
        };
    };
    let class = classes!(
        "keyword-section",
        snapshot.just_revealed.then_some("keyword-section-revealed")
    );
    html! {
        <section ref={section_ref} class={class} data-keyword={keyword.key}>
            { Html::from_html_unchecked(AttrValue::from(keyword.content_html)) }
        </section>
    }
}
