use gloo::timers::callback::Timeout;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use meadow_core::keywords;

use crate::keyword_runtime::{use_keyword_context, use_reveal_snapshot};

const MISS_NOTICE_MS: u32 = 1500;

#[derive(Clone, Copy, PartialEq, Eq)]
enum SearchStatus {
    Idle,
    Found,
    Miss,
}

#[function_component(Search)]
pub(crate) fn search() -> Html {
    let context = use_keyword_context();
    let snapshot = use_reveal_snapshot(context.clone());
    let query = use_state(String::new);
    let status = use_state(|| SearchStatus::Idle);
    let miss_timer = use_mut_ref(|| None::<Timeout>);

    let oninput = {
        let query = query.clone();
        Callback::from(move |event: InputEvent| {
            if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
                query.set(input.value());
            }
        })
    };

    let onsubmit = {
        let query = query.clone();
        let status = status.clone();
        let context = context.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if query.trim().is_empty() {
                return;
            }
            match keywords::lookup(&query) {
                Some(keyword) => {
                    gloo::console::log!("search: keyword found");
                    context.reveal_keyword(keyword);
                    query.set(String::new());
                    status.set(SearchStatus::Found);
                    miss_timer.borrow_mut().take();
                }
                None => {
                    status.set(SearchStatus::Miss);
                    let status = status.clone();
                    let timer = Timeout::new(MISS_NOTICE_MS, move || {
                        status.set(SearchStatus::Idle);
                    });
                    *miss_timer.borrow_mut() = Some(timer);
                }
            }
        })
    };

    let notice = match *status {
        SearchStatus::Miss => html! {
            <p class="search-notice search-notice-miss">{ "Nothing here. Try another word." }</p>
        },
        SearchStatus::Found if snapshot.just_revealed => html! {
            <p class="search-notice search-notice-found">{ "Found something below." }</p>
        },
        _ => html! {},
    };

    html! {
        <form class="search" role="search" onsubmit={onsubmit}>
            <input
                class="search-input"
                type="search"
                placeholder="Search"
                aria-label="Search this site"
                autocomplete="off"
                value={(*query).clone()}
                oninput={oninput}
            />
            <button class="search-button" type="submit">{ "Go" }</button>
            {notice}
        </form>
    }
}
