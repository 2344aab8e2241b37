use gloo::net::http::Request;
use serde::Deserialize;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

use meadow_core::ContactForm;

use crate::app_runtime;

#[derive(Clone, Debug, PartialEq, Eq)]
enum SendStatus {
    Idle,
    Sending,
    Sent(String),
    Failed(String),
}

#[derive(Debug, Default, Deserialize)]
struct RelayReply {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

async fn send_contact(endpoint: &str, form: &ContactForm) -> Result<String, String> {
    let response = Request::post(endpoint)
        .json(form)
        .map_err(|err| err.to_string())?
        .send()
        .await
        .map_err(|err| err.to_string())?;
    let ok = response.ok();
    let reply = response.json::<RelayReply>().await.unwrap_or_default();
    if ok {
        Ok(reply
            .message
            .unwrap_or_else(|| "Message sent.".to_string()))
    } else {
        Err(reply
            .error
            .unwrap_or_else(|| format!("Request failed ({})", response.status())))
    }
}

#[function_component(ContactSection)]
pub(crate) fn contact_section() -> Html {
    let name = use_state(String::new);
    let email = use_state(String::new);
    let note = use_state(String::new);
    let status = use_state(|| SendStatus::Idle);

    let on_name = {
        let name = name.clone();
        Callback::from(move |event: InputEvent| {
            if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
                name.set(input.value());
            }
        })
    };
    let on_email = {
        let email = email.clone();
        Callback::from(move |event: InputEvent| {
            if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
                email.set(input.value());
            }
        })
    };
    let on_note = {
        let note = note.clone();
        Callback::from(move |event: InputEvent| {
            if let Some(input) = event.target_dyn_into::<HtmlTextAreaElement>() {
                note.set(input.value());
            }
        })
    };

    let onsubmit = {
        let name = name.clone();
        let email = email.clone();
        let note = note.clone();
        let status = status.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if *status == SendStatus::Sending {
                return;
            }
            let form = ContactForm {
                name: (*name).clone(),
                email: (*email).clone(),
                note: (*note).clone(),
            };
            if let Err(err) = form.validate() {
                status.set(SendStatus::Failed(err.public_message().to_string()));
                return;
            }
            status.set(SendStatus::Sending);
            let endpoint = app_runtime::site_config().contact_endpoint;
            let name = name.clone();
            let email = email.clone();
            let note = note.clone();
            let status = status.clone();
            spawn_local(async move {
                match send_contact(&endpoint, &form).await {
                    Ok(message) => {
                        name.set(String::new());
                        email.set(String::new());
                        note.set(String::new());
                        status.set(SendStatus::Sent(message));
                    }
                    Err(err) => {
                        gloo::console::error!(format!("contact: {err}"));
                        status.set(SendStatus::Failed(err));
                    }
                }
            });
        })
    };

    let sending = *status == SendStatus::Sending;
    let status_line = match &*status {
        SendStatus::Idle => html! {},
        SendStatus::Sending => html! { <p class="contact-status">{ "Sending..." }</p> },
        SendStatus::Sent(message) => html! {
            <p class="contact-status contact-status-sent">{ message.clone() }</p>
        },
        SendStatus::Failed(message) => html! {
            <p class="contact-status contact-status-failed" role="alert">{ message.clone() }</p>
        },
    };

    html! {
        <form class="contact-form" onsubmit={onsubmit}>
            <label class="contact-field">
                <span>{ "Name" }</span>
                <input type="text" name="name" value={(*name).clone()} oninput={on_name} />
            </label>
            <label class="contact-field">
                <span>{ "Email" }</span>
                <input type="email" name="email" value={(*email).clone()} oninput={on_email} />
            </label>
            <label class="contact-field">
                <span>{ "Note" }</span>
                <textarea name="note" rows="5" value={(*note).clone()} oninput={on_note} />
            </label>
            <button class="contact-submit" type="submit" disabled={sending}>{ "Send" }</button>
            {status_line}
        </form>
    }
}
