use meadow_core::contact::{
    ContactError, ContactForm, ContactReply, MailSettings, OutgoingMail, CORS_HEADERS,
    SENDGRID_ENDPOINT,
};
use wasm_bindgen::JsValue;
use worker::*;

#[event(fetch)]
pub async fn main(mut req: Request, env: Env, _ctx: Context) -> Result<Response> {
    match req.method() {
        Method::Options => preflight(),
        Method::Post => {
            let body = req.text().await?;
            relay(&body, &env).await
        }
        _ => reply(&ContactReply::method_not_allowed()),
    }
}

fn preflight() -> Result<Response> {
    Ok(Response::empty()?
        .with_status(200)
        .with_headers(cors_headers()?))
}

fn cors_headers() -> Result<Headers> {
    let mut headers = Headers::new();
    for (name, value) in CORS_HEADERS {
        headers.set(name, value)?;
    }
    Ok(headers)
}

fn reply(reply: &ContactReply) -> Result<Response> {
    Ok(Response::from_json(&reply.body)?
        .with_status(reply.status)
        .with_headers(cors_headers()?))
}

fn env_value(env: &Env, key: &str) -> Option<String> {
    env.secret(key)
        .map(|value| value.to_string())
        .or_else(|_| env.var(key).map(|value| value.to_string()))
        .ok()
}

async fn relay(body: &str, env: &Env) -> Result<Response> {
    let expose_details = env_value(env, meadow_core::contact::ENVIRONMENT_VAR)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("development"));

    let contact = match ContactForm::from_json(body).and_then(|form| form.validate()) {
        Ok(contact) => contact,
        Err(err) => {
            console_log!("contact rejected: {}", err);
            return reply(&ContactReply::from_error(&err, expose_details));
        }
    };

    let settings = match MailSettings::from_lookup(|key| env_value(env, key)) {
        Ok(settings) => settings,
        Err(err) => {
            console_error!("contact relay misconfigured: {}", err);
            return reply(&ContactReply::from_error(&err, expose_details));
        }
    };

    let mail = OutgoingMail::compose(&contact, &settings);
    match deliver(&mail, &settings).await {
        Ok(()) => {
            console_log!("contact relayed to {}", settings.recipient);
            reply(&ContactReply::sent())
        }
        Err(err) => {
            console_error!("error sending email: {}", err);
            reply(&ContactReply::from_error(&err, settings.expose_details))
        }
    }
}

async fn deliver(
    mail: &OutgoingMail,
    settings: &MailSettings,
) -> std::result::Result<(), ContactError> {
    let payload = mail.to_sendgrid_json().to_string();
    let request = sendgrid_request(&payload, &settings.api_key)
        .map_err(|err| ContactError::Transport(err.to_string()))?;
    let response = Fetch::Request(request)
        .send()
        .await
        .map_err(|err| ContactError::Transport(err.to_string()))?;
    let status = response.status_code();
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(ContactError::Delivery { status })
    }
}

fn sendgrid_request(payload: &str, api_key: &str) -> Result<Request> {
    let mut headers = Headers::new();
    headers.set("Authorization", &format!("Bearer {api_key}"))?;
    headers.set("Content-Type", "application/json")?;
    let mut init = RequestInit::new();
    init.with_method(Method::Post)
        .with_headers(headers)
        .with_body(Some(JsValue::from_str(payload)));
    Request::new_with_init(SENDGRID_ENDPOINT, &init)
}
