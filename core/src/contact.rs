//! Contact form validation and the mail it turns into.
//!
//! The worker owns the network calls; everything here is pure so the same
//! checks run in the browser before submitting and in the worker before
//! relaying.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_RECIPIENT: &str = "hello@example.com";
pub const DEFAULT_SENDER: &str = "noreply@example.com";
pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

pub const API_KEY_VAR: &str = "SENDGRID_API_KEY";
pub const RECIPIENT_VAR: &str = "RECIPIENT_EMAIL";
pub const SENDER_VAR: &str = "SENDER_EMAIL";
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ("Content-Type", "application/json"),
];

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub note: String,
}

impl ContactForm {
    /// An empty body is read as an empty form.
    pub fn from_json(body: &str) -> Result<Self, ContactError> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(body).map_err(|err| ContactError::MalformedBody(err.to_string()))
    }

    pub fn validate(&self) -> Result<ValidContact, ContactError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let note = self.note.trim();
        if name.is_empty() || email.is_empty() || note.is_empty() {
            return Err(ContactError::MissingFields);
        }
        if !is_valid_email(email) {
            return Err(ContactError::InvalidEmail);
        }
        Ok(ValidContact {
            name: name.to_string(),
            email: email.to_string(),
            note: note.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidContact {
    name: String,
    email: String,
    note: String,
}

impl ValidContact {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    MalformedBody(String),
    MissingFields,
    InvalidEmail,
    MissingApiKey,
    Delivery { status: u16 },
    Transport(String),
}

impl ContactError {
    pub fn status(&self) -> u16 {
        match self {
            ContactError::MalformedBody(_)
            | ContactError::MissingFields
            | ContactError::InvalidEmail => 400,
            ContactError::MissingApiKey
            | ContactError::Delivery { .. }
            | ContactError::Transport(_) => 500,
        }
    }

    /// Message safe to show to whoever submitted the form.
    pub fn public_message(&self) -> &'static str {
        match self {
            ContactError::MalformedBody(_) => "Invalid request body",
            ContactError::MissingFields => {
                "Missing required fields: name, email, and note are required"
            }
            ContactError::InvalidEmail => "Invalid email format",
            ContactError::MissingApiKey => "Server configuration error. Please contact support.",
            ContactError::Delivery { .. } | ContactError::Transport(_) => {
                "Failed to send email. Please try again later."
            }
        }
    }
}

impl fmt::Display for ContactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactError::MalformedBody(detail) => write!(f, "malformed contact body: {detail}"),
            ContactError::MissingFields => write!(f, "contact form is missing fields"),
            ContactError::InvalidEmail => write!(f, "contact email is not valid"),
            ContactError::MissingApiKey => write!(f, "{API_KEY_VAR} is not set"),
            ContactError::Delivery { status } => {
                write!(f, "mail provider rejected the message with status {status}")
            }
            ContactError::Transport(detail) => write!(f, "mail provider unreachable: {detail}"),
        }
    }
}

impl std::error::Error for ContactError {}

#[derive(Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub api_key: String,
    pub recipient: String,
    pub sender: String,
    pub expose_details: bool,
}

impl MailSettings {
    /// Reads settings through `lookup`, which returns a variable's value if
    /// it is set. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContactError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let api_key = read(API_KEY_VAR).ok_or(ContactError::MissingApiKey)?;
        Ok(Self {
            api_key,
            recipient: read(RECIPIENT_VAR).unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
            sender: read(SENDER_VAR).unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            expose_details: read(ENVIRONMENT_VAR)
                .is_some_and(|value| value.eq_ignore_ascii_case("development")),
        })
    }
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("api_key", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("sender", &self.sender)
            .field("expose_details", &self.expose_details)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl OutgoingMail {
    pub fn compose(contact: &ValidContact, settings: &MailSettings) -> Self {
        let subject = format!("New Contact Form Submission from {}", contact.name);
        let text = format!(
            "New contact form submission:\n\nName: {name}\nEmail: {email}\n\nNote:\n{note}\n\n---\nThis email was sent from the contact form on your website.",
            name = contact.name,
            email = contact.email,
            note = contact.note,
        );
        let html = format!(
            concat!(
                "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">",
                "<h2 style=\"color: #163F00;\">New Contact Form Submission</h2>",
                "<div style=\"background-color: #FFF9F0; border: 1px solid #99B292; padding: 20px; margin: 20px 0;\">",
                "<p><strong>Name:</strong> {name}</p>",
                "<p><strong>Email:</strong> {email}</p>",
                "</div>",
                "<div style=\"margin: 20px 0;\">",
                "<h3 style=\"color: #99B292;\">Note:</h3>",
                "<p style=\"white-space: pre-wrap; line-height: 1.7;\">{note}</p>",
                "</div>",
                "<hr style=\"border: none; border-top: 1px dashed #FFCF8A; margin: 30px 0;\">",
                "<p style=\"color: #666; font-size: 12px;\">This email was sent from the contact form on your website.</p>",
                "</div>"
            ),
            name = escape_html(&contact.name),
            email = escape_html(&contact.email),
            note = escape_html(&contact.note),
        );
        Self {
            to: settings.recipient.clone(),
            from: settings.sender.clone(),
            subject,
            text,
            html,
        }
    }

    /// Request body for the SendGrid v3 `mail/send` endpoint.
    pub fn to_sendgrid_json(&self) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": self.subject,
            "content": [
                { "type": "text/plain", "value": self.text },
                { "type": "text/html", "value": self.html },
            ],
        })
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Status and JSON body the relay answers with.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactReply {
    pub status: u16,
    pub body: Value,
}

impl ContactReply {
    pub fn sent() -> Self {
        Self {
            status: 200,
            body: json!({ "message": "Email sent successfully!" }),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: 405,
            body: json!({ "error": "Method not allowed" }),
        }
    }

    pub fn from_error(error: &ContactError, expose_details: bool) -> Self {
        let mut body = json!({ "error": error.public_message() });
        if expose_details && error.status() >= 500 {
            body["details"] = Value::String(error.to_string());
        }
        Self {
            status: error.status(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn message(&self) -> Option<&str> {
        self.body
            .get("message")
            .or_else(|| self.body.get("error"))
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn form(name: &str, email: &str, note: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            note: note.to_string(),
        }
    }

    fn settings() -> MailSettings {
        MailSettings {
            api_key: "key".to_string(),
            recipient: "owner@example.com".to_string(),
            sender: "site@example.com".to_string(),
            expose_details: false,
        }
    }

    #[test]
    fn empty_body_reads_as_empty_form() {
        assert_eq!(ContactForm::from_json("  "), Ok(ContactForm::default()));
        assert_eq!(
            ContactForm::from_json("{}").unwrap().validate(),
            Err(ContactError::MissingFields)
        );
    }

    #[test]
    fn malformed_body_is_a_client_error() {
        let err = ContactForm::from_json("{name:").unwrap_err();
        assert!(matches!(err, ContactError::MalformedBody(_)));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn whitespace_only_fields_are_missing() {
        let err = form("Ada", "ada@example.com", "   ").validate().unwrap_err();
        assert_eq!(err, ContactError::MissingFields);
    }

    #[test]
    fn validated_fields_are_trimmed() {
        let contact = form("  Ada ", " ada@example.com\n", "\thello there  ").validate().unwrap();
        assert_eq!(contact.name(), "Ada");
        assert_eq!(contact.email(), "ada@example.com");
        assert_eq!(contact.note(), "hello there");
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in ["ada", "ada@example", "ada @example.com", "@example.com", "a@b@c.d"] {
            assert!(!is_valid_email(bad), "{bad} should be rejected");
        }
        assert!(is_valid_email("ada.lovelace+site@example.co.uk"));
        let err = form("Ada", "ada@example", "hi").validate().unwrap_err();
        assert_eq!(err.public_message(), "Invalid email format");
    }

    #[test]
    fn settings_require_api_key_and_default_addresses() {
        let vars: HashMap<&str, &str> = HashMap::from([(API_KEY_VAR, "  ")]);
        let lookup = |key: &str| vars.get(key).map(|v| v.to_string());
        assert_eq!(MailSettings::from_lookup(lookup), Err(ContactError::MissingApiKey));

        let vars: HashMap<&str, &str> =
            HashMap::from([(API_KEY_VAR, "sg-key"), (ENVIRONMENT_VAR, "Development")]);
        let settings = MailSettings::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.recipient, DEFAULT_RECIPIENT);
        assert_eq!(settings.sender, DEFAULT_SENDER);
        assert!(settings.expose_details);
        assert!(!format!("{settings:?}").contains("sg-key"));
    }

    #[test]
    fn composed_mail_escapes_markup() {
        let contact = form("Ada <b>", "ada@example.com", "hi & \"bye\"").validate().unwrap();
        let mail = OutgoingMail::compose(&contact, &settings());
        assert_eq!(mail.subject, "New Contact Form Submission from Ada <b>");
        assert!(mail.text.contains("Note:\nhi & \"bye\""));
        assert!(mail.html.contains("Ada &lt;b&gt;"));
        assert!(mail.html.contains("hi &amp; &quot;bye&quot;"));
        assert!(!mail.html.contains("<b>"));
    }

    #[test]
    fn sendgrid_payload_shape() {
        let contact = form("Ada", "ada@example.com", "hello").validate().unwrap();
        let payload = OutgoingMail::compose(&contact, &settings()).to_sendgrid_json();
        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "owner@example.com");
        assert_eq!(payload["from"]["email"], "site@example.com");
        assert_eq!(payload["content"][0]["type"], "text/plain");
        assert_eq!(payload["content"][1]["type"], "text/html");
    }

    #[test]
    fn replies_hide_details_unless_asked() {
        let err = ContactError::Delivery { status: 401 };
        let quiet = ContactReply::from_error(&err, false);
        assert_eq!(quiet.status, 500);
        assert_eq!(quiet.message(), Some("Failed to send email. Please try again later."));
        assert!(quiet.body.get("details").is_none());

        let loud = ContactReply::from_error(&err, true);
        assert!(loud.body["details"].as_str().unwrap().contains("401"));

        let client = ContactReply::from_error(&ContactError::InvalidEmail, true);
        assert!(client.body.get("details").is_none());
        assert!(ContactReply::sent().is_success());
        assert_eq!(ContactReply::method_not_allowed().status, 405);
    }
}
