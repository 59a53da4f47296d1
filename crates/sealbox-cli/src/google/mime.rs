//! Mailbox message payloads and their readable text.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Part bodies are urlsafe base64, padded or not depending on the sender.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static HTML_TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]+>").ok());

/// A message fetched with `format=full`.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub payload: MessagePart,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    pub mime_type: String,
    pub headers: Vec<Header>,
    pub body: PartBody,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartBody {
    pub data: Option<String>,
}

impl Message {
    /// Value of the first top-level header called `name`, any case; empty when absent.
    pub fn header(&self, name: &str) -> &str {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .unwrap_or("")
    }

    pub fn text(&self) -> String {
        self.payload.text()
    }
}

impl MessagePart {
    /// Plain and HTML leaves joined by newlines, HTML reduced to text.
    pub fn text(&self) -> String {
        match self.mime_type.as_str() {
            "text/plain" => self.body.decode(),
            "text/html" => html_to_text(&self.body.decode()),
            _ => self
                .parts
                .iter()
                .map(MessagePart::text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl PartBody {
    fn decode(&self) -> String {
        let Some(data) = self.data.as_deref().filter(|d| !d.is_empty()) else {
            return String::new();
        };
        match BODY_ENGINE.decode(data.trim()) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                debug!(error = %e, "skipping undecodable message part");
                String::new()
            }
        }
    }
}

fn html_to_text(html: &str) -> String {
    let stripped = match HTML_TAG.as_ref() {
        Some(tag) => tag.replace_all(html, " ").into_owned(),
        None => html.to_string(),
    };
    html_escape::decode_html_entities(&stripped).into_owned()
}
