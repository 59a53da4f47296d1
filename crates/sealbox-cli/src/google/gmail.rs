use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::errors::CliError;

use super::mime::Message;
use super::oauth::http_client;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/";

/// Mailbox summary from `users/me/profile`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub messages_total: u64,
    #[serde(default)]
    pub threads_total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<Label>,
}

/// Message id as returned by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

/// Largest page the listing endpoint serves.
pub const MAX_PAGE_SIZE: usize = 500;

/// Blocking mailbox API client authorized with a bearer token.
pub struct GmailClient {
    http: reqwest::blocking::Client,
    base: Url,
    access_token: SecretString,
}

impl GmailClient {
    pub fn with_base(access_token: &str, base: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base).map_err(|e| anyhow::anyhow!("Invalid API base {}: {}", base, e))?;
        Ok(Self {
            http: http_client()?,
            base,
            access_token: SecretString::from(access_token.to_string()),
        })
    }

    pub fn profile(&self) -> anyhow::Result<Profile> {
        self.get("users/me/profile")
    }

    pub fn labels(&self) -> anyhow::Result<Vec<Label>> {
        Ok(self.get::<LabelList>("users/me/labels")?.labels)
    }

    /// First page of message ids matching `query` (empty matches everything).
    pub fn list_messages(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<MessageRef>> {
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![("maxResults", max_results.as_str())];
        if !query.is_empty() {
            params.push(("q", query));
        }
        Ok(self
            .get_with::<MessageList>("users/me/messages", &params)?
            .messages)
    }

    /// Full message including the MIME part tree.
    pub fn message(&self, id: &str) -> anyhow::Result<Message> {
        let path = format!("users/me/messages/{}", urlencode_segment(id));
        self.get_with(&path, &[("format", "full")])
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.get_with(path, &[])
    }

    fn get_with<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> anyhow::Result<T> {
        let url = self.base.join(path)?;
        debug!(%url, "mailbox API request");
        let response = self
            .http
            .get(url)
            .query(params)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .map_err(|e| CliError::remote(format!("Could not reach the mailbox API: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(
                CliError::remote(format!("Mailbox API error {}: {}", status, body.trim())).into(),
            );
        }
        response
            .json::<T>()
            .map_err(|e| CliError::remote(format!("Unexpected mailbox API response: {}", e)).into())
    }
}

fn urlencode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}
