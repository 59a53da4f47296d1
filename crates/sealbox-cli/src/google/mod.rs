//! OAuth consent flow, token storage format and mailbox API client.

mod callback;
mod client_secret;
mod gmail;
mod mime;
mod oauth;
mod token;

pub use callback::CallbackListener;
pub use client_secret::OAuthClient;
pub use gmail::{GmailClient, Profile, GMAIL_API_BASE, MAX_PAGE_SIZE};
pub use mime::Message;
pub use oauth::{extract_code, refresh_access_token, OAuthFlow};
pub(crate) use oauth::http_client;
pub use token::AuthorizedUserToken;
