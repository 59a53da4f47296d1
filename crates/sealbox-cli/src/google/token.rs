//! Authorized-user token file.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client_secret::OAuthClient;
use super::oauth::TokenResponse;

/// Tokens expiring within this window are treated as already expired.
const EXPIRY_SKEW_SECONDS: i64 = 300;

/// Stored OAuth credentials for one mailbox.
///
/// Fields this tool does not use are kept in `extra` and written back as-is.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizedUserToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthorizedUserToken {
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| anyhow::anyhow!("Invalid token JSON: {}", e))
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build a token from a fresh authorization-code exchange.
    pub fn from_exchange(client: &OAuthClient, scopes: &[String], response: TokenResponse) -> Self {
        let mut token = Self {
            token: None,
            refresh_token: None,
            token_uri: client.token_uri.clone(),
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            scopes: scopes.to_vec(),
            expiry: None,
            extra: Map::new(),
        };
        token.apply_response(response, Utc::now());
        token
    }

    /// Merge a refresh response; the old refresh token is kept unless a new one arrives.
    pub fn apply_refresh(&mut self, response: TokenResponse) {
        self.apply_response(response, Utc::now());
    }

    fn apply_response(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(response.access_token);
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
        if let Some(scope) = response.scope.filter(|s| !s.trim().is_empty()) {
            self.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
        self.expiry = response.expires_in.map(|secs| now + Duration::seconds(secs));
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECONDS) >= expiry,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_valid(&self) -> bool {
        self.access_token().is_some() && !self.is_expired()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for AuthorizedUserToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserToken")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORED: &str = r#"{"token":"ya29.old","refresh_token":"1//refresh","token_uri":"https://oauth2.googleapis.com/token","client_id":"abc.apps","client_secret":"shh","scopes":["https://mail.google.com/"],"universe_domain":"googleapis.com","account":"","expiry":"2024-03-01T12:00:00.123456Z"}"#;

    fn response(access: &str, refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in: Some(3599),
            scope: None,
        }
    }

    #[test]
    fn test_parse_stored_token() {
        let token = AuthorizedUserToken::from_json(STORED.as_bytes()).unwrap();
        assert_eq!(token.access_token(), Some("ya29.old"));
        assert!(token.can_refresh());
        assert_eq!(token.scopes, vec!["https://mail.google.com/".to_string()]);
        assert!(token.expiry.is_some());
        assert!(token.is_expired());
        assert!(!token.is_valid());
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let token = AuthorizedUserToken::from_json(STORED.as_bytes()).unwrap();
        let json: Value = serde_json::from_str(&token.to_json().unwrap()).unwrap();
        assert_eq!(json["universe_domain"], "googleapis.com");
        assert_eq!(json["account"], "");
        assert_eq!(json["refresh_token"], "1//refresh");
    }

    #[test]
    fn test_expiry_skew() {
        let now = Utc::now();
        let mut token = AuthorizedUserToken::from_json(STORED.as_bytes()).unwrap();
        token.expiry = Some(now + Duration::seconds(200));
        assert!(token.is_expired_at(now));
        token.expiry = Some(now + Duration::seconds(600));
        assert!(!token.is_expired_at(now));
        token.expiry = None;
        assert!(!token.is_expired_at(now));
    }

    #[test]
    fn test_refresh_keeps_refresh_token() {
        let mut token = AuthorizedUserToken::from_json(STORED.as_bytes()).unwrap();
        token.apply_refresh(response("ya29.new", None));
        assert_eq!(token.access_token(), Some("ya29.new"));
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
        assert!(token.is_valid());
    }

    #[test]
    fn test_from_exchange() {
        let client =
            OAuthClient::from_json(br#"{"installed":{"client_id":"abc.apps","client_secret":"shh"}}"#)
                .unwrap();
        let scopes = vec!["https://mail.google.com/".to_string()];
        let token =
            AuthorizedUserToken::from_exchange(&client, &scopes, response("ya29.a", Some("1//r")));
        assert_eq!(token.client_id, "abc.apps");
        assert_eq!(token.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(token.scopes, scopes);
        assert!(token.is_valid());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let token = AuthorizedUserToken::from_json(STORED.as_bytes()).unwrap();
        let debug = format!("{:?}", token);
        assert!(!debug.contains("ya29.old"));
        assert!(!debug.contains("1//refresh"));
    }
}
