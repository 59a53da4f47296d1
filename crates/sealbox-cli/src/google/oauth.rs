//! OAuth 2.0 authorization code flow with PKCE for installed applications.

use std::collections::HashMap;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::errors::CliError;

use super::client_secret::OAuthClient;
use super::token::AuthorizedUserToken;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// PKCE challenge pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

/// Result of starting the OAuth flow.
pub struct AuthorizationRequest {
    pub url: String,
    pub pkce: PkceChallenge,
    pub state: String,
}

/// Token endpoint response.
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

fn random_urlsafe(len: usize) -> anyhow::Result<String> {
    let mut bytes = vec![0u8; len];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| anyhow::anyhow!("Failed to gather randomness: {}", e))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

pub fn generate_pkce() -> anyhow::Result<PkceChallenge> {
    let verifier = random_urlsafe(32)?;
    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
    Ok(PkceChallenge {
        verifier,
        challenge,
    })
}

pub fn generate_state() -> anyhow::Result<String> {
    random_urlsafe(16)
}

pub(crate) fn http_client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("sealbox/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Manages the authorization code flow for one client registration.
pub struct OAuthFlow {
    client: OAuthClient,
    scopes: Vec<String>,
    redirect_uri: String,
    http: reqwest::blocking::Client,
}

impl OAuthFlow {
    pub fn new(client: OAuthClient, scopes: Vec<String>, redirect_uri: String) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            scopes,
            redirect_uri,
            http: http_client()?,
        })
    }

    pub fn client(&self) -> &OAuthClient {
        &self.client
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Build the consent URL and generate PKCE + state.
    ///
    /// Requests offline access and forces the consent screen so a refresh
    /// token is always issued.
    pub fn start(&self) -> anyhow::Result<AuthorizationRequest> {
        let pkce = generate_pkce()?;
        let state = generate_state()?;

        let mut url = Url::parse(&self.client.auth_uri)
            .map_err(|e| anyhow::anyhow!("Invalid auth_uri in client secret: {}", e))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("include_granted_scopes", "true");

        Ok(AuthorizationRequest {
            url: url.to_string(),
            pkce,
            state,
        })
    }

    /// Exchange an authorization code for tokens.
    pub fn exchange(&self, code: &str, verifier: &str) -> anyhow::Result<TokenResponse> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client.client_id.as_str()),
            ("code_verifier", verifier),
        ];
        if !self.client.client_secret.is_empty() {
            form.push(("client_secret", self.client.client_secret.as_str()));
        }
        debug!(token_uri = %self.client.token_uri, "exchanging authorization code");
        post_token_form(&self.http, &self.client.token_uri, &form)
    }
}

/// Refresh the access token of a stored token.
pub fn refresh_access_token(
    http: &reqwest::blocking::Client,
    token: &AuthorizedUserToken,
) -> anyhow::Result<TokenResponse> {
    let refresh_token = token
        .refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CliError::invalid_input("Token has no refresh_token"))?;
    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", token.client_id.as_str()),
    ];
    if !token.client_secret.is_empty() {
        form.push(("client_secret", token.client_secret.as_str()));
    }
    debug!(token_uri = %token.token_uri, "refreshing access token");
    post_token_form(http, &token.token_uri, &form)
}

fn post_token_form(
    http: &reqwest::blocking::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> anyhow::Result<TokenResponse> {
    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .map_err(|e| CliError::remote(format!("Token endpoint unreachable: {}", e)))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| CliError::remote(format!("Failed to read token response: {}", e)))?;
    if !status.is_success() {
        return Err(CliError::remote(format!("Token endpoint returned {}: {}", status, body.trim())).into());
    }
    let value: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| CliError::remote(format!("Token response is not JSON: {}", e)))?;
    parse_token_response(&value)
}

fn parse_token_response(resp: &serde_json::Value) -> anyhow::Result<TokenResponse> {
    let access_token = resp["access_token"]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CliError::remote("missing access_token in token response"))?
        .to_string();

    Ok(TokenResponse {
        access_token,
        refresh_token: resp["refresh_token"].as_str().map(str::to_string),
        expires_in: resp["expires_in"].as_i64(),
        scope: resp["scope"].as_str().map(str::to_string),
    })
}

/// Pull the authorization code out of a redirect URL after checking `state`.
pub fn extract_code(redirect_url: &str, expected_state: &str) -> anyhow::Result<String> {
    let url = Url::parse(redirect_url.trim())
        .map_err(|e| CliError::invalid_input(format!("Invalid redirect URL: {}", e)))?;
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    code_from_params(&params, expected_state)
}

/// Validate redirect query parameters and return the authorization code.
pub fn code_from_params(
    params: &HashMap<String, String>,
    expected_state: &str,
) -> anyhow::Result<String> {
    if let Some(error) = params.get("error") {
        return Err(CliError::remote(format!("Authorization denied: {}", error)).into());
    }
    match params.get("state") {
        Some(state) if state == expected_state => {}
        Some(_) => return Err(CliError::invalid_input("OAuth state mismatch").into()),
        None => return Err(CliError::invalid_input("Redirect URL has no state parameter").into()),
    }
    params
        .get("code")
        .filter(|code| !code.is_empty())
        .cloned()
        .ok_or_else(|| CliError::invalid_input("Redirect URL has no code parameter").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token_uri: &str) -> OAuthClient {
        OAuthClient::from_json(
            format!(
                r#"{{"installed":{{"client_id":"abc.apps","client_secret":"shh","token_uri":"{}"}}}}"#,
                token_uri
            )
            .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_pkce_challenge_is_sha256_of_verifier() {
        let pkce = generate_pkce().unwrap();
        assert_eq!(pkce.verifier.len(), 43);
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(pkce.verifier.as_bytes()));
        assert_eq!(pkce.challenge, expected);
        assert_ne!(generate_state().unwrap(), generate_state().unwrap());
    }

    #[test]
    fn test_authorization_url_params() {
        let flow = OAuthFlow::new(
            client("https://oauth2.example/token"),
            vec!["https://mail.google.com/".to_string()],
            "http://localhost:8080/".to_string(),
        )
        .unwrap();
        let request = flow.start().unwrap();
        let url = Url::parse(&request.url).unwrap();
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "abc.apps");
        assert_eq!(pairs["redirect_uri"], "http://localhost:8080/");
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["prompt"], "consent");
        assert_eq!(pairs["include_granted_scopes"], "true");
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["code_challenge"], request.pkce.challenge);
        assert_eq!(pairs["state"], request.state);
        assert_eq!(pairs["scope"], "https://mail.google.com/");
    }

    #[test]
    fn test_extract_code() {
        let code = extract_code("http://localhost:8080/?state=xyz&code=4/abc&scope=s", "xyz").unwrap();
        assert_eq!(code, "4/abc");
        assert!(extract_code("http://localhost:8080/?state=bad&code=4/abc", "xyz").is_err());
        assert!(extract_code("http://localhost:8080/?state=xyz", "xyz").is_err());
        assert!(extract_code("http://localhost:8080/?error=access_denied&state=xyz", "xyz").is_err());
        assert!(extract_code("not a url", "xyz").is_err());
    }

    #[test]
    fn test_exchange_posts_code_and_verifier() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                mockito::Matcher::UrlEncoded("code".into(), "4/abc".into()),
                mockito::Matcher::UrlEncoded("code_verifier".into(), "verifier".into()),
                mockito::Matcher::UrlEncoded("client_secret".into(), "shh".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.a","refresh_token":"1//r","expires_in":3599,"scope":"https://mail.google.com/"}"#)
            .create();

        let flow = OAuthFlow::new(
            client(&format!("{}/token", server.url())),
            vec!["https://mail.google.com/".to_string()],
            "http://localhost:8080/".to_string(),
        )
        .unwrap();
        let response = flow.exchange("4/abc", "verifier").unwrap();
        mock.assert();
        assert_eq!(response.access_token, "ya29.a");
        assert_eq!(response.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(response.expires_in, Some(3599));
    }

    #[test]
    fn test_refresh_failure_is_remote_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create();

        let token = AuthorizedUserToken::from_json(
            format!(
                r#"{{"token":"old","refresh_token":"1//r","token_uri":"{}/token","client_id":"abc.apps","client_secret":"shh"}}"#,
                server.url()
            )
            .as_bytes(),
        )
        .unwrap();
        let err = refresh_access_token(&http_client().unwrap(), &token).unwrap_err();
        assert_eq!(crate::errors::exit_code_for(&err), crate::constants::exit_codes::REMOTE_FAILED);
        assert!(err.to_string().contains("invalid_grant"));
    }
}
