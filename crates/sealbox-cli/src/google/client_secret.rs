use serde::Deserialize;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration downloaded from the provider console.
#[derive(Clone, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<OAuthClient>,
    web: Option<OAuthClient>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl OAuthClient {
    /// Parse a client secret file; the `installed` entry wins over `web`.
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        let file: ClientSecretFile = serde_json::from_slice(bytes)
            .map_err(|e| anyhow::anyhow!("Invalid client secret JSON: {}", e))?;
        let client = file
            .installed
            .or(file.web)
            .ok_or_else(|| anyhow::anyhow!("Client secret has no \"installed\" or \"web\" entry"))?;
        if client.client_id.trim().is_empty() {
            return Err(anyhow::anyhow!("Client secret has an empty client_id"));
        }
        Ok(client)
    }
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
