use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use sealbox_core::crypto::KDF_ITERATIONS;

use crate::constants::DEFAULT_GMAIL_SCOPE;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SealboxConfig {
    pub accounts: AccountsSection,
    pub crypto: CryptoSection,
    pub gmail: GmailSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsSection {
    pub database: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoSection {
    pub kdf_iterations: u32,
}

impl Default for CryptoSection {
    fn default() -> Self {
        Self {
            kdf_iterations: KDF_ITERATIONS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailSection {
    pub client_secret: Option<String>,
    pub client_secret_enc: Option<String>,
    pub token_file: Option<String>,
    pub token_file_enc: Option<String>,
    pub scopes: Vec<String>,
    /// Mailbox API root; defaults to the public endpoint.
    pub api_base: Option<String>,
}

impl Default for GmailSection {
    fn default() -> Self {
        Self {
            client_secret: None,
            client_secret_enc: None,
            token_file: None,
            token_file_enc: None,
            scopes: vec![DEFAULT_GMAIL_SCOPE.to_string()],
            api_base: None,
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn read_config(path: &Path) -> anyhow::Result<SealboxConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    parse_config(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn parse_config(contents: &str) -> anyhow::Result<SealboxConfig> {
    let config: SealboxConfig = toml::from_str(contents)?;
    if config.crypto.kdf_iterations == 0 {
        return Err(anyhow::anyhow!("crypto.kdf_iterations must be positive"));
    }
    if config.gmail.scopes.is_empty() {
        return Err(anyhow::anyhow!("gmail.scopes must not be empty"));
    }
    if let Some(base) = config.gmail.api_base.as_deref() {
        Url::parse(base).map_err(|e| anyhow::anyhow!("gmail.api_base is not a URL: {}", e))?;
    }
    Ok(config)
}

pub fn render_config(config: &SealboxConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("sealbox"));
        }
    }
    Ok(home_dir()?.join(".config").join("sealbox"))
}

/// Expand a leading `~/` and anchor relative paths at `base`.
pub fn resolve_path(value: &str, base: &Path) -> anyhow::Result<PathBuf> {
    if value == "~" {
        return home_dir();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return Ok(home_dir()?.join(rest));
    }
    let path = PathBuf::from(value);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base.join(path))
    }
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.crypto.kdf_iterations, KDF_ITERATIONS);
        assert_eq!(config.gmail.scopes, vec![DEFAULT_GMAIL_SCOPE.to_string()]);
        assert!(config.accounts.database.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            "[accounts]\ndatabase = \"/srv/app/db.sqlite3\"\n\n[crypto]\nkdf_iterations = 600000\n",
        )
        .unwrap();
        assert_eq!(config.accounts.database.as_deref(), Some("/srv/app/db.sqlite3"));
        assert_eq!(config.crypto.kdf_iterations, 600_000);
        assert!(config.gmail.token_file.is_none());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(parse_config("[crypto]\nkdf_iterations = 0\n").is_err());
    }

    #[test]
    fn test_api_base_override() {
        let config = parse_config("[gmail]\napi_base = \"http://127.0.0.1:9/gmail/v1/\"\n").unwrap();
        assert_eq!(config.gmail.api_base.as_deref(), Some("http://127.0.0.1:9/gmail/v1/"));
        assert!(parse_config("[gmail]\napi_base = \"not a url\"\n").is_err());
        assert!(parse_config("").unwrap().gmail.api_base.is_none());
    }

    #[test]
    fn test_render_round_trips() {
        let rendered = render_config(&SealboxConfig::default()).unwrap();
        let parsed = parse_config(&rendered).unwrap();
        assert_eq!(parsed.crypto.kdf_iterations, KDF_ITERATIONS);
    }

    #[test]
    fn test_resolve_path_relative_and_absolute() {
        let base = Path::new("/etc/sealbox");
        assert_eq!(
            resolve_path("secrets/token", base).unwrap(),
            PathBuf::from("/etc/sealbox/secrets/token")
        );
        assert_eq!(
            resolve_path("/abs/token", base).unwrap(),
            PathBuf::from("/abs/token")
        );
    }
}
