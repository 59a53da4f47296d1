//! Application context for the Sealbox CLI.
//!
//! Bundles CLI arguments with the lazily-loaded config file so handlers do
//! not reload it or thread many parameters around.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use secrecy::SecretString;
use tracing::debug;

use sealbox_core::{
    resolve_admin_password, AdminCredential, NoPassword, PasswordCipher, PasswordSource,
    SqliteCredentialStore,
};

use crate::cli::{ClientSecretPathArgs, Cli, TokenPathArgs};
use crate::config::{read_config, SealboxConfig};
use crate::constants::{DEFAULT_ACCOUNTS_DB, DEFAULT_TOKEN_FILE};
use crate::errors::CliError;
use crate::google::{GmailClient, GMAIL_API_BASE};

use super::admin::TerminalPassword;
use super::resolver::{
    default_client_secret, pick_path, resolve_config_path, sealed_path_for, ClientSecretPaths,
    TokenPaths,
};

/// Config file contents plus where they came from.
pub struct LoadedConfig {
    pub path: PathBuf,
    pub exists: bool,
    pub config: SealboxConfig,
}

impl LoadedConfig {
    /// Directory that relative config paths are anchored at.
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<LoadedConfig>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Get the CLI arguments.
    pub fn cli(&self) -> &Cli {
        self.cli
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// True when prompts may be shown.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && !self.cli.no_input
    }

    /// Get the configuration, loading it lazily. A missing file means defaults.
    pub fn config(&self) -> anyhow::Result<&LoadedConfig> {
        self.config.get_or_try_init(|| -> anyhow::Result<LoadedConfig> {
            let path = resolve_config_path(self.cli.config.as_deref())?;
            let exists = path.exists();
            let config = if exists {
                read_config(&path)?
            } else {
                if self.cli.config.is_some() {
                    return Err(CliError::not_found(
                        format!("Config file not found: {}", path.display()),
                        "Hint: Drop --config/SEALBOX_CONFIG to use built-in defaults.",
                    )
                    .into());
                }
                SealboxConfig::default()
            };
            debug!(path = %path.display(), exists, "loaded config");
            Ok(LoadedConfig {
                path,
                exists,
                config,
            })
        })
    }

    /// Cipher using the configured work factor.
    pub fn cipher(&self) -> anyhow::Result<PasswordCipher> {
        let iterations = self.config()?.config.crypto.kdf_iterations;
        Ok(PasswordCipher::with_iterations(iterations)?)
    }

    /// OAuth scopes to request.
    pub fn scopes(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.config()?.config.gmail.scopes.clone())
    }

    /// Mailbox API client, honoring `[gmail] api_base`.
    pub fn gmail_client(&self, access_token: &str) -> anyhow::Result<GmailClient> {
        let base = self.config()?.config.gmail.api_base.as_deref().unwrap_or(GMAIL_API_BASE);
        debug!(base, "mailbox API base");
        GmailClient::with_base(access_token, base)
    }

    /// Location of the application database holding admin accounts.
    pub fn accounts_db_path(&self) -> anyhow::Result<PathBuf> {
        let loaded = self.config()?;
        pick_path(
            self.cli.accounts_db.as_deref(),
            loaded.config.accounts.database.as_deref(),
            loaded.base_dir(),
            || PathBuf::from(DEFAULT_ACCOUNTS_DB),
        )
    }

    /// Verify the admin and return the credentials that double as passphrase.
    pub fn resolve_admin(&self) -> anyhow::Result<AdminCredential> {
        let db_path = self.accounts_db_path()?;
        if !db_path.exists() {
            return Err(CliError::not_found(
                format!("Credential database not found: {}", db_path.display()),
                "Hint: Pass --accounts-db or set [accounts] database in the config.",
            )
            .into());
        }
        let store = SqliteCredentialStore::open(&db_path)?;
        let password = self
            .cli
            .admin_password
            .clone()
            .map(SecretString::from);
        let source: &dyn PasswordSource = if self.interactive() {
            &TerminalPassword
        } else {
            &NoPassword
        };
        let credential = resolve_admin_password(
            &store,
            self.cli.admin_username.as_deref(),
            password,
            source,
        )?;
        Ok(credential)
    }

    /// Resolve client secret locations from flags, config and defaults.
    pub fn client_secret_paths(&self, args: &ClientSecretPathArgs) -> anyhow::Result<ClientSecretPaths> {
        let loaded = self.config()?;
        let gmail = &loaded.config.gmail;
        let plain = pick_path(
            args.client_secret.as_deref(),
            gmail.client_secret.as_deref(),
            loaded.base_dir(),
            || default_client_secret(Path::new(".")),
        )?;
        let sealed = pick_path(
            args.client_secret_enc.as_deref(),
            gmail.client_secret_enc.as_deref(),
            loaded.base_dir(),
            || sealed_path_for(&plain),
        )?;
        Ok(ClientSecretPaths { plain, sealed })
    }

    /// Resolve token locations from flags, config and defaults.
    pub fn token_paths(&self, args: &TokenPathArgs) -> anyhow::Result<TokenPaths> {
        let loaded = self.config()?;
        let gmail = &loaded.config.gmail;
        let plain = pick_path(
            args.token_file.as_deref(),
            gmail.token_file.as_deref(),
            loaded.base_dir(),
            || PathBuf::from(DEFAULT_TOKEN_FILE),
        )?;
        let sealed = pick_path(
            args.token_file_enc.as_deref(),
            gmail.token_file_enc.as_deref(),
            loaded.base_dir(),
            || sealed_path_for(&plain),
        )?;
        Ok(TokenPaths { plain, sealed })
    }
}
