//! Admin-gated password resolution.
//!
//! The password that unseals secrets must also log in a staff account.
//! [`resolve_admin_password`] picks the account, obtains the password and
//! checks both against the credential store before any decryption happens.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::accounts::CredentialStore;
use crate::error::{Result, SealError};

/// Supplies the admin password when the caller did not pass one.
pub trait PasswordSource {
    fn read_password(&self, username: &str) -> Result<SecretString>;
}

/// A fixed password, for non-interactive callers and tests.
pub struct StaticPassword(SecretString);

impl StaticPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(SecretString::from(password.into()))
    }
}

impl PasswordSource for StaticPassword {
    fn read_password(&self, _username: &str) -> Result<SecretString> {
        Ok(SecretString::from(self.0.expose_secret().to_string()))
    }
}

/// A password that refuses to be read, for callers with no way to prompt.
pub struct NoPassword;

impl PasswordSource for NoPassword {
    fn read_password(&self, _username: &str) -> Result<SecretString> {
        Err(SealError::EmptyPassword)
    }
}

/// Validated admin credentials.
pub struct AdminCredential {
    username: String,
    password: SecretString,
}

impl AdminCredential {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The passphrase for sealing and unsealing.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Pick the default administrator.
///
/// First active superuser by id, else first active staff account by id.
pub fn default_admin_username(store: &dyn CredentialStore) -> Result<String> {
    let accounts = store.accounts()?;
    accounts
        .iter()
        .filter(|a| a.is_active)
        .find(|a| a.is_superuser)
        .or_else(|| accounts.iter().filter(|a| a.is_active).find(|a| a.is_staff))
        .map(|a| a.username.clone())
        .ok_or(SealError::NoAdminAvailable)
}

/// Resolve and verify the admin credentials used as the sealing passphrase.
///
/// - `username`: defaults to [`default_admin_username`] when absent or empty
/// - `password`: read from `source` when absent or empty
///
/// # Errors
///
/// - [`SealError::NoAdminAvailable`] if no username was given and no admin exists
/// - [`SealError::EmptyPassword`] if the resolved password is empty
/// - [`SealError::InvalidAdminCredentials`] if authentication fails or the
///   account is not staff
pub fn resolve_admin_password(
    store: &dyn CredentialStore,
    username: Option<&str>,
    password: Option<SecretString>,
    source: &dyn PasswordSource,
) -> Result<AdminCredential> {
    let username = match username.filter(|u| !u.trim().is_empty()) {
        Some(name) => name.to_string(),
        None => {
            let name = default_admin_username(store)?;
            debug!(username = %name, "selected default admin account");
            name
        }
    };

    let password = match password.filter(|p| !p.expose_secret().is_empty()) {
        Some(password) => password,
        None => source.read_password(&username)?,
    };
    if password.expose_secret().is_empty() {
        return Err(SealError::EmptyPassword);
    }

    match store.authenticate(&username, password.expose_secret())? {
        Some(account) if account.is_staff => {
            info!(username = %username, "admin credentials verified");
            Ok(AdminCredential { username, password })
        }
        Some(_) => {
            warn!(username = %username, "account is not staff");
            Err(SealError::InvalidAdminCredentials)
        }
        None => {
            warn!(username = %username, "admin authentication failed");
            Err(SealError::InvalidAdminCredentials)
        }
    }
}
