//! Interactive admin password prompt.

use dialoguer::Password;
use secrecy::SecretString;

use sealbox_core::{PasswordSource, Result, SealError};

/// Reads the admin password from the terminal without echo.
pub struct TerminalPassword;

impl PasswordSource for TerminalPassword {
    fn read_password(&self, username: &str) -> Result<SecretString> {
        Password::new()
            .with_prompt(format!("Admin password ({})", username))
            .allow_empty_password(true)
            .interact()
            .map(SecretString::from)
            .map_err(|e| SealError::InvalidInput(format!("Failed to read password: {}", e)))
    }
}
