//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;
use std::io::ErrorKind;

use sealbox_core::SealError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (secret file, credential database, etc.)
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),

    /// OAuth provider or mailbox API failure
    RemoteFailed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
            CliError::RemoteFailed(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Create a RemoteFailed error.
    pub fn remote(message: impl Into<String>) -> Self {
        CliError::RemoteFailed(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::RemoteFailed(_) => exit_codes::REMOTE_FAILED,
        }
    }
}

/// Exit code for a core sealing error.
pub fn seal_error_exit_code(err: &SealError) -> i32 {
    match err {
        err if err.is_auth_failure() => exit_codes::AUTH_FAILED,
        SealError::MalformedEnvelope(_)
        | SealError::UnsupportedEnvelopeVersion(_)
        | SealError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        SealError::Io { source } if source.kind() == ErrorKind::NotFound => exit_codes::NOT_FOUND,
        _ => exit_codes::GENERAL,
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return cli.exit_code();
        }
        if let Some(seal) = cause.downcast_ref::<SealError>() {
            return seal_error_exit_code(seal);
        }
    }
    exit_codes::GENERAL
}

/// Hint printed under authentication failures.
pub fn auth_hint(err: &anyhow::Error) -> Option<&'static str> {
    let seal = err.chain().find_map(|c| c.downcast_ref::<SealError>())?;
    match seal {
        SealError::AuthenticationFailure | SealError::InvalidAdminCredentials => Some(
            "Hint: Use the password of a staff account in the application database.",
        ),
        SealError::EmptyPassword => Some(
            "Hint: Pass --admin-password or set SEALBOX_ADMIN_PASSWORD when no terminal is available.",
        ),
        SealError::NoAdminAvailable => {
            Some("Hint: Create a staff or superuser account in the application first.")
        }
        _ => None,
    }
}
