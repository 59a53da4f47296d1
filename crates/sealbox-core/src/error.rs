//! Error types for Sealbox core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps them to
//! exit codes. No variant ever carries plaintext, passwords or key bytes.

use thiserror::Error;

/// Result type alias for Sealbox operations.
pub type Result<T> = std::result::Result<T, SealError>;

/// Core error type for Sealbox operations.
#[derive(Debug, Error)]
pub enum SealError {
    /// Envelope could not be parsed or a field could not be decoded
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Wrong password or tampered ciphertext
    #[error("Incorrect admin password or corrupted sealed secret")]
    AuthenticationFailure,

    /// Envelope written by a newer format
    #[error("Unsupported envelope version: {0}")]
    UnsupportedEnvelopeVersion(u32),

    /// No superuser or staff account exists in the credential store
    #[error("No admin or staff account exists in the credential store")]
    NoAdminAvailable,

    /// Credentials rejected, or the account is not staff
    #[error("Invalid admin credentials (a staff account is required)")]
    InvalidAdminCredentials,

    /// Resolved password was empty
    #[error("No admin password provided")]
    EmptyPassword,

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cryptographic backend error unrelated to authentication
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Credential store could not be opened or queried
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SealError {
    /// True for failures the operator fixes by re-entering credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            SealError::AuthenticationFailure
                | SealError::InvalidAdminCredentials
                | SealError::EmptyPassword
                | SealError::NoAdminAvailable
        )
    }
}

impl From<rusqlite::Error> for SealError {
    fn from(err: rusqlite::Error) -> Self {
        SealError::CredentialStore(err.to_string())
    }
}
