//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells, also clap usage errors)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// General failure.
    pub const GENERAL: i32 = 1;

    /// Resource not found (config, secret file, credential database).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input, malformed or unsupported envelope.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (admin credentials, wrong password, tampered secret).
    pub const AUTH_FAILED: i32 = 5;

    /// OAuth provider or mailbox API failure.
    pub const REMOTE_FAILED: i32 = 6;
}

/// Scope requested when the config does not name one.
pub const DEFAULT_GMAIL_SCOPE: &str = "https://mail.google.com/";

/// Default application database file name (credential store).
pub const DEFAULT_ACCOUNTS_DB: &str = "db.sqlite3";

/// Default plaintext token location.
pub const DEFAULT_TOKEN_FILE: &str = "secrets/gmail.storage";

/// Suffix appended to a plaintext path to name its sealed counterpart.
pub const SEALED_SUFFIX: &str = ".enc";
