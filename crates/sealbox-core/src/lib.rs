//! # Sealbox Core
//!
//! Core library for Sealbox - password-sealed storage for operational
//! secrets (OAuth client secrets and tokens) gated by administrator login.
//!
//! This crate provides the sealing primitives, the on-disk envelope format
//! and the admin-gated password resolution, independent of the CLI.
//!
//! ## Architecture
//!
//! - **crypto**: PBKDF2 key derivation and the Fernet token cipher
//! - **envelope**: Versioned JSON envelope (`v`, `iter`, `salt`, `token`)
//! - **secret_box**: Seal/unseal of byte blobs and files
//! - **accounts**: Credential store trait, SQLite and in-memory stores,
//!   password hash verification
//! - **admin**: Admin selection and password resolution
//!
//! ## Security Model
//!
//! The password that logs an administrator into the web application is the
//! same passphrase that seals secrets. Holding valid staff credentials is
//! both necessary and sufficient to unseal.

pub mod accounts;
pub mod admin;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod fs;
pub mod secret_box;

pub use accounts::{Account, CredentialStore, MemoryCredentialStore, SqliteCredentialStore};
pub use admin::{
    default_admin_username, resolve_admin_password, AdminCredential, NoPassword, PasswordSource,
    StaticPassword,
};
pub use envelope::SealedSecret;
pub use error::{Result, SealError};
pub use secret_box::{
    decrypt_bytes, decrypt_file, encrypt_bytes, encrypt_file, PasswordCipher, SecretCipher,
};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
