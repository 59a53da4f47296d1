//! Cryptographic operations for Sealbox.
//!
//! This module provides key derivation and token encryption using
//! well-audited libraries:
//! - **PBKDF2-HMAC-SHA256**: password-based key derivation
//! - **Fernet**: AES-128-CBC + HMAC-SHA256 tokens with an embedded
//!   timestamp and IV
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of sealed secret files (e.g. committed to a repository)
//! - Tampering with sealed files at rest
//!
//! We do NOT defend against:
//! - Compromise of the administrator password
//! - Access to a process that already holds unsealed secrets

pub mod cipher;
pub mod key;

pub use cipher::{open_token, seal_token};
pub use key::{derive_key, generate_salt, DerivedKey, KDF_ITERATIONS, SALT_LENGTH};
