//! Verification of stored password hashes.
//!
//! Hashes use the `<algorithm>$<fields...>` encoding of the web framework
//! that owns the accounts:
//!
//! - `pbkdf2_sha256$<iterations>$<salt>$<base64 hash>`
//! - `argon2$argon2id$v=19$m=<kib>,t=<n>,p=<n>$<salt>$<hash>` (PHC string
//!   after the `argon2` prefix)
//!
//! Anything else, including unusable passwords (`!` prefix), never matches.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::{Result, SealError};

const PBKDF2_SHA256: &str = "pbkdf2_sha256";
const ARGON2: &str = "argon2";

/// Check `password` against an encoded hash.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    if encoded.is_empty() || encoded.starts_with('!') {
        return false;
    }
    let algorithm = encoded.split('$').next().unwrap_or_default();
    match algorithm {
        PBKDF2_SHA256 => verify_pbkdf2_sha256(password, encoded),
        ARGON2 => verify_argon2(password, &encoded[ARGON2.len()..]),
        other => {
            warn!(algorithm = other, "unsupported password hash algorithm");
            false
        }
    }
}

fn verify_pbkdf2_sha256(password: &str, encoded: &str) -> bool {
    let parts: Vec<&str> = encoded.splitn(4, '$').collect();
    let [_, iterations, salt, expected] = parts.as_slice() else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    let computed = pbkdf2_sha256_b64(password, salt, iterations);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn verify_argon2(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "unparseable argon2 password hash");
            false
        }
    }
}

fn pbkdf2_sha256_b64(password: &str, salt: &str, iterations: u32) -> String {
    let mut out = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
    STANDARD.encode(out)
}

/// Produce a `pbkdf2_sha256` hash the account store accepts.
pub fn make_pbkdf2_sha256(password: &str, salt: &str, iterations: u32) -> Result<String> {
    if salt.is_empty() || salt.contains('$') {
        return Err(SealError::InvalidInput(
            "Hash salt must be non-empty and must not contain '$'".to_string(),
        ));
    }
    if iterations == 0 {
        return Err(SealError::InvalidInput(
            "Iteration count must be positive".to_string(),
        ));
    }
    Ok(format!(
        "{}${}${}${}",
        PBKDF2_SHA256,
        iterations,
        salt,
        pbkdf2_sha256_b64(password, salt, iterations)
    ))
}
