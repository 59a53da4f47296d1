//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! Derives the 32-byte key behind a Fernet cipher from the admin password
//! and a per-envelope salt. The work factor travels with each envelope, so
//! the default below can be raised without orphaning older files.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{Result, SealError};

/// Default PBKDF2 work factor for new envelopes.
pub const KDF_ITERATIONS: u32 = 390_000;

/// Salt length in bytes for new envelopes.
pub const SALT_LENGTH: usize = 16;

/// Length of derived key in bytes (Fernet signing key + encryption key).
const KEY_LENGTH: usize = 32;

/// A cryptographic key derived from a password.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Encode the key in the urlsafe base64 text form a Fernet cipher expects.
    pub fn to_fernet_key(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(self.key))
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive an encryption key from a password using PBKDF2-HMAC-SHA256.
///
/// # Arguments
///
/// * `password` - The admin password
/// * `salt` - Random salt, stored alongside the ciphertext
/// * `iterations` - Work factor recorded in the envelope
///
/// # Security
///
/// - Same password + salt + iterations always produces the same key
/// - Different salt produces a different key
///
/// # Examples
///
/// ```
/// use sealbox_core::crypto::derive_key;
///
/// let salt = b"unique-salt-16by";
/// let key = derive_key("my-password", salt, 1_000).unwrap();
/// assert_eq!(key.as_bytes().len(), 32);
/// ```
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(SealError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    if salt.len() < SALT_LENGTH {
        return Err(SealError::InvalidInput(format!(
            "Salt must be at least {} bytes",
            SALT_LENGTH
        )));
    }

    if iterations == 0 {
        return Err(SealError::InvalidInput(
            "Iteration count must be positive".to_string(),
        ));
    }

    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key_bytes);

    let key = DerivedKey::from_bytes(key_bytes);
    zeroize::Zeroize::zeroize(&mut key_bytes);
    Ok(key)
}

/// Draw a fresh random salt from the OS RNG.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH]> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt)
        .map_err(|e| SealError::Crypto(format!("Failed to generate salt: {}", e)))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn test_key_derivation_deterministic() {
        let salt = b"unique-salt-1234567890123456";

        let key1 = derive_key("test-password", salt, FAST).unwrap();
        let key2 = derive_key("test-password", salt, FAST).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("test-password", b"salt1-1234567890123456", FAST).unwrap();
        let key2 = derive_key("test-password", b"salt2-1234567890123456", FAST).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_iterations_different_key() {
        let salt = b"fixed-salt-123456789012345";
        let key1 = derive_key("test-password", salt, FAST).unwrap();
        let key2 = derive_key("test-password", salt, FAST + 1).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_known_vector() {
        // PBKDF2-HMAC-SHA256 reference vector, first 32 bytes of the 40-byte output.
        let key = derive_key(
            "passwordPASSWORDpassword",
            b"saltSALTsaltSALTsaltSALTsaltSALTsalt",
            4096,
        )
        .unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "348c89dbcbd32b2f32d814b8116e84cf2b17347ebc1800181c4e2a1fb8dd53e1"
        );
    }

    #[test]
    fn test_empty_password_rejected() {
        let result = derive_key("", b"salt-1234567890123456", FAST);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Password cannot be empty"));
    }

    #[test]
    fn test_short_salt_rejected() {
        let result = derive_key("test-password", b"short", FAST);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Salt must be at least 16 bytes"));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = derive_key("test-password", b"salt-1234567890123456", 0);
        assert!(matches!(result, Err(SealError::InvalidInput(_))));
    }

    #[test]
    fn test_fernet_key_is_urlsafe_base64_of_key() {
        let key = derive_key("test-password", b"salt-1234567890123456", FAST).unwrap();
        let text = key.to_fernet_key();
        assert_eq!(text.len(), 44);
        assert_eq!(URL_SAFE.decode(text.as_bytes()).unwrap(), key.as_bytes());
    }

    #[test]
    fn test_generated_salts_differ() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_eq!(a.len(), SALT_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn test_derived_key_debug_redacts() {
        let key = derive_key("test-password", b"salt-1234567890123456", FAST).unwrap();

        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));

        let key_hex = hex::encode(&key.as_bytes()[..4]);
        assert!(!debug_output.contains(&key_hex));
    }
}
