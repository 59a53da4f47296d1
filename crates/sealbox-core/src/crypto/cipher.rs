//! Fernet token encryption under a derived key.
//!
//! Fernet authenticates the whole token (version, timestamp, IV and
//! ciphertext) with HMAC-SHA256 before decrypting, so a wrong key and a
//! tampered token are indistinguishable and both surface as
//! [`SealError::AuthenticationFailure`].

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use fernet::Fernet;

use crate::crypto::key::DerivedKey;
use crate::error::{Result, SealError};

/// Strict about trailing bits, indifferent to padding.
const TOKEN_ENCODING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn fernet_for(key: &DerivedKey) -> Result<Fernet> {
    let encoded = key.to_fernet_key();
    Fernet::new(&encoded)
        .ok_or_else(|| SealError::Crypto("Derived key is not a valid Fernet key".to_string()))
}

/// Encrypt `plaintext` into an ASCII Fernet token.
pub fn seal_token(key: &DerivedKey, plaintext: &[u8]) -> Result<String> {
    let fernet = fernet_for(key)?;
    Ok(fernet.encrypt(plaintext))
}

/// Verify and decrypt a Fernet token.
///
/// # Errors
///
/// Returns [`SealError::AuthenticationFailure`] if the key is wrong or the
/// token was modified in any way.
pub fn open_token(key: &DerivedKey, token: &str) -> Result<Vec<u8>> {
    // Non-canonical encodings (altered padding bits) count as tampering.
    if TOKEN_ENCODING.decode(token.as_bytes()).is_err() {
        return Err(SealError::AuthenticationFailure);
    }
    let fernet = fernet_for(key)?;
    fernet
        .decrypt(token)
        .map_err(|_| SealError::AuthenticationFailure)
}
