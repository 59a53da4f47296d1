//! Seal and unseal secret blobs under an admin password.
//!
//! [`SecretCipher`] is the seam between callers and the cryptography;
//! [`PasswordCipher`] is the production implementation (PBKDF2 + Fernet in a
//! versioned JSON envelope). The free functions use the default work factor.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{derive_key, generate_salt, open_token, seal_token, KDF_ITERATIONS};
use crate::envelope::SealedSecret;
use crate::error::{Result, SealError};
use crate::fs::write_atomic;

/// Password-keyed sealing of byte blobs.
pub trait SecretCipher {
    /// Seal `plaintext` into serialized envelope bytes.
    fn seal(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>>;

    /// Open serialized envelope bytes.
    fn unseal(&self, envelope: &[u8], password: &str) -> Result<Vec<u8>>;

    /// Seal the contents of `input` and write the envelope to `output`.
    fn seal_file(&self, input: &Path, output: &Path, password: &str) -> Result<()> {
        let plaintext = Zeroizing::new(
            fs::read(input).map_err(|e| with_path(e, "read", input))?,
        );
        let envelope = self.seal(&plaintext, password)?;
        write_atomic(output, &envelope).map_err(|e| with_path(e, "write", output))?;
        debug!(output = %output.display(), "wrote sealed secret");
        Ok(())
    }

    /// Read the envelope at `input` and return the plaintext.
    fn unseal_file(&self, input: &Path, password: &str) -> Result<Vec<u8>> {
        let envelope = fs::read(input).map_err(|e| with_path(e, "read", input))?;
        self.unseal(&envelope, password)
    }
}

fn with_path(err: io::Error, action: &str, path: &Path) -> SealError {
    SealError::Io {
        source: io::Error::new(
            err.kind(),
            format!("Failed to {} {}: {}", action, path.display(), err),
        ),
    }
}

/// PBKDF2-HMAC-SHA256 + Fernet cipher with a configurable work factor.
///
/// The work factor only affects sealing; unsealing always honors the
/// iteration count stored in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCipher {
    iterations: u32,
}

impl Default for PasswordCipher {
    fn default() -> Self {
        Self {
            iterations: KDF_ITERATIONS,
        }
    }
}

impl PasswordCipher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cipher that seals with a non-default work factor.
    pub fn with_iterations(iterations: u32) -> Result<Self> {
        if iterations == 0 {
            return Err(SealError::InvalidInput(
                "Iteration count must be positive".to_string(),
            ));
        }
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl SecretCipher for PasswordCipher {
    fn seal(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
        let salt = generate_salt()?;
        let key = derive_key(password, &salt, self.iterations)?;
        let token = seal_token(&key, plaintext)?;
        debug!(iterations = self.iterations, "sealed secret");
        SealedSecret::new(self.iterations, salt.to_vec(), token).to_bytes()
    }

    fn unseal(&self, envelope: &[u8], password: &str) -> Result<Vec<u8>> {
        let sealed = SealedSecret::from_bytes(envelope)?;
        // No key derives from an empty password, so it can never open a token.
        if password.is_empty() {
            return Err(SealError::AuthenticationFailure);
        }
        debug!(iterations = sealed.iterations(), "unsealing secret");
        let key = derive_key(password, sealed.salt(), sealed.iterations())?;
        open_token(&key, sealed.token())
    }
}

/// Seal `plaintext` with the default work factor.
///
/// # Examples
///
/// ```no_run
/// use sealbox_core::{decrypt_bytes, encrypt_bytes};
///
/// let envelope = encrypt_bytes(b"oauth-token", "CorrectAdminPw!").unwrap();
/// let plaintext = decrypt_bytes(&envelope, "CorrectAdminPw!").unwrap();
/// assert_eq!(plaintext, b"oauth-token");
/// ```
pub fn encrypt_bytes(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    PasswordCipher::default().seal(plaintext, password)
}

/// Open an envelope produced by [`encrypt_bytes`] or any earlier work factor.
pub fn decrypt_bytes(envelope: &[u8], password: &str) -> Result<Vec<u8>> {
    PasswordCipher::default().unseal(envelope, password)
}

/// Seal a file; parent directories of `output` are created as needed.
pub fn encrypt_file(input: &Path, output: &Path, password: &str) -> Result<()> {
    PasswordCipher::default().seal_file(input, output, password)
}

/// Unseal a file.
pub fn decrypt_file(input: &Path, password: &str) -> Result<Vec<u8>> {
    PasswordCipher::default().unseal_file(input, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordCipher {
        PasswordCipher::with_iterations(1_000).unwrap()
    }

    fn token_of(envelope: &[u8]) -> String {
        SealedSecret::from_bytes(envelope)
            .unwrap()
            .token()
            .to_string()
    }

    fn replace_token(envelope: &[u8], token: &str) -> Vec<u8> {
        let mut value: serde_json::Value = serde_json::from_slice(envelope).unwrap();
        value["token"] = serde_json::Value::String(token.to_string());
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_concrete_scenario_with_default_work_factor() {
        let envelope = encrypt_bytes(b"hunter2-token-payload", "CorrectAdminPw!").unwrap();

        let value: serde_json::Value = serde_json::from_slice(&envelope).unwrap();
        assert_eq!(value["v"], 1);
        assert_eq!(value["iter"], 390_000);
        assert_eq!(value["salt"].as_str().unwrap().len(), 24);
        assert!(value["token"].as_str().is_some());

        let plaintext = decrypt_bytes(&envelope, "CorrectAdminPw!").unwrap();
        assert_eq!(plaintext, b"hunter2-token-payload");

        let wrong = decrypt_bytes(&envelope, "WrongPw");
        assert!(matches!(wrong, Err(SealError::AuthenticationFailure)));
    }

    #[test]
    fn test_round_trip_various_payloads() {
        let cipher = fast();
        let payloads: [&[u8]; 4] = [b"", b"x", b"{\"token\": \"abc\"}", &[0u8, 255, 7, 128]];
        for payload in payloads {
            let envelope = cipher.seal(payload, "pw").unwrap();
            assert_eq!(cipher.unseal(&envelope, "pw").unwrap(), payload);
        }

        let large = vec![0x42u8; 256 * 1024];
        let envelope = cipher.seal(&large, "pw").unwrap();
        assert_eq!(cipher.unseal(&envelope, "pw").unwrap(), large);
    }

    #[test]
    fn test_salt_and_token_unique_per_seal() {
        let cipher = fast();
        let a = SealedSecret::from_bytes(&cipher.seal(b"same", "pw").unwrap()).unwrap();
        let b = SealedSecret::from_bytes(&cipher.seal(b"same", "pw").unwrap()).unwrap();
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let cipher = fast();
        let envelope = cipher.seal(b"secret", "password-one").unwrap();
        for wrong in ["password-two", "Password-one", "password-one ", "p"] {
            let result = cipher.unseal(&envelope, wrong);
            assert!(matches!(result, Err(SealError::AuthenticationFailure)));
        }
    }

    #[test]
    fn test_empty_password_on_unseal_is_auth_failure() {
        let cipher = fast();
        let envelope = cipher.seal(b"secret", "pw").unwrap();
        assert!(matches!(
            cipher.unseal(&envelope, ""),
            Err(SealError::AuthenticationFailure)
        ));
        assert!(matches!(
            cipher.unseal(b"{\"v\":1}", ""),
            Err(SealError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_every_token_position_is_tamper_evident() {
        let cipher = fast();
        let envelope = cipher.seal(b"secret payload", "pw").unwrap();
        let token = token_of(&envelope);

        for index in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            let result = cipher.unseal(&replace_token(&envelope, &tampered), "pw");
            assert!(
                matches!(result, Err(SealError::AuthenticationFailure)),
                "position {} was not detected",
                index
            );
        }
    }

    #[test]
    fn test_truncated_token_is_authentication_failure() {
        let cipher = fast();
        let envelope = cipher.seal(b"secret", "pw").unwrap();
        let token = token_of(&envelope);
        let truncated = &token[..token.len() - 8];
        let result = cipher.unseal(&replace_token(&envelope, truncated), "pw");
        assert!(matches!(result, Err(SealError::AuthenticationFailure)));
    }

    #[test]
    fn test_malformed_envelope_distinct_from_auth_failure() {
        let cipher = fast();
        let result = cipher.unseal(b"{\"v\": 1, \"iter\": 5}", "pw");
        assert!(matches!(result, Err(SealError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_iteration_portability() {
        let old = PasswordCipher::with_iterations(1_000).unwrap();
        let new = PasswordCipher::with_iterations(2_500).unwrap();

        let envelope = old.seal(b"sealed long ago", "pw").unwrap();
        assert_eq!(new.unseal(&envelope, "pw").unwrap(), b"sealed long ago");

        let resealed = SealedSecret::from_bytes(&new.seal(b"x", "pw").unwrap()).unwrap();
        assert_eq!(resealed.iterations(), 2_500);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(PasswordCipher::with_iterations(0).is_err());
    }

    #[test]
    fn test_envelope_does_not_contain_plaintext() {
        let envelope = fast().seal(b"PLAINTEXT_MARKER_123", "pw").unwrap();
        let text = String::from_utf8(envelope).unwrap();
        assert!(!text.contains("PLAINTEXT_MARKER_123"));
    }
}
