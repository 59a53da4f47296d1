//! Versioned on-disk envelope for sealed secrets.
//!
//! ```json
//! {
//!   "v": 1,
//!   "iter": 390000,
//!   "salt": "<base64url, 16 raw bytes>",
//!   "token": "<Fernet token>"
//! }
//! ```
//!
//! An envelope is immutable: rotating a secret writes a new envelope with a
//! fresh salt.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::SALT_LENGTH;
use crate::error::{Result, SealError};

/// Padded urlsafe base64 on encode; accepts padded or bare input on decode.
const SALT_ENCODING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Serialize, Deserialize)]
struct EnvelopeRecord {
    v: u32,
    iter: u32,
    salt: String,
    token: String,
}

#[derive(Deserialize)]
struct VersionHeader {
    v: u32,
}

/// A sealed secret as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    version: u32,
    iterations: u32,
    salt: Vec<u8>,
    token: String,
}

impl SealedSecret {
    /// Envelope format written by this version of the library.
    pub const CURRENT_VERSION: u32 = 1;

    /// Build a current-version envelope.
    pub fn new(iterations: u32, salt: Vec<u8>, token: String) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            iterations,
            salt,
            token,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// KDF rounds used to seal this envelope.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Salt in its stored text form.
    pub fn salt_text(&self) -> String {
        SALT_ENCODING.encode(&self.salt)
    }

    /// Serialize as pretty-printed UTF-8 JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let record = EnvelopeRecord {
            v: self.version,
            iter: self.iterations,
            salt: self.salt_text(),
            token: self.token.clone(),
        };
        serde_json::to_vec_pretty(&record)
            .map_err(|e| SealError::Crypto(format!("Failed to serialize envelope: {}", e)))
    }

    /// Parse an envelope.
    ///
    /// # Errors
    ///
    /// - [`SealError::UnsupportedEnvelopeVersion`] if `v` is not a version
    ///   this library reads (checked before the other fields)
    /// - [`SealError::MalformedEnvelope`] for any missing or undecodable field
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| SealError::MalformedEnvelope("envelope is not UTF-8".to_string()))?;

        let header: VersionHeader = serde_json::from_str(text)
            .map_err(|e| SealError::MalformedEnvelope(e.to_string()))?;
        if header.v != Self::CURRENT_VERSION {
            return Err(SealError::UnsupportedEnvelopeVersion(header.v));
        }

        let record: EnvelopeRecord = serde_json::from_str(text)
            .map_err(|e| SealError::MalformedEnvelope(e.to_string()))?;

        if record.iter == 0 {
            return Err(SealError::MalformedEnvelope(
                "iteration count must be positive".to_string(),
            ));
        }

        let salt = SALT_ENCODING
            .decode(record.salt.as_bytes())
            .map_err(|e| SealError::MalformedEnvelope(format!("salt is not base64url: {}", e)))?;
        if salt.len() < SALT_LENGTH {
            return Err(SealError::MalformedEnvelope(format!(
                "salt must be at least {} bytes (got {})",
                SALT_LENGTH,
                salt.len()
            )));
        }

        // Token contents are judged by the cipher alone.
        Ok(Self {
            version: record.v,
            iterations: record.iter,
            salt,
            token: record.token,
        })
    }
}
