//! Ed25519 plugin keys and plugin identifiers.
//!
//! Private keys are stored as text: the hex-encoded 32-byte secret seed.
//! Plugin identifiers are derived from the public key, so re-signing with the
//! same key keeps the identifier stable across releases.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::PackerError;

const SECRET_KEY_LENGTH: usize = 32;
const ID_BYTES: usize = 16;

/// A plugin signing key
pub struct PluginKey {
    signing_key: SigningKey,
}

impl PluginKey {
    /// Generate a new random key.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Parse key text (hex-encoded 32-byte seed, surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`PackerError::InvalidKey`] if the text is not hex or not 32 bytes.
    pub fn from_text(text: &str) -> Result<Self, PackerError> {
        let bytes = Zeroizing::new(
            hex::decode(text.trim()).map_err(|e| PackerError::InvalidKey(e.to_string()))?,
        );
        let secret: Zeroizing<[u8; SECRET_KEY_LENGTH]> =
            Zeroizing::new(bytes.as_slice().try_into().map_err(|_| {
                PackerError::InvalidKey(format!(
                    "expected {} bytes, got {}",
                    SECRET_KEY_LENGTH,
                    bytes.len()
                ))
            })?);

        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    /// Key text suitable for a `.ppk` file
    #[must_use]
    pub fn to_text(&self) -> String {
        let secret = Zeroizing::new(self.signing_key.to_bytes());
        hex::encode(secret.as_slice())
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key().to_bytes()
    }

    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Identifier of plugins signed with this key
    #[must_use]
    pub fn plugin_id(&self) -> String {
        plugin_id(&self.public_key_bytes())
    }
}

/// Derive the plugin identifier from a public key.
///
/// The first 16 bytes of SHA-256(public key), with each hex nibble written as
/// a letter `a`..=`p`.
#[must_use]
pub fn plugin_id(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    digest
        .iter()
        .take(ID_BYTES)
        .flat_map(|byte| [byte >> 4, byte & 0x0f])
        .map(|nibble| char::from(b'a' + nibble))
        .collect()
}
