//! The deployment encryption key.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use crate::VaultError;

/// Length of an AES-256 key in bytes.
pub(crate) const KEY_LEN: usize = 32;

/// Prefix marking a secret that already IS the raw key, base64-encoded.
const BASE64_PREFIX: &str = "base64:";

/// A 32-byte AES-256 key.
///
/// Built once at startup and injected into the [`CredentialVault`]. Two
/// forms of deployment secret are accepted:
///
/// - `base64:<data>`: `<data>` must decode to exactly 32 bytes, which
///   are used verbatim. Use this for generated keys.
/// - anything else: treated as a passphrase and hashed with SHA-256.
///
/// `Debug` never prints the key bytes.
///
/// [`CredentialVault`]: crate::CredentialVault
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Builds a key from the deployment secret.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidKey`] if the secret is empty, or if a
    /// `base64:` secret is not valid base64 or doesn't decode to 32 bytes.
    pub fn from_secret(secret: &str) -> Result<Self, VaultError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(VaultError::InvalidKey("secret is empty".into()));
        }

        if let Some(encoded) = secret.strip_prefix(BASE64_PREFIX) {
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| VaultError::InvalidKey(format!("bad base64: {e}")))?;
            let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
                VaultError::InvalidKey(format!(
                    "expected {KEY_LEN} bytes, got {}",
                    b.len()
                ))
            })?;
            return Ok(Self(key));
        }

        let digest: [u8; KEY_LEN] = Sha256::digest(secret.as_bytes()).into();
        Ok(Self(digest))
    }

    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generates a random key, printed in the `base64:` form operators
    /// paste into configuration.
    pub fn generate() -> (Self, String) {
        use rand::Rng;
        let bytes: [u8; KEY_LEN] = rand::rng().random();
        let encoded = format!("{BASE64_PREFIX}{}", STANDARD.encode(bytes));
        (Self(bytes), encoded)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_secret_empty_is_rejected() {
        assert!(matches!(
            EncryptionKey::from_secret("   "),
            Err(VaultError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_from_secret_passphrase_is_hashed_deterministically() {
        let a = EncryptionKey::from_secret("correct horse").unwrap();
        let b = EncryptionKey::from_secret("correct horse").unwrap();
        let c = EncryptionKey::from_secret("battery staple").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_secret_base64_uses_bytes_verbatim() {
        let raw = [7u8; KEY_LEN];
        let secret = format!("base64:{}", STANDARD.encode(raw));
        let key = EncryptionKey::from_secret(&secret).unwrap();
        assert_eq!(key.as_bytes(), &raw);
    }

    #[test]
    fn test_from_secret_base64_wrong_length_is_rejected() {
        let secret = format!("base64:{}", STANDARD.encode([1u8; 16]));
        let err = EncryptionKey::from_secret(&secret).unwrap_err();
        assert!(matches!(err, VaultError::InvalidKey(msg) if msg.contains("got 16")));
    }

    #[test]
    fn test_from_secret_base64_garbage_is_rejected() {
        assert!(matches!(
            EncryptionKey::from_secret("base64:!!!"),
            Err(VaultError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_generate_round_trips_through_from_secret() {
        let (key, encoded) = EncryptionKey::generate();
        assert!(encoded.starts_with("base64:"));
        assert_eq!(EncryptionKey::from_secret(&encoded).unwrap(), key);
    }

    #[test]
    fn test_debug_hides_key_material() {
        let key = EncryptionKey::from_bytes([0xAB; KEY_LEN]);
        let rendered = format!("{key:?}");
        assert_eq!(rendered, "EncryptionKey(<redacted>)");
    }
}
