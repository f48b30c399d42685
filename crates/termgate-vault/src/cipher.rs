//! AES-256-CBC encryption of stored secrets.

use std::fmt;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;

use crate::{EncryptionKey, VaultError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Length of the CBC initialization vector (one AES block).
const IV_LEN: usize = 16;

/// Encrypts and decrypts connection secrets with the deployment key.
///
/// Stateless apart from the key, so it is cheap to clone and safe to share
/// between request tasks.
///
/// # Example
///
/// ```rust
/// use termgate_vault::{CredentialVault, EncryptionKey};
///
/// let vault = CredentialVault::new(EncryptionKey::from_secret("dev secret")?);
/// let stored = vault.encrypt("hunter2");
/// assert_eq!(vault.decrypt(&stored)?, "hunter2");
/// # Ok::<(), termgate_vault::VaultError>(())
/// ```
#[derive(Clone)]
pub struct CredentialVault {
    key: EncryptionKey,
}

impl CredentialVault {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Encrypts `plaintext` under a fresh random IV.
    ///
    /// Returns `base64(iv || ciphertext)`.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let iv: [u8; IV_LEN] = rand::rng().random();
        self.encrypt_with_iv(plaintext, &iv)
    }

    fn encrypt_with_iv(&self, plaintext: &str, iv: &[u8; IV_LEN]) -> String {
        let key = *self.key.as_bytes();
        let ciphertext = Aes256CbcEnc::new(&key.into(), &(*iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut stored = Vec::with_capacity(IV_LEN + ciphertext.len());
        stored.extend_from_slice(iv);
        stored.extend_from_slice(&ciphertext);
        STANDARD.encode(stored)
    }

    /// Decrypts a value produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    /// Returns [`VaultError::Decryption`] if the value isn't valid base64,
    /// is too short to hold an IV and one block, isn't block-aligned, fails
    /// the padding check (wrong key, tampering), or decrypts to something
    /// that isn't UTF-8.
    pub fn decrypt(&self, stored: &str) -> Result<String, VaultError> {
        let raw = STANDARD.decode(stored.trim()).map_err(|_| VaultError::Decryption)?;

        // At least the IV plus one full block of ciphertext.
        if raw.len() < IV_LEN * 2 || raw.len() % IV_LEN != 0 {
            return Err(VaultError::Decryption);
        }
        let (iv, ciphertext) = raw.split_at(IV_LEN);

        let plaintext = Aes256CbcDec::new_from_slices(self.key.as_bytes(), iv)
            .map_err(|_| VaultError::Decryption)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| {
                tracing::debug!("secret failed the padding check");
                VaultError::Decryption
            })?;

        String::from_utf8(plaintext).map_err(|_| VaultError::Decryption)
    }

    /// Decrypts an optional stored value, passing `None` through.
    pub fn decrypt_optional(&self, stored: Option<&str>) -> Result<Option<String>, VaultError> {
        stored.map(|value| self.decrypt(value)).transpose()
    }
}

impl fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVault").field("key", &self.key).finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
