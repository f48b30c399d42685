//! Error types for the vault.

/// Errors that can occur while building a key or decrypting a secret.
///
/// `Decryption` intentionally carries no detail. Whether the base64 was
/// bad, the padding didn't check out, or the key was wrong, callers (and
/// ultimately HTTP clients) see the same thing. Distinguishing those cases
/// would hand an attacker a padding oracle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    /// The deployment secret can't be turned into an AES-256 key.
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    /// The stored value could not be decrypted.
    #[error("failed to decrypt stored secret")]
    Decryption,
}
