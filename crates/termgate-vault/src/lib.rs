//! Credential vault for termgate.
//!
//! Connection secrets (passwords, private keys) are stored encrypted. This
//! crate is the only code that knows how:
//!
//! - [`EncryptionKey`]: the 32-byte AES-256 key, built once at startup
//!   from the deployment secret.
//! - [`CredentialVault`]: `encrypt` / `decrypt` between plaintext and the
//!   stored form `base64(iv || ciphertext)`.
//! - [`VaultError`]: what can go wrong.
//!
//! # Stored format
//!
//! ```text
//! base64( iv[16] || AES-256-CBC(PKCS#7(plaintext)) )
//! ```
//!
//! Every call to `encrypt` uses a fresh random IV, so encrypting the same
//! secret twice yields different stored strings.
//!
//! There is no key versioning. Changing the deployment secret makes every
//! previously stored secret undecryptable.

mod cipher;
mod error;
mod key;

pub use cipher::CredentialVault;
pub use error::VaultError;
pub use key::EncryptionKey;
