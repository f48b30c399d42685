//! Error types for the session layer.

use termgate_protocol::ProtocolError;
use termgate_vault::VaultError;

/// Errors that can occur while brokering a terminal session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request is well-formed JSON but semantically unusable: a missing
    /// connection id, or a connection type that can't back a terminal.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The connection or session doesn't exist OR belongs to another user.
    ///
    /// The two cases are indistinguishable. Carrying only the resource
    /// name ("connection", "session") guarantees the message can't
    /// leak which one it was.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A stored secret could not be decrypted.
    #[error(transparent)]
    Decryption(#[from] VaultError),

    /// The caller's token was missing or rejected by the
    /// [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A cache payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A backend (cache, ledger, connection store) failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A failure reported by one of the storage backends.
///
/// Backends live in other crates with their own error types (Redis,
/// Postgres). They box those errors into this one so the broker can stay
/// generic over where its data lives.
#[derive(Debug, thiserror::Error)]
#[error("{backend} backend failed: {source}")]
pub struct StorageError {
    backend: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl StorageError {
    pub fn new(
        backend: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            backend,
            source: source.into(),
        }
    }

    /// Which backend failed ("redis", "postgres", ...).
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_only_the_resource() {
        assert_eq!(SessionError::NotFound("connection").to_string(), "connection not found");
        assert_eq!(SessionError::NotFound("session").to_string(), "session not found");
    }

    #[test]
    fn test_from_vault_error() {
        let err: SessionError = VaultError::Decryption.into();
        assert!(matches!(err, SessionError::Decryption(_)));
        assert_eq!(err.to_string(), "failed to decrypt stored secret");
    }

    #[test]
    fn test_storage_error_display_and_backend() {
        let err = StorageError::new("redis", "connection refused");
        assert_eq!(err.backend(), "redis");
        assert_eq!(err.to_string(), "redis backend failed: connection refused");
        let session_err: SessionError = err.into();
        assert!(matches!(session_err, SessionError::Storage(_)));
    }
}
