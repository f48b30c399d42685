//! Error types for the storage backends.

use termgate_protocol::ProtocolError;
use termgate_session::{SessionError, StorageError};

/// Errors raised by the Redis and Postgres backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "postgres")]
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored row holds a value the domain types reject, e.g. a port
    /// outside `1..=65535` or an unknown status string.
    #[error("invalid {column} in stored row: {reason}")]
    InvalidRow {
        column: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl StoreError {
    /// The backend name reported in [`StorageError`].
    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "redis")]
            StoreError::Redis(_) => "redis",
            #[cfg(feature = "postgres")]
            StoreError::Database(_) | StoreError::Migrate(_) => "postgres",
            StoreError::InvalidRow { .. } => "postgres",
            StoreError::Protocol(_) => "codec",
        }
    }
}

impl From<StoreError> for StorageError {
    fn from(err: StoreError) -> Self {
        StorageError::new(err.backend(), err)
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            // Codec failures keep their own variant so callers can tell a
            // corrupt payload from an unreachable server.
            StoreError::Protocol(e) => SessionError::Protocol(e),
            other => SessionError::Storage(other.into()),
        }
    }
}
