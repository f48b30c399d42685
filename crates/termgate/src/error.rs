//! Unified error type for termgate, and its HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use termgate_protocol::{ErrorEnvelope, ProtocolError};
use termgate_session::SessionError;
use termgate_store::StoreError;
use termgate_vault::VaultError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates `From` impls, so `?`
/// converts sub-crate errors automatically. Handlers return it directly:
/// its [`IntoResponse`] impl picks the status and writes the
/// `{"error": {"code", "message"}}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum TermgateError {
    /// Encoding or decoding a payload failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The encryption key is unusable.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Brokering failed (validation, ownership, decryption, storage, auth).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A backend could not be opened or migrated.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body wasn't valid JSON for the endpoint.
    #[error("malformed request body: {0}")]
    BadRequest(String),

    /// The server was assembled without something it needs.
    #[error("configuration error: {0}")]
    Config(String),

    /// Binding or serving the listener failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TermgateError {
    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TermgateError::BadRequest(_) => StatusCode::BAD_REQUEST,
            TermgateError::Session(e) => match e {
                SessionError::Validation(_) => StatusCode::BAD_REQUEST,
                SessionError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
                SessionError::NotFound(_) => StatusCode::NOT_FOUND,
                SessionError::Decryption(_)
                | SessionError::Protocol(_)
                | SessionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client.
    ///
    /// Server-side failures get a fixed message; their details stay in the
    /// log.
    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "internal server error".to_string(),
            StatusCode::UNAUTHORIZED => "unauthorized".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for TermgateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = ErrorEnvelope::new(status.as_u16(), self.public_message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use termgate_session::StorageError;

    use super::*;

    #[test]
    fn test_from_session_error() {
        let err: TermgateError = SessionError::NotFound("connection").into();
        assert!(matches!(err, TermgateError::Session(_)));
        assert_eq!(err.to_string(), "connection not found");
    }

    #[test]
    fn test_from_protocol_error() {
        let err: TermgateError = ProtocolError::InvalidIdentifier("x".into()).into();
        assert!(matches!(err, TermgateError::Protocol(_)));
    }

    #[test]
    fn test_status_code_mapping() {
        let cases: Vec<(TermgateError, StatusCode)> = vec![
            (SessionError::Validation("bad".into()).into(), StatusCode::BAD_REQUEST),
            (TermgateError::BadRequest("eof".into()), StatusCode::BAD_REQUEST),
            (SessionError::AuthFailed("nope".into()).into(), StatusCode::UNAUTHORIZED),
            (SessionError::NotFound("session").into(), StatusCode::NOT_FOUND),
            (
                SessionError::Decryption(VaultError::Decryption).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                SessionError::Storage(StorageError::new("redis", "down")).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                TermgateError::Config("no key".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{err}");
        }
    }

    #[test]
    fn test_public_message_hides_server_errors() {
        let err: TermgateError =
            SessionError::Storage(StorageError::new("postgres", "password auth failed")).into();
        assert_eq!(err.public_message(), "internal server error");

        let err: TermgateError = SessionError::Validation("connection_id is required".into()).into();
        assert_eq!(err.public_message(), "validation failed: connection_id is required");
    }

    #[test]
    fn test_public_message_hides_auth_reason() {
        let err: TermgateError = SessionError::AuthFailed("unknown token".into()).into();
        assert_eq!(err.public_message(), "unauthorized");
    }
}
