//! Error types for the protocol layer.
//!
//! Each termgate crate defines its own error enum. A `ProtocolError` always
//! means something went wrong turning values into bytes (or back), or an
//! identifier arrived in a shape we can't accept.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: a cache entry written by an older build, a truncated
    /// value, or a payload that is missing a required field.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A stored enum value is not one we know about.
    #[error("unknown session status: {0}")]
    UnknownStatus(String),
}
