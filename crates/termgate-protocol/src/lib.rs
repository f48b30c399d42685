//! Wire protocol for termgate.
//!
//! This crate defines everything that crosses a process boundary:
//!
//! - **Identifiers** ([`UserId`], [`ConnectionId`], [`SessionId`]) shared by
//!   every other layer.
//! - **Types** ([`SessionPayload`], [`ConnectionSummary`], the HTTP request
//!   and response bodies) that get serialized to JSON.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how payloads are turned
//!   into the bytes stored in the session cache.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! HTTP client ──(CreateSessionRequest)──→ termgate ──→ broker
//!                                                         │
//!                       cache ←──(SessionPayload bytes)───┘
//!                         │
//!                         └──→ collaboration server (consumes once)
//! ```
//!
//! The protocol layer knows nothing about storage or HTTP routing. It only
//! knows the shapes of the messages and how to encode them.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    cache_key, ConnectionId, ConnectionKind, ConnectionSummary,
    CreateSessionRequest, CreateSessionResponse, ErrorBody, ErrorEnvelope,
    SessionId, SessionPayload, SessionStatus, SessionStatusResponse, UserId,
    CACHE_KEY_PREFIX,
};
