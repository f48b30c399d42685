//! Core wire types for termgate.
//!
//! Everything here is either an identifier shared across crates or a
//! structure that gets serialized: into the session cache, into an HTTP
//! response, or out of an HTTP request body.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The account that owns connections and sessions.
///
/// A newtype over the upstream user identifier. Wrapping it means a
/// `ConnectionId` can never be passed where a `UserId` is expected, which
/// matters here because every lookup is filtered by BOTH.
///
/// `#[serde(transparent)]` keeps the JSON form a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored ssh/sftp (or other) connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one terminal session.
///
/// Always a random (v4) UUID: 122 bits of randomness, so a session id is
/// unguessable and collisions are not a practical concern. The same value
/// is the suffix of the cache key and the primary key of the ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hyphenated lowercase, the form that appears in URLs and cache keys.
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SessionId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ProtocolError::InvalidIdentifier(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Cache protocol
// ---------------------------------------------------------------------------

/// Prefix of every session cache key.
pub const CACHE_KEY_PREFIX: &str = "terminal_session:";

/// Returns the cache key for a session: `terminal_session:{id}`.
pub fn cache_key(session_id: &SessionId) -> String {
    format!("{CACHE_KEY_PREFIX}{session_id}")
}

// ---------------------------------------------------------------------------
// ConnectionKind
// ---------------------------------------------------------------------------

/// What protocol a stored connection speaks.
///
/// Only `Ssh` and `Sftp` can back a terminal session. Anything else the
/// upstream app stores (rdp, vnc, ...) is kept verbatim in `Other` so that
/// a row never fails to load just because we don't know its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionKind {
    Ssh,
    Sftp,
    Other(String),
}

impl ConnectionKind {
    /// Returns `true` if a terminal session may be opened for this kind.
    pub fn supports_terminal(&self) -> bool {
        matches!(self, Self::Ssh | Self::Sftp)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ssh => "ssh",
            Self::Sftp => "sftp",
            Self::Other(other) => other.as_str(),
        }
    }
}

impl From<&str> for ConnectionKind {
    fn from(value: &str) -> Self {
        match value {
            "ssh" => Self::Ssh,
            "sftp" => Self::Sftp,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for ConnectionKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ConnectionKind> for String {
    fn from(kind: ConnectionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionPayload: the one-time credential handoff
// ---------------------------------------------------------------------------

/// The decrypted credential bundle handed to the collaboration server.
///
/// This is the ONLY place plaintext secrets exist outside the vault. It is
/// written once to the session cache and read at most once by the
/// consumer. It is never sent back to the HTTP client.
///
/// Absent secrets are left out of the JSON entirely (not `null`), which is
/// what the consumer expects.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// Hand-written so that `{:?}` in a log line can never leak a secret.
impl fmt::Debug for SessionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPayload")
            .field("user_id", &self.user_id)
            .field("connection_id", &self.connection_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// What the HTTP client learns about the connection it opened.
///
/// Deliberately has no credential fields at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSummary {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Nominal status of a session in the ledger.
///
/// ```text
/// Pending ──(consumer reads cache entry)──→ Consumed
///    └──────(TTL elapses unconsumed)──────→ Expired
/// ```
///
/// The broker only ever writes `Pending`. The other two states belong to
/// the ledger's contract with the external consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Consumed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Consumed => "consumed",
            Self::Expired => "expired",
        }
    }

    /// Returns `true` once the session can no longer be used.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "consumed" => Ok(Self::Consumed),
            "expired" => Ok(Self::Expired),
            other => Err(ProtocolError::UnknownStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP bodies
// ---------------------------------------------------------------------------

/// Body of `POST /terminal/sessions`.
///
/// `connection_id` is optional at the serde level so that a missing field
/// becomes a validation error with a useful message instead of a generic
/// deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub connection_id: Option<String>,
}

/// `201` response of `POST /terminal/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
    pub ws_url: String,
    pub connection: ConnectionSummary,
}

/// `200` response of `GET /terminal/sessions/{id}`: metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub id: SessionId,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Error envelope returned for every non-2xx response.
///
/// ```json
/// { "error": { "code": 404, "message": "connection not found" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
