//! Session types: configuration, the ledger record, and the ticket handed
//! back to the caller.

use std::time::Duration;

use chrono::{DateTime, Utc};
use termgate_protocol::{ConnectionId, ConnectionSummary, SessionId, SessionStatus, UserId};

// ---------------------------------------------------------------------------
// BrokerConfig
// ---------------------------------------------------------------------------

/// Process-wide settings for the broker, injected at construction.
///
/// Nothing inside the broker reads the environment. The binary resolves
/// flags and env vars once and passes the result in here.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Base URL of the collaboration server, e.g. `ws://collaboration:1234`.
    /// Session URLs are `{collab_base_url}/terminal/{session_id}`.
    pub collab_base_url: String,

    /// How long a session payload lives in the cache before it expires
    /// unconsumed. Also the distance between `created_at` and `expires_at`
    /// in the ledger.
    ///
    /// Default: 60 seconds.
    pub session_ttl: Duration,
}

impl BrokerConfig {
    pub fn new(collab_base_url: impl Into<String>) -> Self {
        Self {
            collab_base_url: collab_base_url.into(),
            ..Self::default()
        }
    }

    /// The WebSocket URL the collaboration server answers for a session.
    pub fn ws_url(&self, session_id: &SessionId) -> String {
        format!(
            "{}/terminal/{session_id}",
            self.collab_base_url.trim_end_matches('/')
        )
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            collab_base_url: "ws://localhost:1234".to_string(),
            session_ttl: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// The durable ledger row for one session.
///
/// Created as [`SessionStatus::Pending`] when the session is brokered. The
/// broker never updates or deletes it. Cleanup and any later status
/// transition belong to whoever owns the ledger's other side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Builds a fresh `Pending` record that expires `ttl` after `now`.
    pub fn pending(
        id: SessionId,
        user_id: UserId,
        connection_id: ConnectionId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        // chrono can't represent every std Duration; anything that large
        // is a misconfiguration, so saturate instead of failing the request.
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            id,
            user_id,
            connection_id,
            status: SessionStatus::Pending,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionTicket
// ---------------------------------------------------------------------------

/// What a successful `create_session` returns to the caller.
///
/// Contains everything the client needs to connect and nothing secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    pub session_id: SessionId,
    pub ws_url: String,
    pub connection: ConnectionSummary,
}
