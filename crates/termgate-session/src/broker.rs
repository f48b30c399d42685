//! The session broker: turns "user U wants a terminal on connection C" into
//! a one-time credential handoff.
//!
//! ## Flow of `create_session`
//!
//! ```text
//! find_owned(U, C) ──→ kind check ──→ decrypt secrets ──→ new SessionId
//!        │                  │               │                   │
//!    NotFound          Validation       Decryption              ▼
//!                                                 cache.put(payload, TTL)
//!                                                               │
//!                                                               ▼
//!                                                 ledger.insert(Pending)
//!                                                               │
//!                                                               ▼
//!                                          touch_last_used (best-effort)
//!                                                               │
//!                                                               ▼
//!                                              SessionTicket { ws_url, .. }
//! ```
//!
//! # Consistency note
//!
//! The cache write and the ledger write are two independent operations
//! against two independent stores. There is no transaction spanning them.
//! If the ledger insert fails after the cache write succeeded, the request
//! fails, but the cache entry stays usable until its TTL runs out, and it
//! has no audit record. That gap is accepted; it is logged, not repaired.
//!
//! The `last_used_at` touch is weaker still: best-effort, and a failure
//! there doesn't even fail the request.

use std::sync::Arc;

use chrono::Utc;
use termgate_protocol::{ConnectionId, SessionId, SessionPayload, UserId};
use termgate_vault::CredentialVault;

use crate::{
    BrokerConfig, ConnectionRepository, SessionCache, SessionError, SessionLedger,
    SessionRecord, SessionTicket,
};

/// Creates and looks up terminal sessions.
///
/// Holds only shared handles to its collaborators, so one broker serves
/// every request concurrently without any locking of its own.
pub struct SessionBroker {
    config: BrokerConfig,
    vault: CredentialVault,
    connections: Arc<dyn ConnectionRepository>,
    cache: Arc<dyn SessionCache>,
    ledger: Arc<dyn SessionLedger>,
}

impl SessionBroker {
    pub fn new(
        config: BrokerConfig,
        vault: CredentialVault,
        connections: Arc<dyn ConnectionRepository>,
        cache: Arc<dyn SessionCache>,
        ledger: Arc<dyn SessionLedger>,
    ) -> Self {
        Self {
            config,
            vault,
            connections,
            cache,
            ledger,
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Brokers a new terminal session for `user_id` on `connection_id`.
    ///
    /// # Errors
    /// - [`SessionError::Validation`]: blank connection id, or the
    ///   connection isn't ssh/sftp.
    /// - [`SessionError::NotFound`]: no such connection for this user.
    /// - [`SessionError::Decryption`]: a stored secret is unreadable.
    /// - [`SessionError::Storage`] / [`SessionError::Protocol`]: the cache
    ///   or ledger write failed.
    pub async fn create_session(
        &self,
        user_id: &UserId,
        connection_id: &ConnectionId,
    ) -> Result<SessionTicket, SessionError> {
        if connection_id.as_str().trim().is_empty() {
            return Err(SessionError::Validation("connection_id is required".into()));
        }

        let connection = self
            .connections
            .find_owned(user_id, connection_id)
            .await?
            .ok_or(SessionError::NotFound("connection"))?;

        if !connection.kind.supports_terminal() {
            return Err(SessionError::Validation(format!(
                "connection type '{}' does not support terminal sessions",
                connection.kind
            )));
        }

        let decrypted = self
            .vault
            .decrypt_optional(connection.encrypted_password.as_deref())
            .and_then(|password| {
                let private_key = self
                    .vault
                    .decrypt_optional(connection.encrypted_private_key.as_deref())?;
                Ok((password, private_key))
            });
        let (password, private_key) = match decrypted {
            Ok(secrets) => secrets,
            Err(e) => {
                tracing::warn!(
                    %user_id, %connection_id,
                    "stored credentials could not be decrypted"
                );
                return Err(e.into());
            }
        };

        let session_id = SessionId::generate();
        let payload = SessionPayload {
            user_id: user_id.clone(),
            connection_id: connection.id.clone(),
            host: connection.host.clone(),
            port: connection.port,
            username: connection.username.clone(),
            password,
            private_key,
        };

        // The single point where decrypted credentials leave this process.
        self.cache
            .put(&session_id, &payload, self.config.session_ttl)
            .await?;
        drop(payload);

        let record = SessionRecord::pending(
            session_id,
            user_id.clone(),
            connection.id.clone(),
            Utc::now(),
            self.config.session_ttl,
        );
        if let Err(e) = self.ledger.insert(&record).await {
            tracing::error!(
                %user_id, %session_id, error = %e,
                "ledger insert failed after cache write; session has no audit record"
            );
            return Err(e.into());
        }

        if let Err(e) = self
            .connections
            .touch_last_used(&connection.id, record.created_at)
            .await
        {
            tracing::warn!(%connection_id, error = %e, "failed to update last_used_at");
        }

        tracing::info!(
            %user_id, %connection_id, %session_id,
            kind = %connection.kind,
            "terminal session created"
        );

        Ok(SessionTicket {
            session_id,
            ws_url: self.config.ws_url(&session_id),
            connection: connection.summary(),
        })
    }

    /// Looks up the ledger record of a session owned by `user_id`.
    ///
    /// Never touches the cache, so it can't reveal the payload.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the session doesn't exist or
    /// belongs to another user.
    pub async fn get_status(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<SessionRecord, SessionError> {
        let record = self
            .ledger
            .find_owned(user_id, session_id)
            .await?
            .ok_or(SessionError::NotFound("session"))?;

        tracing::debug!(%user_id, %session_id, status = %record.status, "session status read");
        Ok(record)
    }
}

// =========================================================================
// Tests
// =========================================================================
