//! Stored connections and the repository the broker reads them from.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use termgate_protocol::{ConnectionId, ConnectionKind, ConnectionSummary, UserId};
use tokio::sync::RwLock;

use crate::StorageError;

/// A stored connection, secrets still encrypted.
///
/// Owned by the upstream application. The broker only reads it and bumps
/// `last_used_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub name: String,
    pub kind: ConnectionKind,
    pub host: String,
    pub port: u16,
    pub username: String,
    /// `base64(iv || ciphertext)` as produced by the vault.
    pub encrypted_password: Option<String>,
    /// Same format as `encrypted_password`.
    pub encrypted_private_key: Option<String>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Connection {
    /// The redacted view returned to HTTP clients.
    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            name: self.name.clone(),
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
        }
    }
}

/// Read access to stored connections, always scoped to an owner.
///
/// There is no "find by id" without a user. The ownership filter is part
/// of the query, so a foreign connection looks exactly like a missing one.
#[async_trait]
pub trait ConnectionRepository: Send + Sync + 'static {
    /// Returns the connection `id` if it is owned by `user_id`.
    async fn find_owned(
        &self,
        user_id: &UserId,
        id: &ConnectionId,
    ) -> Result<Option<Connection>, StorageError>;

    /// Records that the connection was just used.
    async fn touch_last_used(
        &self,
        id: &ConnectionId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// In-memory [`ConnectionRepository`] for development and tests.
#[derive(Debug, Default)]
pub struct MemoryConnectionRepository {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl MemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a connection.
    pub async fn insert(&self, connection: Connection) {
        self.connections
            .write()
            .await
            .insert(connection.id.clone(), connection);
    }

    /// Returns a connection regardless of owner. Test/inspection helper.
    pub async fn get(&self, id: &ConnectionId) -> Option<Connection> {
        self.connections.read().await.get(id).cloned()
    }
}

#[async_trait]
impl ConnectionRepository for MemoryConnectionRepository {
    async fn find_owned(
        &self,
        user_id: &UserId,
        id: &ConnectionId,
    ) -> Result<Option<Connection>, StorageError> {
        Ok(self
            .connections
            .read()
            .await
            .get(id)
            .filter(|c| &c.user_id == user_id)
            .cloned())
    }

    async fn touch_last_used(
        &self,
        id: &ConnectionId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if let Some(connection) = self.connections.write().await.get_mut(id) {
            connection.last_used_at = Some(at);
        }
        Ok(())
    }
}
