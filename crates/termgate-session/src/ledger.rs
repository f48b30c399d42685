//! The session ledger: a durable trail of every brokered session.
//!
//! Independent of the cache. The cache entry is gone after a minute; the
//! ledger row stays, so "did user X open a terminal to Y at time T" has an
//! answer. The broker inserts rows and reads them back for status queries.
//! It never updates or deletes them.

use std::collections::HashMap;

use async_trait::async_trait;
use termgate_protocol::{SessionId, UserId};
use tokio::sync::RwLock;

use crate::{SessionRecord, StorageError};

#[async_trait]
pub trait SessionLedger: Send + Sync + 'static {
    /// Inserts a new record.
    async fn insert(&self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Returns the record `id` if it belongs to `user_id`.
    async fn find_owned(
        &self,
        user_id: &UserId,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, StorageError>;
}

/// In-memory [`SessionLedger`] for development and tests.
#[derive(Debug, Default)]
pub struct MemorySessionLedger {
    records: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, regardless of owner.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SessionLedger for MemorySessionLedger {
    async fn insert(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            // Mirrors the primary-key violation a SQL ledger would raise.
            return Err(StorageError::new(
                "memory",
                format!("duplicate session id {}", record.id),
            ));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_owned(
        &self,
        user_id: &UserId,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .await
            .get(id)
            .filter(|r| &r.user_id == user_id)
            .cloned())
    }
}
