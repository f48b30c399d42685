//! The session cache: where one-time payloads wait for their consumer.
//!
//! # Contract
//!
//! - `put` stores a payload under `terminal_session:{id}` with a TTL.
//! - After the TTL the entry is gone, whether or not anyone read it.
//!   Expiry is the backend's job (Redis `EX`, or a deadline check here).
//! - `take` reads AND deletes in one step. Only the external consumer
//!   should call it; the broker never does.
//!
//! The broker writes once and never reads back, so the plaintext secrets
//! in the payload are reachable only through this cache, only for the TTL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use termgate_protocol::{cache_key, Codec, JsonCodec, SessionId, SessionPayload};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{SessionError, StorageError};

/// A time-bounded key-value store for session payloads.
#[async_trait]
pub trait SessionCache: Send + Sync + 'static {
    /// Stores `payload` for `session_id`, expiring after `ttl`.
    async fn put(
        &self,
        session_id: &SessionId,
        payload: &SessionPayload,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    /// Reads the payload without consuming it. `None` once expired.
    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionPayload>, SessionError>;

    /// Reads and deletes the payload atomically. `None` if already taken
    /// or expired.
    async fn take(&self, session_id: &SessionId) -> Result<Option<SessionPayload>, SessionError>;
}

struct CacheEntry {
    bytes: Vec<u8>,
    deadline: Instant,
}

/// In-memory [`SessionCache`] for development and tests.
///
/// Payloads are stored encoded, exactly as they would be in Redis, so a
/// payload that can't round-trip through the codec fails here too.
///
/// Deadlines use `tokio::time::Instant`, which means tests can pause the
/// clock and `tokio::time::advance` past the TTL instead of sleeping.
///
/// Every `put` first drops the entries whose deadline has passed, so
/// unconsumed payloads don't outlive their TTL by more than one write.
pub struct MemorySessionCache<C: Codec = JsonCodec> {
    entries: Mutex<HashMap<String, CacheEntry>>,
    codec: C,
}

impl MemorySessionCache<JsonCodec> {
    pub fn new() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl Default for MemorySessionCache<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> MemorySessionCache<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            codec,
        }
    }

    /// Drops every expired entry. Returns how many were removed.
    ///
    /// Reads already ignore expired entries. This only reclaims memory.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.deadline > now);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl<C: Codec> SessionCache for MemorySessionCache<C> {
    async fn put(
        &self,
        session_id: &SessionId,
        payload: &SessionPayload,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let bytes = self.codec.encode(payload)?;
        let now = Instant::now();
        let deadline = now.checked_add(ttl).ok_or_else(|| {
            StorageError::new("memory", format!("session ttl {ttl:?} is out of range"))
        })?;

        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.deadline > now);
        entries.insert(cache_key(session_id), CacheEntry { bytes, deadline });
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionPayload>, SessionError> {
        let key = cache_key(session_id);
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get(&key) else {
            return Ok(None);
        };
        if entry.deadline > Instant::now() {
            return Ok(Some(self.codec.decode(&entry.bytes)?));
        }
        entries.remove(&key);
        Ok(None)
    }

    async fn take(&self, session_id: &SessionId) -> Result<Option<SessionPayload>, SessionError> {
        let removed = self.entries.lock().await.remove(&cache_key(session_id));
        match removed {
            Some(entry) if entry.deadline > Instant::now() => {
                Ok(Some(self.codec.decode(&entry.bytes)?))
            }
            _ => Ok(None),
        }
    }
}
