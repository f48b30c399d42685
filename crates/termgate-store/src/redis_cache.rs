//! Redis-backed [`SessionCache`].
//!
//! Each payload is one string key, `terminal_session:{id}`, holding the
//! codec's bytes (JSON by default), written with `SET .. EX`. The
//! collaboration server reads the same key, so the key format and value
//! encoding are a cross-process contract.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use termgate_protocol::{cache_key, Codec, JsonCodec, SessionId, SessionPayload};
use termgate_session::{SessionCache, SessionError};

use crate::StoreError;

/// A [`SessionCache`] on top of a multiplexed Redis connection.
///
/// The connection is cheap to clone and safe to share, so one cache serves
/// every request task.
#[derive(Clone)]
pub struct RedisSessionCache<C: Codec = JsonCodec> {
    conn: MultiplexedConnection,
    codec: C,
}

impl RedisSessionCache<JsonCodec> {
    /// Opens a connection to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!("connected to redis session cache");
        Ok(Self::with_codec(conn, JsonCodec))
    }
}

impl<C: Codec> RedisSessionCache<C> {
    pub fn with_codec(conn: MultiplexedConnection, codec: C) -> Self {
        Self { conn, codec }
    }

    fn decode(&self, raw: Option<Vec<u8>>) -> Result<Option<SessionPayload>, StoreError> {
        raw.map(|bytes| self.codec.decode::<SessionPayload>(&bytes))
            .transpose()
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl<C: Codec> SessionCache for RedisSessionCache<C> {
    async fn put(
        &self,
        session_id: &SessionId,
        payload: &SessionPayload,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let bytes = self.codec.encode(payload)?;
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(cache_key(session_id))
            .arg(bytes)
            .arg("EX")
            .arg(expiry_seconds(ttl))
            .query_async(&mut conn)
            .await
            .map_err(StoreError::from)?;
        tracing::debug!(%session_id, ttl_secs = expiry_seconds(ttl), "session payload cached");
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionPayload>, SessionError> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = redis::cmd("GET")
            .arg(cache_key(session_id))
            .query_async(&mut conn)
            .await
            .map_err(StoreError::from)?;
        Ok(self.decode(raw)?)
    }

    async fn take(&self, session_id: &SessionId) -> Result<Option<SessionPayload>, SessionError> {
        let mut conn = self.conn.clone();
        // GETDEL needs Redis 6.2.
        let raw: Option<Vec<u8>> = redis::cmd("GETDEL")
            .arg(cache_key(session_id))
            .query_async(&mut conn)
            .await
            .map_err(StoreError::from)?;
        Ok(self.decode(raw)?)
    }
}

/// Converts a TTL to the whole seconds `EX` accepts.
///
/// Rounds up and never returns 0, which Redis rejects.
fn expiry_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_seconds_whole_seconds_unchanged() {
        assert_eq!(expiry_seconds(Duration::from_secs(60)), 60);
    }

    #[test]
    fn test_expiry_seconds_rounds_fraction_up() {
        assert_eq!(expiry_seconds(Duration::from_millis(1500)), 2);
    }

    #[test]
    fn test_expiry_seconds_never_zero() {
        assert_eq!(expiry_seconds(Duration::ZERO), 1);
        assert_eq!(expiry_seconds(Duration::from_millis(1)), 1);
    }
}
