//! Integration tests for the broker against misbehaving backends and the
//! full create → consume → status flow.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use termgate_protocol::{ConnectionId, ConnectionKind, SessionId, SessionStatus, UserId};
use termgate_session::{
    BrokerConfig, Connection, ConnectionRepository, MemoryConnectionRepository,
    MemorySessionCache, MemorySessionLedger, SessionBroker, SessionCache, SessionError,
    SessionLedger, SessionRecord, StorageError,
};
use termgate_vault::{CredentialVault, EncryptionKey};

// =========================================================================
// Failing backends
// =========================================================================

/// A ledger whose inserts always fail.
struct BrokenLedger;

#[async_trait]
impl SessionLedger for BrokenLedger {
    async fn insert(&self, _record: &SessionRecord) -> Result<(), StorageError> {
        Err(StorageError::new("broken", "connection refused"))
    }

    async fn find_owned(
        &self,
        _user_id: &UserId,
        _id: &SessionId,
    ) -> Result<Option<SessionRecord>, StorageError> {
        Err(StorageError::new("broken", "connection refused"))
    }
}

/// Delegates lookups to a memory repository but fails every touch.
struct StubbornRepository {
    inner: MemoryConnectionRepository,
    touches: AtomicUsize,
}

#[async_trait]
impl ConnectionRepository for StubbornRepository {
    async fn find_owned(
        &self,
        user_id: &UserId,
        id: &ConnectionId,
    ) -> Result<Option<Connection>, StorageError> {
        self.inner.find_owned(user_id, id).await
    }

    async fn touch_last_used(
        &self,
        _id: &ConnectionId,
        _at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::new("broken", "read-only replica"))
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn vault() -> CredentialVault {
    CredentialVault::new(EncryptionKey::from_secret("integration secret").unwrap())
}

fn connection(vault: &CredentialVault) -> Connection {
    Connection {
        id: ConnectionId::new("c1"),
        user_id: UserId::new("u1"),
        name: "staging".into(),
        kind: ConnectionKind::Ssh,
        host: "10.0.0.5".into(),
        port: 22,
        username: "root".into(),
        encrypted_password: Some(vault.encrypt("s3cret")),
        encrypted_private_key: None,
        last_used_at: None,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_session_ledger_failure_after_cache_write_returns_error() {
    let vault = vault();
    let connections = Arc::new(MemoryConnectionRepository::new());
    connections.insert(connection(&vault)).await;
    let cache = Arc::new(MemorySessionCache::new());

    let broker = SessionBroker::new(
        BrokerConfig::default(),
        vault,
        connections.clone(),
        cache.clone(),
        Arc::new(BrokenLedger),
    );

    let err = broker
        .create_session(&UserId::new("u1"), &ConnectionId::new("c1"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Storage(ref e) if e.backend() == "broken"));
    // The cache entry was already written and is left to expire on its own.
    assert_eq!(cache.len().await, 1);
    // last_used_at is only touched after a successful ledger write.
    let stored = connections.get(&ConnectionId::new("c1")).await.unwrap();
    assert_eq!(stored.last_used_at, None);
}

#[tokio::test]
async fn test_create_session_touch_failure_still_succeeds() {
    let vault = vault();
    let inner = MemoryConnectionRepository::new();
    inner.insert(connection(&vault)).await;
    let repo = Arc::new(StubbornRepository {
        inner,
        touches: AtomicUsize::new(0),
    });

    let broker = SessionBroker::new(
        BrokerConfig::default(),
        vault,
        repo.clone(),
        Arc::new(MemorySessionCache::new()),
        Arc::new(MemorySessionLedger::new()),
    );

    let ticket = broker
        .create_session(&UserId::new("u1"), &ConnectionId::new("c1"))
        .await
        .expect("touch failures are only logged");

    assert_eq!(repo.touches.load(Ordering::SeqCst), 1);
    assert!(ticket.ws_url.starts_with("ws://localhost:1234/terminal/"));
}

#[tokio::test]
async fn test_get_status_ledger_failure_returns_storage_error() {
    let broker = SessionBroker::new(
        BrokerConfig::default(),
        vault(),
        Arc::new(MemoryConnectionRepository::new()),
        Arc::new(MemorySessionCache::new()),
        Arc::new(BrokenLedger),
    );

    let err = broker
        .get_status(&UserId::new("u1"), &SessionId::generate())
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Storage(_)));
}

#[tokio::test(start_paused = true)]
async fn test_take_within_ttl_consumes_payload_once() {
    let vault = vault();
    let connections = Arc::new(MemoryConnectionRepository::new());
    connections.insert(connection(&vault)).await;
    let cache = Arc::new(MemorySessionCache::new());
    let ledger = Arc::new(MemorySessionLedger::new());

    let mut config = BrokerConfig::new("ws://collaboration:1234");
    config.session_ttl = Duration::from_secs(30);
    let broker = SessionBroker::new(config, vault, connections, cache.clone(), ledger);

    let user = UserId::new("u1");
    let ticket = broker
        .create_session(&user, &ConnectionId::new("c1"))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(10)).await;

    // The collaboration server's side of the handoff.
    let payload = cache.take(&ticket.session_id).await.unwrap().expect("live payload");
    assert_eq!(payload.host, "10.0.0.5");
    assert_eq!(payload.password.as_deref(), Some("s3cret"));
    assert_eq!(cache.take(&ticket.session_id).await.unwrap(), None);

    // Status is reported as stored; the broker doesn't observe consumption.
    let record = broker.get_status(&user, &ticket.session_id).await.unwrap();
    assert_eq!(record.status, SessionStatus::Pending);
    assert_eq!(
        record.expires_at - record.created_at,
        chrono::Duration::seconds(30)
    );
}

#[tokio::test(start_paused = true)]
async fn test_take_after_custom_ttl_returns_none() {
    let vault = vault();
    let connections = Arc::new(MemoryConnectionRepository::new());
    connections.insert(connection(&vault)).await;
    let cache = Arc::new(MemorySessionCache::new());

    let mut config = BrokerConfig::default();
    config.session_ttl = Duration::from_secs(5);
    let broker = SessionBroker::new(
        config,
        vault,
        connections,
        cache.clone(),
        Arc::new(MemorySessionLedger::new()),
    );

    let ticket = broker
        .create_session(&UserId::new("u1"), &ConnectionId::new("c1"))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(6)).await;

    assert_eq!(cache.take(&ticket.session_id).await.unwrap(), None);
}
