//! Postgres-backed connection repository and session ledger.
//!
//! One pool serves both traits. Every read is filtered by `user_id` in the
//! `WHERE` clause, so a row owned by someone else never leaves the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use termgate_protocol::{ConnectionId, SessionId, SessionStatus, UserId};
use termgate_session::{
    Connection, ConnectionRepository, SessionLedger, SessionRecord, StorageError,
};
use uuid::Uuid;

use crate::StoreError;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Postgres storage for connections and terminal sessions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to `database_url` with a small default pool.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        tracing::info!("connected to postgres");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled migrations (`connections`, `terminal_sessions`).
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    async fn fetch_connection(
        &self,
        user_id: &UserId,
        id: &ConnectionId,
    ) -> Result<Option<Connection>, StoreError> {
        let row: Option<ConnectionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, name, type, host, port, username,
                   encrypted_password, encrypted_private_key, last_used_at
            FROM connections
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Connection::try_from).transpose()
    }

    async fn update_last_used(
        &self,
        id: &ConnectionId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE connections SET last_used_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_session(&self, record: &SessionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO terminal_sessions
                (id, user_id, connection_id, status, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(record.connection_id.as_str())
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_session(
        &self,
        user_id: &UserId,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, connection_id, status, created_at, expires_at
            FROM terminal_sessions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRecord::try_from).transpose()
    }
}

#[async_trait]
impl ConnectionRepository for PgStore {
    async fn find_owned(
        &self,
        user_id: &UserId,
        id: &ConnectionId,
    ) -> Result<Option<Connection>, StorageError> {
        Ok(self.fetch_connection(user_id, id).await?)
    }

    async fn touch_last_used(
        &self,
        id: &ConnectionId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Ok(self.update_last_used(id, at).await?)
    }
}

#[async_trait]
impl SessionLedger for PgStore {
    async fn insert(&self, record: &SessionRecord) -> Result<(), StorageError> {
        Ok(self.insert_session(record).await?)
    }

    async fn find_owned(
        &self,
        user_id: &UserId,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, StorageError> {
        Ok(self.fetch_session(user_id, id).await?)
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct ConnectionRow {
    id: String,
    user_id: String,
    name: String,
    #[sqlx(rename = "type")]
    kind: String,
    host: String,
    port: i32,
    username: String,
    encrypted_password: Option<String>,
    encrypted_private_key: Option<String>,
    last_used_at: Option<DateTime<Utc>>,
}

impl TryFrom<ConnectionRow> for Connection {
    type Error = StoreError;

    fn try_from(row: ConnectionRow) -> Result<Self, Self::Error> {
        let port = u16::try_from(row.port).map_err(|_| StoreError::InvalidRow {
            column: "port",
            reason: format!("{} is out of range", row.port),
        })?;
        Ok(Connection {
            id: ConnectionId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            kind: row.kind.into(),
            host: row.host,
            port,
            username: row.username,
            encrypted_password: row.encrypted_password,
            encrypted_private_key: row.encrypted_private_key,
            last_used_at: row.last_used_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: String,
    connection_id: String,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for SessionRecord {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<SessionStatus>()
            .map_err(|e| StoreError::InvalidRow {
                column: "status",
                reason: e.to_string(),
            })?;
        Ok(SessionRecord {
            id: SessionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id),
            connection_id: ConnectionId::new(row.connection_id),
            status,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use termgate_protocol::ConnectionKind;

    use super::*;

    fn connection_row(port: i32, kind: &str) -> ConnectionRow {
        ConnectionRow {
            id: "c1".into(),
            user_id: "u1".into(),
            name: "db host".into(),
            kind: kind.into(),
            host: "10.0.0.5".into(),
            port,
            username: "root".into(),
            encrypted_password: Some("opaque".into()),
            encrypted_private_key: None,
            last_used_at: None,
        }
    }

    fn session_row(status: &str) -> SessionRow {
        let now = Utc::now();
        SessionRow {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            connection_id: "c1".into(),
            status: status.into(),
            created_at: now,
            expires_at: now + chrono::Duration::seconds(60),
        }
    }

    #[test]
    fn test_connection_row_converts() {
        let conn = Connection::try_from(connection_row(22, "ssh")).unwrap();
        assert_eq!(conn.id, ConnectionId::new("c1"));
        assert_eq!(conn.kind, ConnectionKind::Ssh);
        assert_eq!(conn.port, 22);
        assert_eq!(conn.encrypted_password.as_deref(), Some("opaque"));
    }

    #[test]
    fn test_connection_row_keeps_unknown_kind() {
        let conn = Connection::try_from(connection_row(3389, "rdp")).unwrap();
        assert_eq!(conn.kind, ConnectionKind::Other("rdp".into()));
        assert!(!conn.kind.supports_terminal());
    }

    #[test]
    fn test_connection_row_rejects_out_of_range_port() {
        for port in [-1, 70_000] {
            let err = Connection::try_from(connection_row(port, "ssh")).unwrap_err();
            assert!(matches!(err, StoreError::InvalidRow { column: "port", .. }));
        }
    }

    #[test]
    fn test_session_row_converts() {
        let row = session_row("consumed");
        let id = row.id;
        let record = SessionRecord::try_from(row).unwrap();
        assert_eq!(record.id.as_uuid(), id);
        assert_eq!(record.status, SessionStatus::Consumed);
    }

    #[test]
    fn test_session_row_rejects_unknown_status() {
        let err = SessionRecord::try_from(session_row("archived")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRow { column: "status", .. }));
        assert!(err.to_string().contains("archived"));
    }
}
