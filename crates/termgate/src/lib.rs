//! # termgate
//!
//! Terminal session broker.
//!
//! A client asks to open a terminal on one of its stored ssh/sftp
//! connections. termgate checks ownership, decrypts the stored secrets,
//! parks them in a TTL cache under a fresh session id, records the session
//! in a ledger, and answers with a WebSocket URL on the collaboration
//! server. That server consumes the cached payload exactly once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use termgate::prelude::*;
//!
//! # async fn start() -> Result<(), TermgateError> {
//! let key = EncryptionKey::from_secret("deployment secret")?;
//! let server = TermgateServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .broker_config(BrokerConfig::new("ws://collaboration:1234"))
//!     .vault(CredentialVault::new(key))
//!     .authenticator(StaticTokenAuthenticator::new().with_token("t1", UserId::new("u1")))
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::TermgateError;
pub use server::{TermgateServer, TermgateServerBuilder};

pub mod prelude {
    pub use crate::{TermgateError, TermgateServer, TermgateServerBuilder};
    pub use termgate_protocol::{
        ConnectionId, ConnectionKind, ConnectionSummary, CreateSessionRequest,
        CreateSessionResponse, ErrorEnvelope, SessionId, SessionStatus,
        SessionStatusResponse, UserId,
    };
    pub use termgate_session::{
        Authenticator, BrokerConfig, Connection, ConnectionRepository,
        MemoryConnectionRepository, MemorySessionCache, MemorySessionLedger,
        SessionCache, SessionError, SessionLedger, StaticTokenAuthenticator,
    };
    #[cfg(feature = "postgres")]
    pub use termgate_store::PgStore;
    #[cfg(feature = "redis")]
    pub use termgate_store::RedisSessionCache;
    pub use termgate_vault::{CredentialVault, EncryptionKey};
}
