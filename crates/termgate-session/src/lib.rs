//! Terminal session brokering for termgate.
//!
//! This crate turns a stored, encrypted connection into a short-lived,
//! one-time session a collaboration server can pick up:
//!
//! 1. **Authentication**: who is asking ([`Authenticator`] trait)
//! 2. **Brokering**: ownership check, decryption, cache handoff and ledger
//!    entry ([`SessionBroker`])
//! 3. **Storage seams**: where connections, payloads and records live
//!    ([`ConnectionRepository`], [`SessionCache`], [`SessionLedger`]), with
//!    in-memory implementations for development and tests
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP layer (above)     ← authenticates, calls the broker, maps errors
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol + vault (below)  ← ids, payload types, AES decryption
//! ```
//!
//! Redis and Postgres implementations of the storage traits live in
//! `termgate-store`.

mod auth;
mod broker;
mod cache;
mod connection;
mod error;
mod ledger;
mod session;

pub use auth::{Authenticator, StaticTokenAuthenticator};
pub use broker::SessionBroker;
pub use cache::{MemorySessionCache, SessionCache};
pub use connection::{Connection, ConnectionRepository, MemoryConnectionRepository};
pub use error::{SessionError, StorageError};
pub use ledger::{MemorySessionLedger, SessionLedger};
pub use session::{BrokerConfig, SessionRecord, SessionTicket};
