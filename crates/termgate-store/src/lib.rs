//! Production storage backends for termgate.
//!
//! - [`RedisSessionCache`] (feature `redis`): the one-time payload cache,
//!   `SET .. EX` on write and `GETDEL` on consume.
//! - [`PgStore`] (feature `postgres`): connections and the session ledger,
//!   with the schema shipped as a sqlx migration.
//!
//! Both implement the storage traits from `termgate-session`, so the
//! broker can't tell them apart from the in-memory backends.

mod error;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "redis")]
mod redis_cache;

pub use error::StoreError;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
#[cfg(feature = "redis")]
pub use redis_cache::RedisSessionCache;
