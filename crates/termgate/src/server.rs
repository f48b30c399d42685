//! `TermgateServer` builder and serve loop.
//!
//! This is the entry point for running the broker. It ties the layers
//! together: HTTP → authentication → broker → vault and backends.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use termgate_session::{
    Authenticator, BrokerConfig, ConnectionRepository, MemoryConnectionRepository,
    MemorySessionCache, MemorySessionLedger, SessionBroker, SessionCache, SessionLedger,
    StaticTokenAuthenticator,
};
use termgate_vault::CredentialVault;
use tokio::net::TcpListener;

use crate::handler::{router, AppState};
use crate::TermgateError;

/// Builder for configuring and starting a termgate server.
///
/// Only the vault is required. Anything else left unset falls back to an
/// in-memory backend (logged as a warning) or, for the authenticator, to
/// one that rejects every token.
///
/// # Example
///
/// ```rust,ignore
/// use termgate::prelude::*;
///
/// let server = TermgateServer::builder()
///     .bind("0.0.0.0:8080")
///     .broker_config(BrokerConfig::new("ws://collaboration:1234"))
///     .vault(CredentialVault::new(key))
///     .authenticator(my_auth)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TermgateServerBuilder {
    bind_addr: String,
    broker_config: BrokerConfig,
    vault: Option<CredentialVault>,
    auth: Option<Arc<dyn Authenticator>>,
    connections: Option<Arc<dyn ConnectionRepository>>,
    cache: Option<Arc<dyn SessionCache>>,
    ledger: Option<Arc<dyn SessionLedger>>,
}

impl TermgateServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            broker_config: BrokerConfig::default(),
            vault: None,
            auth: None,
            connections: None,
            cache: None,
            ledger: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn broker_config(mut self, config: BrokerConfig) -> Self {
        self.broker_config = config;
        self
    }

    pub fn vault(mut self, vault: CredentialVault) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn authenticator(mut self, auth: impl Authenticator) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    pub fn connections(mut self, repo: Arc<dyn ConnectionRepository>) -> Self {
        self.connections = Some(repo);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn SessionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn SessionLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Binds the listener and assembles the router.
    ///
    /// # Errors
    /// [`TermgateError::Config`] if no vault was set, [`TermgateError::Io`]
    /// if the address can't be bound.
    pub async fn build(self) -> Result<TermgateServer, TermgateError> {
        let vault = self
            .vault
            .ok_or_else(|| TermgateError::Config("an encryption key is required".into()))?;

        let auth = self.auth.unwrap_or_else(|| {
            tracing::warn!("no authenticator configured; every request will be rejected");
            Arc::new(StaticTokenAuthenticator::new())
        });
        let connections = self.connections.unwrap_or_else(|| {
            tracing::warn!("using in-memory connection repository");
            Arc::new(MemoryConnectionRepository::new())
        });
        let cache = self.cache.unwrap_or_else(|| {
            tracing::warn!("using in-memory session cache; payloads are invisible to other processes");
            Arc::new(MemorySessionCache::new())
        });
        let ledger = self.ledger.unwrap_or_else(|| {
            tracing::warn!("using in-memory session ledger; records are lost on restart");
            Arc::new(MemorySessionLedger::new())
        });

        let broker = SessionBroker::new(self.broker_config, vault, connections, cache, ledger);
        let state = Arc::new(AppState { broker, auth });

        let listener = TcpListener::bind(&self.bind_addr).await?;

        Ok(TermgateServer {
            listener,
            router: router(state),
        })
    }
}

impl Default for TermgateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound termgate server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct TermgateServer {
    listener: TcpListener,
    router: Router,
}

impl TermgateServer {
    /// Creates a new builder.
    pub fn builder() -> TermgateServerBuilder {
        TermgateServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until Ctrl-C, then drains in-flight requests.
    pub async fn run(self) -> Result<(), TermgateError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown signal received");
        })
        .await
    }

    /// Serves until `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), TermgateError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.listener.local_addr()?;
        tracing::info!(%addr, "termgate server running");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("termgate server stopped");
        Ok(())
    }
}
