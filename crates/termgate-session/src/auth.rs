//! Authentication hook for identifying the caller.
//!
//! termgate doesn't issue tokens. The upstream application already has a
//! JWT stack for that. What the broker needs is a way to turn the bearer
//! token of an incoming request into a [`UserId`], because every lookup is
//! filtered by the owning user.
//!
//! [`Authenticator`] is that seam: one async method, token in, user out.
//! Production deployments plug in their JWT validation; development and
//! tests use [`StaticTokenAuthenticator`].

use std::collections::HashMap;

use async_trait::async_trait;
use termgate_protocol::UserId;

use crate::SessionError;

/// Validates a caller's bearer token and returns their identity.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// request task for the lifetime of the server.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use termgate_protocol::UserId;
/// use termgate_session::{Authenticator, SessionError};
///
/// /// Treats the token itself as the user id. Development only!
/// struct TrustingAuthenticator;
///
/// #[async_trait]
/// impl Authenticator for TrustingAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<UserId, SessionError> {
///         if token.is_empty() {
///             return Err(SessionError::AuthFailed("empty token".into()));
///         }
///         Ok(UserId::new(token))
///     }
/// }
/// ```
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `token` and returns the user it belongs to.
    ///
    /// # Errors
    /// Returns [`SessionError::AuthFailed`] if the token is invalid.
    async fn authenticate(&self, token: &str) -> Result<UserId, SessionError>;
}

/// An [`Authenticator`] backed by a fixed token → user table.
///
/// Tokens are configured at startup (see the `--api-token` flag of the
/// binary). Suitable for service-to-service calls and local development.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as belonging to `user`.
    pub fn with_token(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<UserId, SessionError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| SessionError::AuthFailed("unknown token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_authenticator_known_token_returns_user() {
        let auth = StaticTokenAuthenticator::new()
            .with_token("t-alice", UserId::new("alice"))
            .with_token("t-bob", UserId::new("bob"));

        assert_eq!(auth.authenticate("t-bob").await.unwrap(), UserId::new("bob"));
        assert_eq!(auth.len(), 2);
    }

    #[tokio::test]
    async fn test_static_authenticator_unknown_token_fails() {
        let auth = StaticTokenAuthenticator::new().with_token("t-alice", UserId::new("alice"));
        let result = auth.authenticate("t-mallory").await;
        assert!(matches!(result, Err(SessionError::AuthFailed(_))));
    }

    #[tokio::test]
    async fn test_static_authenticator_empty_rejects_everything() {
        let auth = StaticTokenAuthenticator::new();
        assert!(auth.is_empty());
        assert!(auth.authenticate("").await.is_err());
    }
}
