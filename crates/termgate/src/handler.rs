//! HTTP handlers: authentication, session creation, status lookup.
//!
//! Every `/terminal` route runs the same prelude:
//!   1. Extract `Authorization: Bearer <token>` → 401 if missing
//!   2. Authenticate the token → `UserId` (401 if rejected)
//!   3. Call the broker and translate its result into JSON
//!
//! Errors are returned as [`TermgateError`], which renders itself.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use termgate_protocol::{
    ConnectionId, CreateSessionRequest, CreateSessionResponse, SessionId,
    SessionStatusResponse, UserId,
};
use termgate_session::{Authenticator, SessionBroker, SessionError};

use crate::TermgateError;

/// Shared state handed to every request.
pub(crate) struct AppState {
    pub(crate) broker: SessionBroker,
    pub(crate) auth: Arc<dyn Authenticator>,
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/terminal/sessions", post(create_session))
        .route("/terminal/sessions/{id}", get(get_session_status))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// `POST /terminal/sessions`
async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), TermgateError> {
    let user_id = authenticate(&state, &headers).await?;

    let Json(request) = body.map_err(|e| TermgateError::BadRequest(e.body_text()))?;
    let connection_id = request
        .connection_id
        .map(ConnectionId::new)
        .ok_or_else(|| SessionError::Validation("connection_id is required".into()))?;

    let ticket = state.broker.create_session(&user_id, &connection_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: ticket.session_id,
            ws_url: ticket.ws_url,
            connection: ticket.connection,
        }),
    ))
}

/// `GET /terminal/sessions/{id}`
async fn get_session_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, TermgateError> {
    let user_id = authenticate(&state, &headers).await?;

    // A malformed id can't name an existing session.
    let session_id: SessionId = id
        .parse()
        .map_err(|_| SessionError::NotFound("session"))?;

    let record = state.broker.get_status(&user_id, &session_id).await?;

    Ok(Json(SessionStatusResponse {
        id: record.id,
        status: record.status,
        created_at: record.created_at,
        expires_at: record.expires_at,
    }))
}

/// `GET /healthz`: liveness only, no auth, no backend calls.
async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserId, TermgateError> {
    let token = bearer_token(headers)
        .ok_or_else(|| SessionError::AuthFailed("missing bearer token".into()))?;
    Ok(state.auth.authenticate(token).await?)
}

/// Pulls the token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracts_token() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("bearer abc123")), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    }

    #[test]
    fn test_bearer_token_rejects_empty_token() {
        assert_eq!(bearer_token(&headers("Bearer    ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
