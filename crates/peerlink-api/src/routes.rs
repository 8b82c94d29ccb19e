//! Route handlers for the registry service.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use peerlink_registry::PeerRegistry;
use peerlink_types::error::PeerLinkError;
use peerlink_types::{Message, PeerRecord};
use std::sync::Arc;
use tracing::{error, warn};

/// Shared state for every handler.
pub struct AppState {
    pub registry: PeerRegistry,
}

/// Error response carrying a `{detail}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<PeerLinkError> for ApiError {
    fn from(err: PeerLinkError) -> Self {
        let status = match &err {
            PeerLinkError::NotFound(_) => StatusCode::NOT_FOUND,
            PeerLinkError::Conflict(_)
            | PeerLinkError::InvalidInput(_)
            | PeerLinkError::RelayFailed(_)
            | PeerLinkError::Decode(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let detail = match err {
            PeerLinkError::NotFound(username) => format!("User {username} not found"),
            PeerLinkError::Conflict(username) => format!("Username {username} already exists"),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!(detail = %detail, "registry request failed");
        }
        Self { status, detail }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

/// POST /register/ — add a peer.
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PeerRecord>, JsonRejection>,
) -> Result<Json<PeerRecord>, ApiError> {
    let Json(record) = body?;
    let stored = state.registry.register(record)?;
    Ok(Json(stored))
}

/// GET /available/ — every registered peer.
pub async fn available(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PeerRecord>>, ApiError> {
    Ok(Json(state.registry.list()?))
}

/// DELETE /unregister/{username}
pub async fn unregister(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.registry.unregister(&username)?;
    Ok(Json(serde_json::json!({
        "detail": format!("User {username} unregistered")
    })))
}

/// POST /send/ — relay a message to its receiver's registered address.
pub async fn send(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Message>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(message) = body?;
    match state.registry.relay(&message).await {
        Ok(target) => Ok(Json(serde_json::json!({
            "detail": format!("Message forwarded to {}", target.username)
        }))),
        Err(e) => {
            warn!(
                from = %message.sender().username,
                to = %message.receiver().username,
                "relay request failed: {e}"
            );
            Err(e.into())
        }
    }
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.registry.count() {
        Ok(peers) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "peers": peers })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "degraded", "detail": e.to_string() })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (PeerLinkError::NotFound("bob".into()), StatusCode::NOT_FOUND),
            (PeerLinkError::Conflict("bob".into()), StatusCode::BAD_REQUEST),
            (PeerLinkError::InvalidInput("port".into()), StatusCode::BAD_REQUEST),
            (PeerLinkError::RelayFailed("refused".into()), StatusCode::BAD_REQUEST),
            (
                PeerLinkError::Storage("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn test_detail_names_user() {
        let err = ApiError::from(PeerLinkError::Conflict("alice".into()));
        assert_eq!(err.detail, "Username alice already exists");
        let err = ApiError::from(PeerLinkError::NotFound("bob".into()));
        assert_eq!(err.detail, "User bob not found");
    }
}
