//! Cookie session endpoints.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use passport_session::Session;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// The caller's session as seen over the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session identifier.
    pub id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last recorded activity.
    pub last_active: DateTime<Utc>,
    /// Session payload.
    pub data: Map<String, Value>,
}

impl SessionInfo {
    fn from_session(session: &Session) -> Self {
        let mut keys = session.keys();
        keys.sort();

        let data = keys
            .into_iter()
            .filter_map(|key| session.get(&key).map(|value| (key, value)))
            .collect();

        Self {
            id: session.id(),
            created_at: session.create_time(),
            last_active: session.active(false),
            data,
        }
    }
}

/// Logout response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Identifier of the session that was ended, empty if none.
    pub id: String,
}

/// Get (or start) the caller's session.
///
/// GET /api/v1/session
pub async fn get_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<SessionInfo>)> {
    let mut response_headers = HeaderMap::new();
    let session = state
        .sessions
        .get_session(&headers, &mut response_headers, None)?;

    Ok((response_headers, Json(SessionInfo::from_session(&session))))
}

/// Store a JSON value under `key` in the caller's session.
///
/// PUT /api/v1/session/data/{key}
pub async fn put_session_data_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(HeaderMap, StatusCode)> {
    let value: Value =
        serde_json::from_slice(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?;

    let mut response_headers = HeaderMap::new();
    let session = state
        .sessions
        .get_session(&headers, &mut response_headers, None)?;
    session.set(&key, value)?;

    debug!(session_id = %session.id(), key = %key, "Session value stored");
    Ok((response_headers, StatusCode::NO_CONTENT))
}

/// Remove `key` from the caller's session.
///
/// DELETE /api/v1/session/data/{key}
pub async fn delete_session_data_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<(HeaderMap, StatusCode)> {
    let mut response_headers = HeaderMap::new();
    let session = state
        .sessions
        .get_session(&headers, &mut response_headers, None)?;
    session.delete(&key)?;

    Ok((response_headers, StatusCode::NO_CONTENT))
}

/// End the caller's session and clear its cookie.
///
/// POST /api/v1/logout
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<LogoutResponse>)> {
    let mut response_headers = HeaderMap::new();
    let id = state
        .sessions
        .session_destroy(&headers, &mut response_headers)?;

    Ok((response_headers, Json(LogoutResponse { id })))
}
