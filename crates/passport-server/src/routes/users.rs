//! User registration endpoint.

use axum::{body::Bytes, extract::State, http::StatusCode};

use crate::error::{Result, ServerError};
use crate::state::AppState;
use crate::users::NewUser;

/// Register a user.
///
/// POST /api/v1/users
///
/// Answers 200 with an empty body on success.
pub async fn register_handler(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    let user: NewUser =
        serde_json::from_slice(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?;

    user.validate()?;
    state.users.add_user(user).await?;

    Ok(StatusCode::OK)
}
