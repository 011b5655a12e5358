//! Error types for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::users::UserError;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Session layer error.
    #[error(transparent)]
    Session(#[from] passport_session::Error),

    /// User repository error.
    #[error(transparent)]
    User(#[from] UserError),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        use passport_session::Error as SessionError;

        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Session(e) => match e {
                SessionError::CookieDecode(_) | SessionError::EmptySessionId => {
                    StatusCode::BAD_REQUEST
                }
                SessionError::KeyNotFound(_) => StatusCode::NOT_FOUND,
                SessionError::Destroyed => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::User(e) => match e {
                UserError::Invalid(_) => StatusCode::BAD_REQUEST,
                UserError::Duplicate(_) | UserError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

/// Errors are answered with their status and the error text as a plain
/// body.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, error = %message, "Client error");
        }

        (status, message).into_response()
    }
}
