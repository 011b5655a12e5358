//! HTTP API for Passport.
//!
//! Exposes user registration and the caller's cookie session over HTTP,
//! backed by a [`passport_session::SessionManager`].
//!
//! # Example
//!
//! ```ignore
//! use passport_server::{Server, ServerConfig};
//! use passport_session::{ManagerConfig, SessionManager};
//!
//! let sessions = SessionManager::new(ManagerConfig::new())?;
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8080".parse()?);
//!
//! Server::new(config, sessions).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod users;

pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::{Result, ServerError};
pub use logging::request_logging_middleware;
pub use routes::{HealthResponse, LogoutResponse, SessionInfo};
pub use state::AppState;
pub use users::{InMemoryUserRepository, NewUser, UserError, UserRecord, UserRepository};

use std::net::SocketAddr;

use axum::{Router, middleware};
use passport_session::SessionManager;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The Passport HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a server over `sessions` with an in-memory user repository.
    pub fn new(config: ServerConfig, sessions: SessionManager) -> Self {
        Self {
            state: AppState::new(config, sessions),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .nest("/api/v1", self.api_routes())
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post, put};

        Router::new()
            .route("/users", post(routes::register_handler))
            .route("/session", get(routes::get_session_handler))
            .route(
                "/session/data/{key}",
                put(routes::put_session_data_handler).delete(routes::delete_session_data_handler),
            )
            .route("/logout", post(routes::logout_handler))
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address.
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        info!(addr = %addr, "Starting server");

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }

    /// Shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
