//! Application state shared across handlers.

use std::sync::Arc;

use passport_session::SessionManager;

use crate::config::ServerConfig;
use crate::users::{InMemoryUserRepository, UserRepository};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Cookie-keyed session registry.
    pub sessions: SessionManager,

    /// User account storage.
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Create a new application state with an in-memory user repository.
    pub fn new(config: ServerConfig, sessions: SessionManager) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }

    /// Replace the user repository.
    pub fn with_users(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = users;
        self
    }
}
