//! Error types for session manager operations.

/// Error type for session manager and store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No store factory is registered under the requested name.
    #[error("Unknown session store type: {0}")]
    UnknownStoreType(String),

    /// The random source could not produce a session identifier.
    #[error("Could not generate session id: {0}")]
    IdentityGeneration(String),

    /// Error from a store backend.
    #[error("Store error: {0}")]
    Store(String),

    /// Key was not present in the session payload.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The session cookie value could not be unescaped.
    #[error("Cookie decode error: {0}")]
    CookieDecode(String),

    /// Manager or store configuration could not be interpreted.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// An identifier-addressed operation was given an empty identifier.
    #[error("Session id is empty")]
    EmptySessionId,

    /// The manager has been destroyed.
    #[error("Session manager destroyed")]
    Destroyed,

    /// The manager was constructed outside an async runtime.
    #[error("No async runtime available to run session reclamation")]
    NoRuntime,

    /// The default manager has not been initialized.
    #[error("Default session manager not configured")]
    NotConfigured,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;
