//! Cookie-keyed session registry with pluggable stores and idle reclamation.
//!
//! This crate provides the session layer for Passport:
//! - A [`SessionStore`] contract for per-session key-value backends
//! - A [`StoreRegistry`] mapping store type names to factories
//! - A [`SessionManager`] that resolves sessions from a request cookie,
//!   keeps them ordered by recency, and releases idle ones from a background
//!   task that sleeps until the next deadline
//! - A process-wide default manager for package-level access
//!
//! # Example
//!
//! ```rust,ignore
//! use passport_session::{ManagerConfig, SessionManager};
//!
//! let config = ManagerConfig::new()
//!     .with_cookie_name("sid")
//!     .with_idle_time(1800);
//!
//! let manager = SessionManager::new(config)?;
//! let session = manager.get_session(request.headers(), response.headers_mut(), None)?;
//! session.set("uid", serde_json::json!(42))?;
//! ```

mod clock;
mod config;
pub mod cookie;
mod default_manager;
mod error;
mod id;
mod manager;
mod memory;
mod reaper;
mod registry;
mod store;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{
    DEFAULT_COOKIE_EXPIRE, DEFAULT_COOKIE_NAME, DEFAULT_IDLE_TIME, DEFAULT_STORE_TYPE,
    ManagerConfig,
};
pub use default_manager::{
    default_manager, get_session, get_session_by_id, init_default_manager, session_destroy,
    session_destroy_by_id, session_update, set_pre_release,
};
pub use error::{Error, Result};
pub use id::{SESSION_ID_BYTES, generate_session_id, session_id_from};
pub use manager::{PreReleaseHook, SessionManager};
pub use memory::{MEMORY_STORE, MemoryStore, MemoryStoreConfig};
pub use registry::{StoreFactory, StoreRegistry, register_store};
pub use store::{Session, SessionStore, StoreContext};
