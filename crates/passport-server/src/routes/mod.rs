//! API routes.

pub mod health;
pub mod session;
pub mod users;

pub use health::{HealthResponse, health_routes};
pub use session::{
    LogoutResponse, SessionInfo, delete_session_data_handler, get_session_handler,
    logout_handler, put_session_data_handler,
};
pub use users::register_handler;
