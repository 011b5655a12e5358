//! Process-wide default manager.
//!
//! Convenience wrappers for callers that do not thread a
//! [`SessionManager`] through their handlers. Prefer passing a manager
//! explicitly; these functions exist for code that wants package-level
//! access to one configured instance.

use axum::http::HeaderMap;
use parking_lot::{RwLock, const_rwlock};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::manager::SessionManager;
use crate::store::Session;

static DEFAULT_MANAGER: RwLock<Option<SessionManager>> = const_rwlock(None);

/// Configure the default manager, destroying the previous one.
///
/// An empty configuration clears the default and returns `Ok(None)`. If
/// the new configuration is invalid the previous manager stays in place.
pub fn init_default_manager(config: Value) -> Result<Option<SessionManager>> {
    let manager = SessionManager::from_value(config)?;
    let previous = std::mem::replace(&mut *DEFAULT_MANAGER.write(), manager.clone());
    if let Some(previous) = previous {
        previous.destroy();
    }
    Ok(manager)
}

/// The current default manager, if configured.
pub fn default_manager() -> Option<SessionManager> {
    DEFAULT_MANAGER.read().clone()
}

fn configured() -> Result<SessionManager> {
    default_manager().ok_or(Error::NotConfigured)
}

/// [`SessionManager::get_session`] on the default manager.
pub fn get_session(
    request: &HeaderMap,
    response: &mut HeaderMap,
    requested_id: Option<&str>,
) -> Result<Session> {
    configured()?.get_session(request, response, requested_id)
}

/// [`SessionManager::get_session_by_id`] on the default manager.
pub fn get_session_by_id(session_id: &str) -> Result<Session> {
    configured()?.get_session_by_id(session_id)
}

/// [`SessionManager::session_destroy`] on the default manager.
pub fn session_destroy(request: &HeaderMap, response: &mut HeaderMap) -> Result<String> {
    configured()?.session_destroy(request, response)
}

/// [`SessionManager::session_destroy_by_id`] on the default manager.
pub fn session_destroy_by_id(session_id: &str) -> bool {
    default_manager().is_some_and(|m| m.session_destroy_by_id(session_id))
}

/// [`SessionManager::session_update`] on the default manager.
pub fn session_update(session_id: &str) -> bool {
    default_manager().is_some_and(|m| m.session_update(session_id))
}

/// [`SessionManager::set_pre_release`] on the default manager.
pub fn set_pre_release<F>(hook: F)
where
    F: Fn(&Session) + Send + Sync + 'static,
{
    if let Some(manager) = default_manager() {
        manager.set_pre_release(hook);
    }
}
