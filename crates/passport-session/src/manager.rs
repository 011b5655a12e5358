//! Session manager: the registry of live sessions.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::http::{HeaderMap, header};
use chrono::{DateTime, TimeDelta, Utc};
use lru::LruCache;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::clock::{SharedClock, SystemClock};
use crate::config::ManagerConfig;
use crate::cookie;
use crate::error::{Error, Result};
use crate::id::generate_session_id;
use crate::reaper;
use crate::registry::StoreRegistry;
use crate::store::{Session, StoreContext};

/// Callback invoked with a session just before idle reclamation releases it.
pub type PreReleaseHook = Arc<dyn Fn(&Session) + Send + Sync>;

/// Live sessions keyed by identifier, least recently active first.
///
/// The LRU list doubles as the identifier index, so every indexed session
/// has exactly one recency entry.
type SessionList = LruCache<String, Session>;

/// State shared by all handles to one manager and its reclamation loop.
pub(crate) struct ManagerInner {
    config: ManagerConfig,
    registry: Arc<StoreRegistry>,
    clock: SharedClock,

    /// `None` once the manager is destroyed.
    sessions: RwLock<Option<SessionList>>,

    pre_release: RwLock<Option<PreReleaseHook>>,
    destroyed: AtomicBool,

    /// Wakes a dormant reclamation loop when the first session arrives.
    wake: Arc<Notify>,
    shutdown: CancellationToken,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(sessions) = self.sessions.get_mut().take() {
            for (_, session) in sessions.iter() {
                session.release();
            }
        }
    }
}

/// Registry of live sessions with cookie-based lookup and idle reclamation.
///
/// Handles are cheap to clone and share one registry. Construction spawns a
/// background task on the current tokio runtime that releases sessions idle
/// for longer than the configured `idle_time`; it sleeps until the oldest
/// session is due rather than polling.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

impl SessionManager {
    /// Create a manager backed by the process-wide store registry.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ManagerConfig) -> Result<Self> {
        Self::with_registry(config, StoreRegistry::global(), SystemClock::shared())
    }

    /// Create a manager with an explicit registry and clock.
    ///
    /// Fails with [`Error::InvalidConfig`] when the cookie name or domain
    /// cannot be sent in a `Set-Cookie` header.
    pub fn with_registry(
        config: ManagerConfig,
        registry: Arc<StoreRegistry>,
        clock: SharedClock,
    ) -> Result<Self> {
        cookie::validate_attributes(&config.cookie_name, &config.domain)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let inner = Arc::new(ManagerInner {
            config,
            registry,
            clock,
            sessions: RwLock::new(Some(LruCache::unbounded())),
            pre_release: RwLock::new(None),
            destroyed: AtomicBool::new(false),
            wake: Arc::new(Notify::new()),
            shutdown: CancellationToken::new(),
        });

        runtime.spawn(reaper::run(
            Arc::downgrade(&inner),
            Arc::clone(&inner.wake),
            inner.shutdown.clone(),
        ));

        info!(
            store_type = %inner.config.store_type,
            cookie_name = %inner.config.cookie_name,
            idle_time = inner.config.idle_time,
            "Session manager started"
        );

        Ok(Self { inner })
    }

    /// Create a manager from an untyped configuration blob.
    ///
    /// An empty configuration yields `Ok(None)`: sessions are disabled.
    pub fn from_value(config: Value) -> Result<Option<Self>> {
        match ManagerConfig::from_value(config)? {
            Some(config) => Self::new(config).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ManagerInner>) -> Self {
        Self { inner }
    }

    /// The manager's configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// The clock used for session timestamps.
    pub fn clock(&self) -> &SharedClock {
        &self.inner.clock
    }

    /// Resolve the session for an HTTP request, creating it if needed.
    ///
    /// The identifier comes from the session cookie when present and
    /// non-empty, otherwise from `requested_id`, otherwise it is freshly
    /// generated. A session created from a non-cookie identifier gets a
    /// `Set-Cookie` header appended to `response`.
    pub fn get_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
        requested_id: Option<&str>,
    ) -> Result<Session> {
        let config = &self.inner.config;

        let from_cookie =
            cookie::read_cookie(request, &config.cookie_name).filter(|value| !value.is_empty());

        let (session_id, needs_cookie) = match from_cookie {
            Some(raw) => (cookie::unescape(&raw)?, false),
            None => match requested_id.filter(|id| !id.is_empty()) {
                Some(id) => (id.to_string(), true),
                None => (generate_session_id()?, true),
            },
        };

        // Rendered before the session is registered so a bad header value
        // cannot leave an orphan behind.
        let set_cookie = if needs_cookie {
            Some(cookie::set_cookie_value(&cookie::session_cookie(
                &config.cookie_name,
                &session_id,
                &config.domain,
                config.cookie_expire,
            ))?)
        } else {
            None
        };

        let (session, created) = self.resolve(&session_id)?;

        if let Some(value) = set_cookie.filter(|_| created) {
            response.append(header::SET_COOKIE, value);
        }

        Ok(session)
    }

    /// Log the client out: release its session and clear its cookie.
    ///
    /// Returns the identifier carried by the request cookie, or an empty
    /// string when there was none (in which case nothing is written). The
    /// clearing cookie is written whether or not the session was live.
    pub fn session_destroy(&self, request: &HeaderMap, response: &mut HeaderMap) -> Result<String> {
        let config = &self.inner.config;

        let Some(raw) =
            cookie::read_cookie(request, &config.cookie_name).filter(|value| !value.is_empty())
        else {
            return Ok(String::new());
        };

        let decoded = cookie::unescape(&raw);

        let clearing = cookie::clearing_cookie(
            &config.cookie_name,
            &config.domain,
            self.inner.clock.now(),
        );
        cookie::append_set_cookie(response, &clearing)?;

        let session_id = decoded?;
        self.session_destroy_by_id(&session_id);
        Ok(session_id)
    }

    /// Look up a session by identifier, creating it if unknown.
    pub fn get_session_by_id(&self, session_id: &str) -> Result<Session> {
        if session_id.is_empty() {
            return Err(Error::EmptySessionId);
        }
        self.resolve(session_id).map(|(session, _)| session)
    }

    /// Release and forget a session. Returns whether it was live.
    pub fn session_destroy_by_id(&self, session_id: &str) -> bool {
        let removed = self
            .inner
            .sessions
            .write()
            .as_mut()
            .and_then(|sessions| sessions.pop(session_id));

        match removed {
            Some(session) => {
                session.release();
                debug!(session_id = %session_id, "Session destroyed");
                true
            }
            None => false,
        }
    }

    /// Mark a session as just used. Returns whether it was live.
    pub fn session_update(&self, session_id: &str) -> bool {
        matches!(self.touch(session_id), Ok(Some(_)))
    }

    /// Install the callback run before a session is reclaimed for idleness.
    pub fn set_pre_release<F>(&self, hook: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        *self.inner.pre_release.write() = Some(Arc::new(hook));
    }

    /// Tear the manager down.
    ///
    /// Stops the reclamation loop and releases every live session. Later
    /// lookups fail with [`Error::Destroyed`]; other operations do nothing.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        let sessions = self.inner.sessions.write().take();
        self.inner.shutdown.cancel();

        let mut released = 0usize;
        if let Some(mut sessions) = sessions {
            while let Some((_, session)) = sessions.pop_lru() {
                session.release();
                released += 1;
            }
        }

        info!(released, "Session manager destroyed");
    }

    /// Whether [`SessionManager::destroy`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.inner.sessions.read().as_ref().map_or(0, |s| s.len())
    }

    /// Whether there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a session is live, without touching it.
    pub fn contains(&self, session_id: &str) -> bool {
        self.inner
            .sessions
            .read()
            .as_ref()
            .is_some_and(|s| s.contains(session_id))
    }

    /// Live session identifiers, least recently active first.
    pub fn session_ids(&self) -> Vec<String> {
        self.inner
            .sessions
            .read()
            .as_ref()
            .map(|s| s.iter().rev().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default()
    }

    /// Release every session whose idle deadline has passed.
    ///
    /// Returns how long until the next live session falls due, or `None`
    /// when no sessions remain (or the manager is destroyed). This is one
    /// wake-up of the reclamation loop.
    pub fn reap_expired(&self) -> Option<Duration> {
        let idle = TimeDelta::from_std(self.inner.config.idle_duration()).unwrap_or(TimeDelta::MAX);

        loop {
            if self.is_destroyed() {
                return None;
            }

            let (candidate, due) = {
                let guard = self.inner.sessions.read();
                let (id, session) = guard.as_ref()?.peek_lru()?;
                (id.clone(), deadline(session, idle))
            };

            let now = self.inner.clock.now();
            if due > now {
                return Some((due - now).to_std().unwrap_or(Duration::ZERO));
            }

            // Re-check under the write lock: the candidate may have been
            // touched or removed since the scan.
            let evicted = {
                let mut guard = self.inner.sessions.write();
                let sessions = guard.as_mut()?;
                match sessions.peek_lru() {
                    Some((id, session)) if *id == candidate && deadline(session, idle) <= now => {
                        sessions.pop_lru().map(|(_, session)| session)
                    }
                    _ => None,
                }
            };

            if let Some(session) = evicted {
                let hook = self.inner.pre_release.read().clone();
                if let Some(hook) = hook
                    && catch_unwind(AssertUnwindSafe(|| hook(&session))).is_err()
                {
                    error!(session_id = %candidate, "Pre-release hook panicked");
                }
                if catch_unwind(AssertUnwindSafe(|| session.release())).is_err() {
                    error!(session_id = %candidate, "Session store panicked on release");
                }
                warn!(session_id = %candidate, "Session released after idle timeout");
            }
        }
    }

    /// Find or create the session for `session_id`.
    ///
    /// Returns the session and whether it was created by this call.
    fn resolve(&self, session_id: &str) -> Result<(Session, bool)> {
        if let Some(session) = self.touch(session_id)? {
            trace!(session_id = %session_id, "Session found");
            return Ok((session, false));
        }

        let config = &self.inner.config;
        let ctx = StoreContext::new(&config.store_config, Arc::clone(&self.inner.clock));
        let store = self.inner.registry.create(&config.store_type, &ctx)?;
        store.set_id(session_id);

        let mut guard = self.inner.sessions.write();
        let Some(sessions) = guard.as_mut() else {
            drop(guard);
            store.release();
            return Err(Error::Destroyed);
        };

        // Another request may have created the same session meanwhile.
        if let Some(existing) = sessions.get(session_id) {
            let existing = Arc::clone(existing);
            existing.active(true);
            drop(guard);
            store.release();
            return Ok((existing, false));
        }

        let was_empty = sessions.is_empty();
        store.active(true);
        sessions.put(session_id.to_string(), Arc::clone(&store));
        let live = sessions.len();
        drop(guard);

        if was_empty {
            self.inner.wake.notify_one();
        }

        debug!(session_id = %session_id, live, "Session created");
        Ok((store, true))
    }

    /// Refresh a live session's last-active time and move it to the back
    /// of the recency list.
    fn touch(&self, session_id: &str) -> Result<Option<Session>> {
        let mut guard = self.inner.sessions.write();
        let sessions = guard.as_mut().ok_or(Error::Destroyed)?;
        Ok(sessions.get(session_id).map(|session| {
            session.active(true);
            Arc::clone(session)
        }))
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.inner.config)
            .field("live", &self.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// When `session` becomes eligible for reclamation.
fn deadline(session: &Session, idle: TimeDelta) -> DateTime<Utc> {
    session
        .active(false)
        .checked_add_signed(idle)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::MemoryStore;
    use axum::http::{HeaderValue, header};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn manual_manager(idle: u64) -> (SessionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let config = ManagerConfig::new()
            .with_cookie_name("sid")
            .with_idle_time(idle);
        let manager = SessionManager::with_registry(
            config,
            Arc::new(StoreRegistry::with_builtin()),
            clock.clone(),
        )
        .unwrap();
        (manager, clock)
    }

    fn cookie_request(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("sid={value}")).unwrap(),
        );
        headers
    }

    fn set_cookies(headers: &HeaderMap) -> Vec<String> {
        headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_requires_runtime() {
        let result = SessionManager::new(ManagerConfig::default());
        assert!(matches!(result, Err(Error::NoRuntime)));
    }

    #[tokio::test]
    async fn test_from_value_disabled() {
        assert!(SessionManager::from_value(Value::Null).unwrap().is_none());
        assert!(SessionManager::from_value(json!({})).unwrap().is_none());

        let manager = SessionManager::from_value(json!({"cookie_name": "sid"}))
            .unwrap()
            .unwrap();
        assert_eq!(manager.config().cookie_name, "sid");
        manager.destroy();
    }

    #[tokio::test]
    async fn test_new_session_writes_cookie() {
        let (manager, _) = manual_manager(60);
        let mut response = HeaderMap::new();

        let session = manager
            .get_session(&HeaderMap::new(), &mut response, None)
            .unwrap();

        let id = session.id();
        assert_eq!(id.len(), 48);
        assert!(session.keys().is_empty());
        assert_eq!(set_cookies(&response), vec![format!("sid={id}; Path=/")]);
        assert!(manager.contains(&id));
    }

    #[tokio::test]
    async fn test_cookie_round_trip_resolves_same_session() {
        let (manager, _) = manual_manager(60);
        let mut response = HeaderMap::new();
        let first = manager
            .get_session(&HeaderMap::new(), &mut response, None)
            .unwrap();
        first.set("user", json!("ada")).unwrap();

        let mut response = HeaderMap::new();
        let second = manager
            .get_session(&cookie_request(&first.id()), &mut response, None)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.get("user"), Some(json!("ada")));
        assert!(set_cookies(&response).is_empty());
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_requested_id_used_without_cookie() {
        let (manager, _) = manual_manager(60);
        let mut response = HeaderMap::new();

        let session = manager
            .get_session(&HeaderMap::new(), &mut response, Some("chosen"))
            .unwrap();

        assert_eq!(session.id(), "chosen");
        assert_eq!(set_cookies(&response), vec!["sid=chosen; Path=/".to_string()]);

        // The cookie wins over a requested id.
        let mut response = HeaderMap::new();
        let session = manager
            .get_session(&cookie_request("chosen"), &mut response, Some("other"))
            .unwrap();
        assert_eq!(session.id(), "chosen");
        assert!(!manager.contains("other"));
    }

    #[tokio::test]
    async fn test_unknown_cookie_creates_without_writing() {
        let (manager, _) = manual_manager(60);
        let mut response = HeaderMap::new();

        let session = manager
            .get_session(&cookie_request("stale"), &mut response, None)
            .unwrap();

        assert_eq!(session.id(), "stale");
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_empty_cookie_treated_as_missing() {
        let (manager, _) = manual_manager(60);
        let mut response = HeaderMap::new();

        let session = manager
            .get_session(&cookie_request(""), &mut response, None)
            .unwrap();

        assert_eq!(session.id().len(), 48);
        assert_eq!(set_cookies(&response).len(), 1);
    }

    #[tokio::test]
    async fn test_cookie_max_age_and_domain() {
        let config = ManagerConfig::new()
            .with_cookie_name("sid")
            .with_domain("example.com")
            .with_cookie_expire(120);
        let manager = SessionManager::with_registry(
            config,
            Arc::new(StoreRegistry::with_builtin()),
            Arc::new(ManualClock::default()),
        )
        .unwrap();

        let mut response = HeaderMap::new();
        manager
            .get_session(&HeaderMap::new(), &mut response, Some("abc"))
            .unwrap();

        assert_eq!(
            set_cookies(&response),
            vec!["sid=abc; Path=/; Domain=example.com; Max-Age=120".to_string()]
        );
    }

    #[tokio::test]
    async fn test_malformed_cookie_is_decode_error() {
        let (manager, _) = manual_manager(60);
        let mut response = HeaderMap::new();

        let result = manager.get_session(&cookie_request("bad%zz"), &mut response, None);
        assert!(matches!(result, Err(Error::CookieDecode(_))));
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_store_type() {
        let config = ManagerConfig::new().with_store_type("nope");
        let manager = SessionManager::with_registry(
            config,
            Arc::new(StoreRegistry::with_builtin()),
            Arc::new(ManualClock::default()),
        )
        .unwrap();

        let result = manager.get_session_by_id("abc");
        assert!(matches!(result, Err(Error::UnknownStoreType(name)) if name == "nope"));
        assert!(manager.is_empty());

        // The manager stays usable.
        assert_eq!(manager.len(), 0);
        assert!(!manager.is_destroyed());
    }

    #[tokio::test]
    async fn test_rejects_unsendable_cookie_attributes() {
        let registry = Arc::new(StoreRegistry::with_builtin());
        let configs = [
            ManagerConfig::new().with_cookie_name("bad\nname"),
            ManagerConfig::new().with_cookie_name("sid; Secure"),
            ManagerConfig::new().with_domain("example.com\r\nX-Evil: 1"),
        ];

        for config in configs {
            let result = SessionManager::with_registry(
                config,
                Arc::clone(&registry),
                Arc::new(ManualClock::default()),
            );
            assert!(matches!(result, Err(Error::InvalidConfig(_))));
        }
    }

    #[tokio::test]
    async fn test_store_config_error_propagates() {
        let config = ManagerConfig::new().with_store_config(json!([1, 2]));
        let manager = SessionManager::with_registry(
            config,
            Arc::new(StoreRegistry::with_builtin()),
            Arc::new(ManualClock::default()),
        )
        .unwrap();

        assert!(matches!(
            manager.get_session_by_id("abc"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_session_destroy_clears_cookie() {
        let (manager, _) = manual_manager(60);
        let session = manager.get_session_by_id("abc").unwrap();
        session.set("k", json!(1)).unwrap();

        let mut response = HeaderMap::new();
        let id = manager
            .session_destroy(&cookie_request("abc"), &mut response)
            .unwrap();

        assert_eq!(id, "abc");
        assert!(!manager.contains("abc"));
        assert!(session.keys().is_empty());

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("sid=; Path=/; Expires="));
        assert!(cookies[0].ends_with("; Max-Age=0; HttpOnly"));
    }

    #[tokio::test]
    async fn test_session_destroy_without_live_session() {
        let (manager, _) = manual_manager(60);
        let mut response = HeaderMap::new();

        let id = manager
            .session_destroy(&cookie_request("ghost"), &mut response)
            .unwrap();

        assert_eq!(id, "ghost");
        assert_eq!(set_cookies(&response).len(), 1);
    }

    #[tokio::test]
    async fn test_session_destroy_without_cookie() {
        let (manager, _) = manual_manager(60);
        let mut response = HeaderMap::new();

        let id = manager.session_destroy(&HeaderMap::new(), &mut response).unwrap();

        assert_eq!(id, "");
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_get_session_by_id() {
        let (manager, _) = manual_manager(60);

        assert!(matches!(
            manager.get_session_by_id(""),
            Err(Error::EmptySessionId)
        ));

        let a = manager.get_session_by_id("job-1").unwrap();
        let b = manager.get_session_by_id("job-1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.id(), "job-1");
    }

    #[tokio::test]
    async fn test_destroy_by_id_and_recreate() {
        let (manager, _) = manual_manager(60);
        let first = manager.get_session_by_id("s").unwrap();

        assert!(manager.session_destroy_by_id("s"));
        assert!(!manager.session_destroy_by_id("s"));

        let second = manager.get_session_by_id("s").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_recency_order() {
        let (manager, clock) = manual_manager(60);
        let mut handles = std::collections::HashMap::new();
        for id in ["a", "b", "c"] {
            handles.insert(id.to_string(), manager.get_session_by_id(id).unwrap());
            clock.advance(Duration::from_secs(1));
        }
        assert_eq!(manager.session_ids(), vec!["a", "b", "c"]);

        assert!(manager.session_update("a"));
        assert_eq!(manager.session_ids(), vec!["b", "c", "a"]);

        clock.advance(Duration::from_secs(1));
        manager.get_session_by_id("b").unwrap();
        assert_eq!(manager.session_ids(), vec!["c", "a", "b"]);

        assert!(!manager.session_update("zzz"));

        // Last-active times ascend from front to back.
        let times: Vec<_> = manager
            .session_ids()
            .iter()
            .map(|id| handles[id].active(false))
            .collect();
        assert!(times[0] < times[2]);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_reap_expired_never_early() {
        let (manager, clock) = manual_manager(10);
        manager.get_session_by_id("old").unwrap();
        clock.advance(Duration::from_secs(4));
        manager.get_session_by_id("new").unwrap();

        clock.advance(Duration::from_secs(5));
        assert_eq!(manager.reap_expired(), Some(Duration::from_secs(1)));
        assert_eq!(manager.len(), 2);

        clock.advance(Duration::from_secs(1));
        assert_eq!(manager.reap_expired(), Some(Duration::from_secs(4)));
        assert_eq!(manager.session_ids(), vec!["new"]);

        clock.advance(Duration::from_secs(4));
        assert_eq!(manager.reap_expired(), None);
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_reap_drains_all_expired_in_one_pass() {
        let (manager, clock) = manual_manager(5);
        for id in ["a", "b", "c"] {
            manager.get_session_by_id(id).unwrap();
        }
        clock.advance(Duration::from_secs(1));
        manager.get_session_by_id("d").unwrap();

        clock.advance(Duration::from_secs(5));
        assert_eq!(manager.reap_expired(), None);
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_touched_session_survives() {
        let (manager, clock) = manual_manager(10);
        manager.get_session_by_id("a").unwrap();

        clock.advance(Duration::from_secs(8));
        manager.session_update("a");
        clock.advance(Duration::from_secs(8));

        assert_eq!(manager.reap_expired(), Some(Duration::from_secs(2)));
        assert!(manager.contains("a"));
    }

    #[tokio::test]
    async fn test_pre_release_hook() {
        let (manager, clock) = manual_manager(1);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_by_hook = Arc::clone(&seen);
        manager.set_pre_release(move |session| {
            seen_by_hook.lock().push((session.id(), session.get("k")));
        });

        let session = manager.get_session_by_id("a").unwrap();
        session.set("k", json!("v")).unwrap();

        clock.advance(Duration::from_secs(2));
        manager.reap_expired();

        assert_eq!(*seen.lock(), vec![("a".to_string(), Some(json!("v")))]);
        assert!(session.keys().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_releases_sessions() {
        let (manager, _) = manual_manager(60);
        let session = manager.get_session_by_id("a").unwrap();
        session.set("k", json!(1)).unwrap();

        manager.destroy();
        manager.destroy();

        assert!(manager.is_destroyed());
        assert!(session.keys().is_empty());
        assert_eq!(manager.len(), 0);
        assert!(matches!(manager.get_session_by_id("a"), Err(Error::Destroyed)));

        let mut response = HeaderMap::new();
        assert!(matches!(
            manager.get_session(&HeaderMap::new(), &mut response, None),
            Err(Error::Destroyed)
        ));
        assert!(response.is_empty());
        assert!(!manager.session_update("a"));
        assert!(!manager.session_destroy_by_id("a"));
        assert_eq!(manager.reap_expired(), None);
    }

    #[tokio::test]
    async fn test_custom_store_type() {
        let registry = Arc::new(StoreRegistry::with_builtin());
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        registry.register("counted", move |ctx: &StoreContext<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            MemoryStore::factory(ctx)
        });

        let config = ManagerConfig::new().with_store_type("counted");
        let manager =
            SessionManager::with_registry(config, registry, Arc::new(ManualClock::default()))
                .unwrap();

        manager.get_session_by_id("a").unwrap();
        manager.get_session_by_id("a").unwrap();
        manager.get_session_by_id("b").unwrap();

        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creation_single_session() {
        let (manager, _) = manual_manager(60);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                std::thread::spawn(move || manager.get_session_by_id("shared").unwrap())
            })
            .collect();

        let sessions: Vec<Session> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
        assert_eq!(manager.len(), 1);
    }
}
