//! The session store contract.
//!
//! A store holds one session's key-value payload plus its bookkeeping
//! (identifier, creation time, last-active time). Backends implement
//! [`SessionStore`] and are plugged in through the
//! [`StoreRegistry`](crate::StoreRegistry); the manager never sees their
//! internals.
//!
//! Stores are shared between concurrent request handlers, so every method
//! takes `&self` and implementations synchronize internally. Calls are
//! expected to be fast and local: a backend that blocks stalls every caller
//! of the manager.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::clock::SharedClock;
use crate::error::Result;

/// Capability set of one session's backing store.
pub trait SessionStore: Send + Sync {
    /// Current session identifier (empty until assigned).
    fn id(&self) -> String;

    /// Assign the identifier. Only the first assignment takes effect.
    fn set_id(&self, id: &str);

    /// When the store was constructed.
    fn create_time(&self) -> DateTime<Utc>;

    /// Read the last-active time, or with `touch` stamp it to now and
    /// return the new value.
    fn active(&self, touch: bool) -> DateTime<Utc>;

    /// All keys currently in the payload.
    fn keys(&self) -> Vec<String>;

    /// Value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key`. Fails with [`Error::KeyNotFound`](crate::Error::KeyNotFound)
    /// when it is absent.
    fn delete(&self, key: &str) -> Result<()>;

    /// Free backend resources. Safe to call more than once.
    fn release(&self);
}

/// Handle to a live session.
///
/// Handles are only meaningful for the operation that obtained them: the
/// reclamation loop may release the underlying store at any time afterwards.
pub type Session = Arc<dyn SessionStore>;

/// Everything a store factory is given when the manager needs a new store.
#[derive(Debug, Clone)]
pub struct StoreContext<'a> {
    /// The manager's `store_config` blob, unmodified.
    pub config: &'a Value,

    /// Clock the store must use for its timestamps.
    pub clock: SharedClock,
}

impl<'a> StoreContext<'a> {
    /// Bundle a config blob with a clock.
    pub fn new(config: &'a Value, clock: SharedClock) -> Self {
        Self { config, clock }
    }
}
