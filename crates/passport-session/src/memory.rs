//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::clock::SharedClock;
use crate::error::{Error, Result};
use crate::store::{Session, SessionStore, StoreContext};

/// Registry name of the in-memory backend.
pub const MEMORY_STORE: &str = "memory";

/// Options accepted in `store_config` by the in-memory backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryStoreConfig {
    /// Maximum number of distinct keys per session (`None` = unbounded).
    pub max_keys: Option<usize>,
}

impl MemoryStoreConfig {
    /// Interpret a `store_config` blob. Accepts `null` or an object.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => Ok(Self::deserialize(value)?),
            other => Err(Error::InvalidConfig(format!(
                "memory store config must be an object, got {other}"
            ))),
        }
    }
}

/// Session payload held in process memory.
#[derive(Debug)]
pub struct MemoryStore {
    id: Mutex<String>,
    created_at: DateTime<Utc>,
    last_active: Mutex<DateTime<Utc>>,
    data: RwLock<HashMap<String, Value>>,
    max_keys: Option<usize>,
    released: AtomicBool,
    clock: SharedClock,
}

impl MemoryStore {
    /// Create an empty store stamped with the clock's current time.
    pub fn new(config: MemoryStoreConfig, clock: SharedClock) -> Self {
        let now = clock.now();
        Self {
            id: Mutex::new(String::new()),
            created_at: now,
            last_active: Mutex::new(now),
            data: RwLock::new(HashMap::new()),
            max_keys: config.max_keys,
            released: AtomicBool::new(false),
            clock,
        }
    }

    /// Store factory suitable for [`StoreRegistry::register`](crate::StoreRegistry::register).
    pub fn factory(ctx: &StoreContext<'_>) -> Result<Session> {
        let config = MemoryStoreConfig::from_value(ctx.config)?;
        Ok(Arc::new(Self::new(config, Arc::clone(&ctx.clock))))
    }

    /// Whether [`SessionStore::release`] has been called.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl SessionStore for MemoryStore {
    fn id(&self) -> String {
        self.id.lock().clone()
    }

    fn set_id(&self, id: &str) {
        let mut current = self.id.lock();
        if current.is_empty() {
            *current = id.to_string();
        }
    }

    fn create_time(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn active(&self, touch: bool) -> DateTime<Utc> {
        let mut last_active = self.last_active.lock();
        if touch {
            // Never step backwards, even if the clock is reset.
            let now = self.clock.now();
            if now > *last_active {
                *last_active = now;
            }
        }
        *last_active
    }

    fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut data = self.data.write();
        // Checked under the lock: release clears the data while holding it.
        if self.is_released() {
            return Err(Error::Store(format!("session {} released", self.id())));
        }

        if let Some(max) = self.max_keys
            && !data.contains_key(key)
            && data.len() >= max
        {
            return Err(Error::Store(format!("session key limit of {max} reached")));
        }
        data.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.data.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::KeyNotFound(key.to_string())),
        }
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.data.write().clear();
            trace!(session_id = %self.id(), "Memory store released");
        }
    }
}
