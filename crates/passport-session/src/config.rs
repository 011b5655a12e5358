//! Configuration for the session manager.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Default store backend name.
pub const DEFAULT_STORE_TYPE: &str = "memory";

/// Default name of the session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "passport_sid";

/// Default idle time before a session is reclaimed (one hour).
pub const DEFAULT_IDLE_TIME: u64 = 3600;

/// Default cookie lifetime (negative: browser-session cookie).
pub const DEFAULT_COOKIE_EXPIRE: i64 = -1;

/// Configuration for a [`SessionManager`](crate::SessionManager).
///
/// Field names match the on-disk/JSON option names. The values are fixed for
/// the lifetime of the manager built from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Cookie domain. Empty means no `Domain` attribute.
    pub domain: String,

    /// Name of a registered store type.
    pub store_type: String,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Seconds of inactivity after which a session is reclaimed.
    pub idle_time: u64,

    /// Cookie `Max-Age` in seconds. Negative values produce a session cookie.
    pub cookie_expire: i64,

    /// Opaque configuration handed to the store factory unmodified.
    pub store_config: Value,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            store_type: DEFAULT_STORE_TYPE.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            idle_time: DEFAULT_IDLE_TIME,
            cookie_expire: DEFAULT_COOKIE_EXPIRE,
            store_config: Value::Null,
        }
    }
}

impl ManagerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret an untyped configuration blob.
    ///
    /// `null` and an empty object mean sessions are disabled and yield `None`.
    pub fn from_value(value: Value) -> Result<Option<Self>> {
        match &value {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            _ => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Parse a JSON configuration document. See [`ManagerConfig::from_value`].
    pub fn from_json(json: &str) -> Result<Option<Self>> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Idle threshold as a duration.
    pub fn idle_duration(&self) -> Duration {
        Duration::from_secs(self.idle_time)
    }

    /// Set the cookie domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the store type name.
    pub fn with_store_type(mut self, store_type: impl Into<String>) -> Self {
        self.store_type = store_type.into();
        self
    }

    /// Set the cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the idle time in seconds.
    pub fn with_idle_time(mut self, seconds: u64) -> Self {
        self.idle_time = seconds;
        self
    }

    /// Set the cookie max-age in seconds (negative for a session cookie).
    pub fn with_cookie_expire(mut self, seconds: i64) -> Self {
        self.cookie_expire = seconds;
        self
    }

    /// Set the store-specific configuration.
    pub fn with_store_config(mut self, config: Value) -> Self {
        self.store_config = config;
        self
    }
}
