//! Store registry: name to factory mapping for pluggable backends.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::{MEMORY_STORE, MemoryStore};
use crate::store::{Session, StoreContext};

/// Constructor for a store backend.
pub type StoreFactory = Arc<dyn Fn(&StoreContext<'_>) -> Result<Session> + Send + Sync>;

/// Mapping from store type name to factory.
///
/// Registration happens at initialization time. Registering the same name
/// twice is a programming error and panics; lookups afterwards are cheap
/// read-locked map accesses.
pub struct StoreRegistry {
    factories: RwLock<HashMap<String, StoreFactory>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with the built-in backends registered.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register(MEMORY_STORE, MemoryStore::factory);
        registry
    }

    /// The process-wide registry, with the built-in backends registered.
    pub fn global() -> Arc<StoreRegistry> {
        static GLOBAL: OnceLock<Arc<StoreRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(StoreRegistry::with_builtin()))
            .clone()
    }

    /// Register a factory under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or already registered.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn(&StoreContext<'_>) -> Result<Session> + Send + Sync + 'static,
    {
        if name.is_empty() {
            panic!("Register session store with empty name");
        }

        let mut factories = self.factories.write();
        if factories.contains_key(name) {
            panic!("Register session store duplicate for {name}");
        }
        factories.insert(name.to_string(), Arc::new(factory));
        debug!(store_type = %name, "Session store registered");
    }

    /// Build a new store of type `name`.
    ///
    /// Factory errors are returned unchanged.
    pub fn create(&self, name: &str, ctx: &StoreContext<'_>) -> Result<Session> {
        // Clone the factory out so it runs without the registry lock held.
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownStoreType(name.to_string()))?;
        factory(ctx)
    }

    /// Whether a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Registered store type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("types", &self.names())
            .finish()
    }
}

/// Register a store factory in the process-wide registry.
///
/// # Panics
///
/// Panics if `name` is empty or already registered.
pub fn register_store<F>(name: &str, factory: F)
where
    F: Fn(&StoreContext<'_>) -> Result<Session> + Send + Sync + 'static,
{
    StoreRegistry::global().register(name, factory);
}
