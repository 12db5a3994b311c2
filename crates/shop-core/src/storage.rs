//! # Persistent Store
//!
//! Durable key/value storage that survives process restarts. Holds the
//! session token, its expiry, the cached profile fields and the pending
//! checkout payload.
//!
//! Two implementations ship with the crate:
//! - [`MemoryStore`] for tests and embedding
//! - [`FileStore`], a JSON file rewritten atomically on every mutation

use crate::error::{ShopError, ShopResult};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Well-known store keys
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const EXPIRY: &str = "expiry";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const PIN: &str = "pin";
    pub const EMAIL: &str = "email";

    /// Single slot holding the serialized delivery form across the payment redirect
    pub const PENDING_CHECKOUT: &str = "orderFormData";

    /// Every key owned by the session manager
    pub const SESSION_KEYS: [&str; 9] = [
        TOKEN, EXPIRY, FIRST_NAME, LAST_NAME, ADDRESS, CITY, STATE, PIN, EMAIL,
    ];
}

/// Process-local durable key/value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> ShopResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ShopResult<()>;

    fn remove(&self, key: &str) -> ShopResult<()>;
}

/// Type alias for a shared store (dynamic dispatch)
pub type SharedStore = Arc<dyn KeyValueStore>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ShopResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ShopResult<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ShopResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// JSON-file backed store.
///
/// The whole map is kept in memory and written through on every mutation via
/// a temp file and rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// or corrupt file is logged and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring corrupt store file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read store file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        debug!("Opened store {} with {} keys", path.display(), entries.len());

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> ShopResult<()> {
        let content = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ShopError::Persistence(format!("create {}: {}", parent.display(), e))
            })?;
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content)
            .map_err(|e| ShopError::Persistence(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            ShopError::Persistence(format!("rename to {}: {}", self.path.display(), e))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ShopResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ShopResult<()> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> ShopResult<()> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
