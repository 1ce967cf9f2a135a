//! Server-side session storage.
//!
//! Sessions are opaque string key/value maps addressed by a session id. The cart
//! and the signed-in identity are the only values the service keeps there.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, AppResult};

pub const CART_KEY: &str = "cart";
pub const USER_ID_KEY: &str = "user_id";
pub const USERNAME_KEY: &str = "username";
pub const ROLE_KEY: &str = "role";

/// Narrow key/value interface over per-session state. Writes are last-writer-wins.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str, key: &str) -> Option<String>;
    fn set(&self, session_id: &str, key: &str, value: String);
    fn remove(&self, session_id: &str, key: &str);
    fn clear(&self, session_id: &str);
    /// Whether the store still holds anything for the session.
    fn contains(&self, session_id: &str) -> bool;
    /// Drop expired sessions and return their ids.
    fn purge_expired(&self) -> Vec<String>;
}

struct SessionEntry {
    values: HashMap<String, String>,
    last_access: Instant,
}

/// Process-local store with an idle timeout refreshed on every access.
pub struct MemorySessionStore {
    entries: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str, key: &str) -> Option<String> {
        let mut entry = self.entries.get_mut(session_id)?;
        if entry.last_access.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(session_id);
            return None;
        }
        entry.last_access = Instant::now();
        entry.values.get(key).cloned()
    }

    fn set(&self, session_id: &str, key: &str, value: String) {
        let mut entry = self
            .entries
            .entry(session_id.to_owned())
            .or_insert_with(|| SessionEntry {
                values: HashMap::new(),
                last_access: Instant::now(),
            });
        if entry.last_access.elapsed() > self.ttl {
            entry.values.clear();
        }
        entry.last_access = Instant::now();
        entry.values.insert(key.to_owned(), value);
    }

    fn remove(&self, session_id: &str, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(session_id) {
            entry.values.remove(key);
            entry.last_access = Instant::now();
        }
    }

    fn clear(&self, session_id: &str) {
        self.entries.remove(session_id);
    }

    fn contains(&self, session_id: &str) -> bool {
        self.entries.contains_key(session_id)
    }

    fn purge_expired(&self) -> Vec<String> {
        let ttl = self.ttl;
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.last_access.elapsed() > ttl)
            .map(|entry| entry.key().clone())
            .collect();
        for id in &expired {
            self.entries
                .remove_if(id, |_, entry| entry.last_access.elapsed() > ttl);
        }
        expired
    }
}

/// Shared handle used by handlers and services: the store plus one async mutex per
/// session so read-modify-write sequences on the same session run one at a time.
#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemorySessionStore::new(ttl)))
    }

    /// Serialize mutations of one session. Hold the guard across the whole
    /// load/modify/store sequence.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(session_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    pub fn get(&self, session_id: &str, key: &str) -> Option<String> {
        self.store.get(session_id, key)
    }

    pub fn set(&self, session_id: &str, key: &str, value: impl Into<String>) {
        self.store.set(session_id, key, value.into());
    }

    pub fn remove(&self, session_id: &str, key: &str) {
        self.store.remove(session_id, key);
    }

    pub fn clear(&self, session_id: &str) {
        self.store.clear(session_id);
    }

    pub fn get_json<T: DeserializeOwned>(&self, session_id: &str, key: &str) -> AppResult<Option<T>> {
        match self.store.get(session_id, key) {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt session value {key}: {e}"))),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, session_id: &str, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        self.store.set(session_id, key, raw);
        Ok(())
    }

    /// Purge expired sessions, then drop every idle lock whose session no longer has
    /// stored state (expired, cleared on logout, or never written). Returns how many
    /// sessions expired.
    pub fn purge_expired(&self) -> usize {
        let expired = self.store.purge_expired().len();
        self.locks
            .retain(|id, lock| Arc::strong_count(lock) > 1 || self.store.contains(id));
        expired
    }
}
