//! Persisted session store.
//!
//! Wraps the key-value persistence medium the embedder supplies (browser
//! storage, a JSON file, memory in tests) behind the [`KvStore`] seam, and
//! exposes typed accessors for everything the engine persists: the bearer
//! credential, the active-session marker, the serialized identity, and the
//! per-account dashboard snapshot and onboarding marker.
//!
//! Malformed persisted values are never fatal: they are logged, discarded,
//! and replaced with defaults on the next write. Snapshot reads go through
//! an in-memory `moka` cache so re-rendering a dashboard does not re-parse
//! the persisted document.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use moka::sync::Cache;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use upgrow_core::Email;

use crate::models::{DashboardSnapshot, Identity};

/// Snapshot cache capacity; one entry per account seen this process.
const SNAPSHOT_CACHE_CAPACITY: u64 = 64;

/// Errors that can occur when accessing the persistence medium.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value serialization failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage keys for persisted session data.
pub mod keys {
    /// Key for the bearer credential (plain string, not JSON).
    pub const AUTH_TOKEN: &str = "upgrow.auth_token";

    /// Key for the active-session marker, cleared on logout.
    pub const SESSION_ACTIVE: &str = "upgrow.session_active";

    /// Key for the serialized identity of the last authenticated account.
    pub const IDENTITY: &str = "upgrow.identity";

    /// Key for an account's dashboard snapshot.
    #[must_use]
    pub fn snapshot(email: &str) -> String {
        format!("upgrow.snapshot.{email}")
    }

    /// Key for an account's onboarding-completion marker.
    #[must_use]
    pub fn onboarding(email: &str) -> String {
        format!("upgrow.onboarding.{email}")
    }
}

/// Key-value persistence medium.
///
/// The engine only ever needs string-in, string-out semantics; the
/// embedder decides where the strings live.
pub trait KvStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns error if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and demo sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// File-backed store persisting all entries as one JSON document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store at `path`, loading existing entries if present.
    ///
    /// A missing or malformed file yields an empty store; it will be
    /// rewritten on the first `set`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "discarding malformed store file");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.remove(key);
        self.flush(&entries)
    }
}

/// Typed wrapper over the persistence medium.
///
/// All accessors degrade instead of propagating storage failures: reads of
/// missing or malformed values yield `None`/defaults, failed writes are
/// logged and dropped. The persisted cache is a convenience layer, never a
/// correctness dependency - the backend remains the source of truth.
#[derive(Clone)]
pub struct SessionStore {
    medium: Arc<dyn KvStore>,
    snapshots: Cache<String, DashboardSnapshot>,
}

impl SessionStore {
    /// Wrap a persistence medium.
    #[must_use]
    pub fn new(medium: Arc<dyn KvStore>) -> Self {
        Self {
            medium,
            snapshots: Cache::new(SNAPSHOT_CACHE_CAPACITY),
        }
    }

    // -------------------------------------------------------------------------
    // Bearer credential (plain string, not JSON)
    // -------------------------------------------------------------------------

    /// Load the persisted bearer credential.
    #[must_use]
    pub fn load_token(&self) -> Option<String> {
        self.get_raw(keys::AUTH_TOKEN)
    }

    /// Persist the bearer credential.
    pub fn save_token(&self, token: &str) {
        self.set_raw(keys::AUTH_TOKEN, token);
    }

    /// Remove the persisted bearer credential.
    pub fn clear_token(&self) {
        self.remove_raw(keys::AUTH_TOKEN);
    }

    // -------------------------------------------------------------------------
    // Active-session marker
    // -------------------------------------------------------------------------

    /// Whether a session was active when the process last ran.
    #[must_use]
    pub fn session_active(&self) -> bool {
        self.get_raw(keys::SESSION_ACTIVE).is_some()
    }

    /// Set or clear the active-session marker.
    pub fn set_session_active(&self, active: bool) {
        if active {
            self.set_raw(keys::SESSION_ACTIVE, "1");
        } else {
            self.remove_raw(keys::SESSION_ACTIVE);
        }
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Load the last persisted identity. Malformed records yield `None`.
    #[must_use]
    pub fn load_identity(&self) -> Option<Identity> {
        self.get_json(keys::IDENTITY)
    }

    /// Persist the identity record.
    pub fn save_identity(&self, identity: &Identity) {
        self.set_json(keys::IDENTITY, identity);
    }

    // -------------------------------------------------------------------------
    // Dashboard snapshot (per account)
    // -------------------------------------------------------------------------

    /// Load an account's snapshot, if one was ever persisted.
    #[must_use]
    pub fn load_snapshot(&self, email: &Email) -> Option<DashboardSnapshot> {
        let key = keys::snapshot(&email.normalized());
        if let Some(hit) = self.snapshots.get(&key) {
            return Some(hit);
        }
        let snapshot: Option<DashboardSnapshot> = self.get_json(&key);
        if let Some(snapshot) = &snapshot {
            self.snapshots.insert(key, snapshot.clone());
        }
        snapshot
    }

    /// Persist an account's snapshot.
    pub fn save_snapshot(&self, email: &Email, snapshot: &DashboardSnapshot) {
        let key = keys::snapshot(&email.normalized());
        self.snapshots.insert(key.clone(), snapshot.clone());
        self.set_json(&key, snapshot);
    }

    // -------------------------------------------------------------------------
    // Onboarding marker (per account)
    // -------------------------------------------------------------------------

    /// Whether the account has completed onboarding.
    #[must_use]
    pub fn onboarding_complete(&self, email: &Email) -> bool {
        self.get_json::<bool>(&keys::onboarding(&email.normalized()))
            .unwrap_or(false)
    }

    /// Mark the account's onboarding as complete.
    pub fn mark_onboarding_complete(&self, email: &Email) {
        self.set_json(&keys::onboarding(&email.normalized()), &true);
    }

    // -------------------------------------------------------------------------
    // Raw/JSON helpers
    // -------------------------------------------------------------------------

    fn get_raw(&self, key: &str) -> Option<String> {
        match self.medium.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read persisted value");
                None
            }
        }
    }

    fn set_raw(&self, key: &str, value: &str) {
        if let Err(e) = self.medium.set(key, value) {
            warn!(key, error = %e, "failed to persist value");
        }
    }

    fn remove_raw(&self, key: &str) {
        if let Err(e) = self.medium.remove(key) {
            warn!(key, error = %e, "failed to remove persisted value");
        }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding malformed persisted value");
                None
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, &raw),
            Err(e) => warn!(key, error = %e, "failed to serialize value"),
        }
    }
}
