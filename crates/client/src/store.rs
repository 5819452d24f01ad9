//! Credential persistence.
//!
//! The store holds exactly two values: the current bearer credential and a
//! minimal identity snapshot used as a rendering hint. The renewal token never
//! lands here; it lives in the transport's cookie jar.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use quizhub_auth::{Identity, IdentitySnapshot};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_INFO_KEY: &str = "user_info";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-write leaves the map itself intact.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-lifetime store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// JSON-file store that survives restarts.
///
/// The whole map is rewritten on every change (temp file + rename), so a
/// crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let raw = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Opaque bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Shared handle to the process-wide credential store.
///
/// Reads that fail are logged and treated as "no credential"; clearing never
/// fails from the caller's point of view, since sign-out must always succeed.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl core::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("has_credential", &self.has_credential())
            .finish()
    }
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn credential(&self) -> Option<Credential> {
        match self.backend.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(Credential),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read credential; treating as signed out");
                None
            }
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    /// Supersede the current credential for every subsequent request.
    pub fn set_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.backend.set(ACCESS_TOKEN_KEY, credential.as_str())
    }

    /// Cached identity hint. Never use it for authorization.
    pub fn snapshot(&self) -> Option<IdentitySnapshot> {
        let raw = match self.backend.get(USER_INFO_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read identity snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable identity snapshot");
                None
            }
        }
    }

    pub fn save_snapshot(&self, identity: &Identity) {
        let result = serde_json::to_string(&identity.snapshot())
            .map_err(|e| e.to_string())
            .and_then(|raw| self.backend.set(USER_INFO_KEY, &raw).map_err(|e| e.to_string()));
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist identity snapshot");
        }
    }

    /// Remove the credential and the snapshot.
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, USER_INFO_KEY] {
            if let Err(err) = self.backend.remove(key) {
                tracing::error!(error = %err, key, "failed to clear stored session value");
            }
        }
    }
}
