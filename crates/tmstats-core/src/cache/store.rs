//! Persistent key/value storage for cache entries.
//!
//! `KeyValueStore` is the raw string store (a directory of files, or an
//! in-memory map). `PersistentStore` is the adapter the resource caches
//! talk to: it serializes entries, enforces the byte budget, and turns
//! every storage failure into "no entry".

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::entry::CacheEntry;

/// Largest serialized entry the adapter will write.
/// Kept well under common ~5 MB quotas so other keys still fit.
pub const DEFAULT_BUDGET_BYTES: usize = 2_400_000;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("Payload of {bytes} bytes exceeds the {budget} byte budget")]
    Oversized { bytes: usize, budget: usize },

    #[error("Corrupt entry: {0}")]
    Corrupt(String),

    #[error("Failed to serialize entry: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Raw string storage, shaped like a browser's per-origin storage.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

// ============================================================================
// FileStore
// ============================================================================

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let bytes = match fs::read(self.path_for(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        if let Err(e) = file.write_all(value.as_bytes()).and_then(|_| file.sync_all()) {
            let _ = fs::remove_file(&temp_path);
            return Err(match e.raw_os_error() {
                // ENOSPC / EDQUOT
                Some(28) | Some(122) => StorageError::QuotaExceeded {
                    key: key.to_string(),
                },
                _ => e.into(),
            });
        }
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(decode_key)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Percent-encode everything outside `[A-Za-z0-9._-]` so keys like
/// `corp:all:v1` are valid file names on every platform.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory store with an optional total byte quota.
///
/// Used in tests and as the fallback when no cache directory is usable.
/// It can also be switched off entirely, in which case every call fails
/// the way disabled browser storage does.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    disabled: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push keys plus values past `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }

    fn items(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        Ok(self.items.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items()?;
        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.items()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

// ============================================================================
// PersistentStore
// ============================================================================

/// Entry-level adapter over a shared `KeyValueStore`.
///
/// Every operation may fail internally; every failure is logged at warn
/// level and degrades to "as if no persistent entry exists".
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn KeyValueStore>,
    budget_bytes: usize,
}

impl PersistentStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            budget_bytes: DEFAULT_BUDGET_BYTES,
        }
    }

    pub fn with_budget(mut self, budget_bytes: usize) -> Self {
        self.budget_bytes = budget_bytes;
        self
    }

    /// Read and decode the entry at `key`.
    ///
    /// An entry that does not decode as `CacheEntry<T>` is deleted so the
    /// same bytes are never parsed twice.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        match self.try_read(key) {
            Ok(entry) => entry,
            Err(StorageError::Corrupt(reason)) => {
                warn!(key = %key, reason = %reason, "Discarding corrupt cache entry");
                self.remove(key);
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache entry");
                None
            }
        }
    }

    /// Like `read`, but never deletes anything.
    pub fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        match self.try_read(key) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = %key, error = %e, "Cache entry not readable");
                None
            }
        }
    }

    fn try_read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>, StorageError> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    /// Serialize and store `entry` under `key`, replacing any prior value.
    ///
    /// Payloads over the byte budget are refused up front and leave the
    /// prior value untouched. Any other failure removes the key.
    pub fn write<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        match self.try_write(key, entry) {
            Ok(bytes) => debug!(key = %key, bytes, "Persisted cache entry"),
            Err(e @ StorageError::Oversized { .. }) => {
                warn!(key = %key, error = %e, "Not persisting cache entry");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to persist cache entry");
                self.remove(key);
            }
        }
    }

    fn try_write<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) -> Result<usize, StorageError> {
        let json = serde_json::to_string(entry).map_err(StorageError::Serialize)?;
        let bytes = json.len();
        if bytes > self.budget_bytes {
            return Err(StorageError::Oversized {
                bytes,
                budget: self.budget_bytes,
            });
        }
        self.backend.set_item(key, &json)?;
        Ok(bytes)
    }

    /// Best-effort delete.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove_item(key) {
            warn!(key = %key, error = %e, "Failed to remove cache entry");
        }
    }
}
