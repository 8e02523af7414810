//! Local persistence of highlight times.
//!
//! The store is a flat string key-value surface behind the
//! [`KeyValueStore`] port; `TimingStore` layers validation on top so
//! that anything malformed on disk degrades to "record absent" instead
//! of surfacing an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Flat key-value port. Values are opaque strings (JSON by convention).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store for tests and transient players.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON object file holding every key. Loaded lazily, rewritten on
/// each mutation. The write pattern is a whole-file overwrite, which
/// is all the "last write wins" contract requires.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store file. A missing or unreadable
    /// file starts the store empty rather than failing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Storage key for a chapter's highlight times.
pub fn storage_key(namespace: &str, book: &str, chapter: u32) -> String {
    format!("{namespace}:{}:{chapter}:highlightTimes", book.to_lowercase())
}

/// Validating wrapper around a [`KeyValueStore`].
pub struct TimingStore<S: KeyValueStore> {
    inner: S,
}

impl<S: KeyValueStore> TimingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Load a stored highlight-times array. Returns `None` on any
    /// defect (parse failure, wrong shape, length mismatch, or a
    /// non-finite/negative element) so callers always have a clean
    /// fallback-to-default path.
    pub fn load(&self, key: &str, expected_len: usize) -> Option<Vec<f64>> {
        let raw = self.inner.get(key)?;
        let times: Vec<f64> = serde_json::from_str(&raw).ok()?;
        if times.len() != expected_len {
            return None;
        }
        if times.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return None;
        }
        Some(times)
    }

    /// Unconditionally overwrite the stored value. The caller is
    /// responsible for pre-validating `times`.
    pub fn save(&mut self, key: &str, times: &[f64]) -> Result<()> {
        let raw = serde_json::to_string(times)?;
        self.inner.set(key, &raw)
    }

    pub fn clear(&mut self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_shape() {
        assert_eq!(
            storage_key("scripture", "Mark", 4),
            "scripture:mark:4:highlightTimes"
        );
    }

    #[test]
    fn round_trips_a_valid_array() {
        let mut store = TimingStore::new(MemoryStore::new());
        let times = vec![0.0, 5.25, 9.875];
        store.save("k", &times).unwrap();
        assert_eq!(store.load("k", 3), Some(times));
    }

    #[test]
    fn length_mismatch_reads_as_absent() {
        let mut store = TimingStore::new(MemoryStore::new());
        store.inner.set("k", "[1,2]").unwrap();
        assert_eq!(store.load("k", 3), None);
    }

    #[test]
    fn malformed_json_reads_as_absent() {
        let mut store = TimingStore::new(MemoryStore::new());
        store.inner.set("k", "{not json").unwrap();
        assert_eq!(store.load("k", 1), None);
        store.inner.set("k", r#"{"times":[1]}"#).unwrap();
        assert_eq!(store.load("k", 1), None);
    }

    #[test]
    fn negative_or_non_finite_elements_read_as_absent() {
        let mut store = TimingStore::new(MemoryStore::new());
        store.inner.set("k", "[0, -1.5]").unwrap();
        assert_eq!(store.load("k", 2), None);
        store.inner.set("k", "[0, null]").unwrap();
        assert_eq!(store.load("k", 2), None);
    }

    #[test]
    fn clear_removes_the_record() {
        let mut store = TimingStore::new(MemoryStore::new());
        store.save("k", &[1.0]).unwrap();
        store.clear("k").unwrap();
        assert_eq!(store.load("k", 1), None);
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = TimingStore::new(JsonFileStore::open(&path));
        store.save("scripture:mark:1:highlightTimes", &[0.0, 7.5]).unwrap();
        drop(store);

        let reopened = TimingStore::new(JsonFileStore::open(&path));
        assert_eq!(
            reopened.load("scripture:mark:1:highlightTimes", 2),
            Some(vec![0.0, 7.5])
        );
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "!! not json !!").unwrap();

        let store = TimingStore::new(JsonFileStore::open(&path));
        assert_eq!(store.load("anything", 1), None);
    }
}
