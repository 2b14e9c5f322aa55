//! In-memory store

use rustc_hash::FxHashMap;

use super::{KeyValueStore, StorageError, validate_key};

/// A [`KeyValueStore`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;

        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        self.entries.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        self.entries.remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn set_get_remove() -> TestResult {
        let mut store = MemoryStore::default();

        store.set("a", "1")?;
        store.set("a", "2")?;

        assert_eq!(store.get("a")?.as_deref(), Some("2"));
        assert_eq!(store.len(), 1);

        store.remove("a")?;
        store.remove("a")?;

        assert!(store.is_empty());

        Ok(())
    }
}
