//! Local Storage
//!
//! A string-keyed store of JSON documents standing in for browser local storage. State that
//! fails to parse is discarded rather than surfaced, so a corrupt entry can never wedge the shop.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::warn;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error reading or writing an entry
    #[error("storage IO error for key {key}: {source}")]
    Io {
        /// Key being accessed
        key: String,

        /// Underlying error
        source: std::io::Error,
    },

    /// The stored bytes are not text
    #[error("stored value for key {key} is not valid UTF-8")]
    Unreadable {
        /// Key being read
        key: String,
    },

    /// Keys may not be empty or contain path separators
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A value could not be serialized
    #[error("failed to serialize value for key {key}: {source}")]
    Serialize {
        /// Key being written
        key: String,

        /// Underlying error
        source: serde_json::Error,
    },
}

/// A string-keyed value store.
pub trait KeyValueStore {
    /// Read the raw value stored under a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store a raw value, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Names of the entries the shop keeps in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Signed-in user profile
    pub user: String,

    /// Session token
    pub token: String,

    /// Cart lines
    pub cart: String,

    /// Wishlist entries
    pub wishlist: String,

    /// Recent search terms
    pub recent_searches: String,
}

impl StorageKeys {
    /// Build the key set for a namespace prefix, e.g. `kirby-shop-cart`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            user: format!("{prefix}-user"),
            token: format!("{prefix}-token"),
            cart: format!("{prefix}-cart"),
            wishlist: format!("{prefix}-wishlist"),
            recent_searches: format!("{prefix}-recent-searches"),
        }
    }

    /// Keys holding the signed-in session.
    pub fn session(&self) -> [&str; 2] {
        [&self.user, &self.token]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("kirby-shop")
    }
}

/// Read and deserialize a JSON entry.
///
/// A missing entry yields `T::default()`. An entry that fails to parse is logged, removed from the
/// store and also yields the default.
///
/// # Errors
///
/// Returns an error only if the store itself cannot be accessed.
pub fn read_json<T, S>(store: &mut S, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    Ok(read_json_opt(store, key)?.unwrap_or_default())
}

/// Like [`read_json`], but distinguishes a missing or discarded entry as `None`.
///
/// # Errors
///
/// Returns an error only if the store itself cannot be accessed.
pub fn read_json_opt<T, S>(store: &mut S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Ok(None),
        Err(StorageError::Unreadable { .. }) => {
            warn!(key, "discarding stored value that is not text");

            store.remove(key)?;

            return Ok(None);
        }
        Err(error) => return Err(error),
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(error) => {
            warn!(key, %error, "discarding unreadable stored value");

            store.remove(key)?;

            Ok(None)
        }
    }
}

/// Serialize a value as JSON and store it.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or the store cannot be written.
pub fn write_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;

    store.set(key, &raw)
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn keys_use_prefix() {
        let keys = StorageKeys::default();

        assert_eq!(keys.cart, "kirby-shop-cart");
        assert_eq!(keys.wishlist, "kirby-shop-wishlist");
        assert_eq!(keys.session(), ["kirby-shop-user", "kirby-shop-token"]);
    }

    #[test]
    fn read_json_defaults_when_missing() -> TestResult {
        let mut store = MemoryStore::default();

        let value: Vec<u32> = read_json(&mut store, "missing")?;

        assert!(value.is_empty());

        Ok(())
    }

    #[test]
    fn write_then_read_json() -> TestResult {
        let mut store = MemoryStore::default();

        write_json(&mut store, "numbers", &vec![1_u32, 2, 3])?;

        let value: Vec<u32> = read_json(&mut store, "numbers")?;

        assert_eq!(value, vec![1, 2, 3]);

        Ok(())
    }

    #[test]
    fn corrupt_json_is_discarded() -> TestResult {
        let mut store = MemoryStore::default();
        store.set("numbers", "{not json")?;

        let value: Vec<u32> = read_json(&mut store, "numbers")?;

        assert!(value.is_empty());
        assert_eq!(store.get("numbers")?, None);

        Ok(())
    }

    #[test]
    fn validate_key_rejects_paths() {
        assert!(validate_key("kirby-shop-cart").is_ok());
        assert!(matches!(
            validate_key("../etc"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
    }
}
