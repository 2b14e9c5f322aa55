//! File-backed store
//!
//! Each key is stored as `<key>.json` inside one directory.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::{KeyValueStore, StorageError, validate_key};

/// A [`KeyValueStore`] keeping one file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at a directory, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();

        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;

        Ok(Self { root })
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;

        Ok(self.root.join(format!("{key}.json")))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(io_error(key, error)),
        };

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_err| StorageError::Unreadable {
                key: key.to_string(),
            })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        fs::write(path, value).map_err(|error| io_error(key, error))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(key, error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn entries_are_files_under_root() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path().join("state"))?;

        store.set("kirby-shop-cart", "[]")?;

        assert_eq!(
            fs::read_to_string(dir.path().join("state/kirby-shop-cart.json"))?,
            "[]"
        );
        assert_eq!(store.get("kirby-shop-cart")?.as_deref(), Some("[]"));

        store.remove("kirby-shop-cart")?;

        assert_eq!(store.get("kirby-shop-cart")?, None);

        Ok(())
    }

    #[test]
    fn binary_content_is_unreadable() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileStore::open(dir.path())?;

        fs::write(dir.path().join("kirby-shop-cart.json"), [0xff, 0xfe, 0x5b])?;

        assert!(matches!(
            store.get("kirby-shop-cart"),
            Err(StorageError::Unreadable { key }) if key == "kirby-shop-cart"
        ));

        Ok(())
    }

    #[test]
    fn removing_missing_key_is_ok() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;

        store.remove("nothing")?;

        Ok(())
    }
}
