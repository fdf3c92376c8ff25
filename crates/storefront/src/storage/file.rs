//! File-backed store: one JSON file per key.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{KeyValueStore, StorageError, validate_key};

/// A [`KeyValueStore`] that keeps each key in `<dir>/<key>.json`.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if `key` is not a valid slot name.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn write_atomic(&self, path: &Path, value: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        self.write_atomic(&path, value)
            .map_err(|source| StorageError::Io {
                key: key.to_string(),
                source,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_get_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("carts").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        store.set("carts", r#"[{"id":1}]"#).unwrap();

        assert_eq!(
            store.get("carts").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert!(dir.path().join("carts.json").exists());
    }

    #[test]
    fn test_set_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("profile").join("storage");
        let mut store = FileStore::new(&nested);

        store.set("carts", "[]").unwrap();

        assert!(nested.join("carts.json").exists());
    }

    #[test]
    fn test_set_overwrites_whole_value() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        store.set("carts", "[1,2,3,4,5,6,7,8,9]").unwrap();
        store.set("carts", "[]").unwrap();

        assert_eq!(store.get("carts").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_set_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        store.set("carts", "[]").unwrap();
        store.set("carts", "[]").unwrap();

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_rejects_path_traversal_key() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(matches!(
            store.set("../escape", "[]"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_unreadable_slot_is_error() {
        let dir = tempdir().unwrap();
        // A directory where the file should be cannot be read as a string.
        std::fs::create_dir(dir.path().join("carts.json")).unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(store.get("carts"), Err(StorageError::Io { .. })));
    }
}
