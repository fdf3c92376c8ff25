//! Key-value persistence slot for client-side state.
//!
//! The cart lives in a single slot under a fixed key, serialized as JSON.
//! [`KeyValueStore`] is the seam between the cart and whatever holds that slot:
//!
//! - [`FileStore`] - one file per key in a data directory (production)
//! - [`MemoryStore`] - a `HashMap`, for tests and ephemeral carts
//!
//! Implementations overwrite the whole value on `set`; there is no partial
//! update.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur when reading or writing a slot.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key contains characters that are not allowed in a slot name.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Underlying I/O failed.
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// A string-valued key-value store.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the slot exists but cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the value could not be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Slot names are restricted to `[A-Za-z0-9_-]` so they map safely onto
/// file names.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("carts").is_ok());
        assert!(validate_key("cart_v2-backup").is_ok());
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(
            validate_key("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("with space"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
