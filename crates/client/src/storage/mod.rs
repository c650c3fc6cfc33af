//! Persistent key-value storage shared by the cache, cart and auth stores.
//!
//! # Architecture
//!
//! Storage is a synchronous string-to-string map with the semantics of a
//! browser's `localStorage`: per-process singleton, capacity limited, and
//! allowed to fail. Every caller treats a failure as "not persisted" and logs
//! it; storage errors never reach the user.
//!
//! Key namespaces in use:
//! - `eathub_cache_*` - [`crate::cache::TtlCache`] entries
//! - `eathub_cart` - [`crate::store::cart::CartStore`]
//! - `eathub_token`, `eathub_user` - [`crate::store::auth::AuthStore`]

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors a storage backend may report.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the backend's capacity.
    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A synchronous string key-value store.
pub trait Storage: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend is full or cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}
