//! # Storage Module
//!
//! The key-value port every contract persists through, plus two backends.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs    — KeyValueStore trait, StorageError
//! codec.rs  — bincode encode/decode at the storage boundary
//! memory.rs — BTreeMap-backed store for tests and ephemeral hosts
//! db.rs     — sled-backed persistent store
//! ```
//!
//! Contracts address storage with string keys. Values are opaque bytes at the
//! port; typing happens in [`codec`], so business logic never sees bincode.
//!
//! ## Atomicity
//!
//! A receipt that changes several slots writes them with one
//! [`KeyValueStore::write_batch`]. The sled backend applies the batch
//! atomically; the memory backend is trivially atomic because nothing can
//! observe it mid-batch.

pub mod codec;
pub mod db;
pub mod memory;

pub use db::SledStore;
pub use memory::MemoryStore;

/// Errors that can occur at the storage boundary.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key not found: {0}")]
    NotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A flat, string-keyed byte store.
///
/// This is the only persistence capability a contract receives. Reads take
/// `&self`; writes take `&mut self` so that the owner of the store decides
/// how receipts are serialized.
pub trait KeyValueStore {
    /// Reads the value under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Vec<u8>) -> StorageResult<()>;

    /// Returns `true` if a value exists under `key`.
    fn has_key(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Writes every entry. Backends that can do so apply the whole batch
    /// atomically; the default falls back to sequential `set` calls.
    fn write_batch(&mut self, entries: Vec<(&str, Vec<u8>)>) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn has_key(&self, key: &str) -> StorageResult<bool> {
        (**self).has_key(key)
    }

    fn write_batch(&mut self, entries: Vec<(&str, Vec<u8>)>) -> StorageResult<()> {
        (**self).write_batch(entries)
    }
}
