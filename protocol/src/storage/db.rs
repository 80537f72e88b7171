//! # SledStore — Persistent Storage Engine
//!
//! The persistence layer for a hosted contract, built on sled's embedded
//! key-value store. All on-disk contract state flows through this module.
//!
//! ## Tree Layout
//!
//! Contract storage lives in a single named tree ([`STORAGE_TREE_NAME`]).
//! Keys are the contract's UTF-8 slot names; values are whatever bytes the
//! contract hands the port (bincode, in practice):
//!
//! | Tree     | Key               | Value                     |
//! |----------|-------------------|---------------------------|
//! | `ledger` | slot name (UTF-8) | `bincode(slot value)`     |
//!
//! ## Atomicity
//!
//! [`KeyValueStore::write_batch`] maps onto a sled `Batch`: either every slot
//! of a receipt lands on disk or none does. Each write is followed by a flush
//! so that an acknowledged receipt survives a crash.

use sled::{Batch, Db, Tree};
use std::path::Path;

use super::{KeyValueStore, StorageResult};
use crate::config::STORAGE_TREE_NAME;

/// Persistent [`KeyValueStore`] backed by sled.
///
/// # Thread Safety
///
/// sled handles are cheap to clone and internally synchronized, but the
/// storage port still takes `&mut self` for writes. Hosts that share a store
/// serialize receipts themselves.
#[derive(Debug, Clone)]
pub struct SledStore {
    /// The underlying sled database handle.
    db: Db,
    /// Contract slots keyed by name.
    slots: Tree,
}

impl SledStore {
    /// Open or create a database at the given filesystem path.
    ///
    /// If the directory doesn't exist, sled creates it. If the database
    /// already exists, it's opened and all existing data is available
    /// immediately.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is cleaned up automatically when the
    /// store is dropped.
    pub fn open_temporary() -> StorageResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StorageResult<Self> {
        let slots = db.open_tree(STORAGE_TREE_NAME)?;
        Ok(Self { db, slots })
    }

    /// Number of slots currently stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slot has been written.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.slots.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.slots.insert(key.as_bytes(), value)?;
        self.flush()
    }

    fn has_key(&self, key: &str) -> StorageResult<bool> {
        Ok(self.slots.contains_key(key.as_bytes())?)
    }

    fn write_batch(&mut self, entries: Vec<(&str, Vec<u8>)>) -> StorageResult<()> {
        let mut batch = Batch::default();
        for (key, value) in entries {
            batch.insert(key.as_bytes(), value);
        }
        self.slots.apply_batch(batch)?;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::codec;

    #[test]
    fn temporary_store_roundtrips_slots() {
        let mut store = SledStore::open_temporary().unwrap();
        assert!(store.is_empty());

        store.set("owner", b"alice.near".to_vec()).unwrap();
        assert!(store.has_key("owner").unwrap());
        assert!(!store.has_key("balance").unwrap());
        assert_eq!(store.get("owner").unwrap(), Some(b"alice.near".to_vec()));
    }

    #[test]
    fn write_batch_lands_every_slot() {
        let mut store = SledStore::open_temporary().unwrap();
        store
            .write_batch(vec![("owner", vec![1, 2]), ("balance", vec![3])])
            .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("balance").unwrap(), Some(vec![3]));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = SledStore::open(dir.path()).unwrap();
            codec::write(&mut store, "balance", &42u128).unwrap();
        }
        let store = SledStore::open(dir.path()).unwrap();
        let balance: Option<u128> = codec::read(&store, "balance").unwrap();
        assert_eq!(balance, Some(42));
    }
}
