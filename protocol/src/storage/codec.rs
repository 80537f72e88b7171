//! Typed access to a [`KeyValueStore`] through bincode.
//!
//! Bincode is compact and deterministic, which is what we want on disk.
//! JSON stays at the edges (call arguments, HTTP).

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{KeyValueStore, StorageError, StorageResult};

/// Serializes `value` into its stored byte form.
pub fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Deserializes a stored byte form back into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Reads and decodes the value under `key`. `Ok(None)` if the key is absent.
pub fn read<S, T>(store: &S, key: &str) -> StorageResult<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(bytes) => decode(&bytes).map(Some),
        None => Ok(None),
    }
}

/// Reads and decodes the value under `key`, failing with
/// [`StorageError::NotFound`] if it is absent.
pub fn read_required<S, T>(store: &S, key: &str) -> StorageResult<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    read(store, key)?.ok_or_else(|| StorageError::NotFound(key.to_string()))
}

/// Encodes and writes `value` under `key`.
pub fn write<S, T>(store: &mut S, key: &str, value: &T) -> StorageResult<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    store.set(key, encode(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::collections::BTreeSet;

    #[test]
    fn typed_write_then_read() {
        let mut store = MemoryStore::new();
        write(&mut store, "balance", &1_000_000_000_000_000_000_000_000u128).unwrap();

        let balance: Option<u128> = read(&store, "balance").unwrap();
        assert_eq!(balance, Some(1_000_000_000_000_000_000_000_000));
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        let value: Option<u64> = read(&store, "nope").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn read_required_reports_the_missing_key() {
        let store = MemoryStore::new();
        let err = read_required::<_, u64>(&store, "owner").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref k) if k == "owner"));
    }

    #[test]
    fn corrupt_bytes_surface_as_serialization_error() {
        let mut store = MemoryStore::new();
        store.set("set", vec![0xFF]).unwrap();
        let err = read::<_, BTreeSet<String>>(&store, "set").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
