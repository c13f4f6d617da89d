//! Durable cell storage: the interface the announcer persists through, and
//! an in-memory reference implementation for tests and embedders that don't
//! need real durability.

use std::collections::HashMap;

use crate::hash::Hash;

/// A content-addressed store of cell encodings. Implementations need not be
/// transactional across `put` calls: every value stored under a given hash
/// is, by construction, the unique canonical encoding that hashes to it, so
/// concurrent writers racing to `put` the same hash always agree on the
/// bytes.
pub trait Store {
    fn get(&self, hash: &Hash) -> Option<Vec<u8>>;
    fn put(&mut self, hash: Hash, encoding: Vec<u8>);
    fn contains(&self, hash: &Hash) -> bool {
        self.get(hash).is_some()
    }
    fn root_hash(&self) -> Option<Hash>;
    fn set_root_hash(&mut self, hash: Hash);
}

/// Reference [`Store`] backed by a `HashMap`. Suitable for tests and for
/// embedders that only need an in-process cache, not durability across
/// restarts.
#[derive(Debug, Default)]
pub struct MemStore {
    encodings: HashMap<Hash, Vec<u8>>,
    root: Option<Hash>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }
}

impl Store for MemStore {
    fn get(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.encodings.get(hash).cloned()
    }

    fn put(&mut self, hash: Hash, encoding: Vec<u8>) {
        self.encodings.entry(hash).or_insert(encoding);
    }

    fn root_hash(&self) -> Option<Hash> {
        self.root
    }

    fn set_root_hash(&mut self, hash: Hash) {
        self.root = Some(hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn put_then_get_round_trips() {
        let mut store = MemStore::new();
        let cell = Cell::long(42);
        store.put(cell.hash(), cell.encoding().to_vec());
        assert_eq!(store.get(&cell.hash()), Some(cell.encoding().to_vec()));
    }

    #[test]
    fn missing_hash_reports_none() {
        let store = MemStore::new();
        assert_eq!(store.get(&Hash::of(b"absent")), None);
    }

    #[test]
    fn root_hash_tracks_last_set_value() {
        let mut store = MemStore::new();
        assert_eq!(store.root_hash(), None);
        let cell = Cell::long(1);
        store.set_root_hash(cell.hash());
        assert_eq!(store.root_hash(), Some(cell.hash()));
    }
}
