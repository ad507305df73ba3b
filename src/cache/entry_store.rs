//! Entry Store Module
//!
//! Holds the serialized value blobs in recency order.

use crate::cache::ordered::OrderedIndex;

// == Entry Store ==
/// Key to serialized blob mapping with LRU ordering.
///
/// Iteration runs least recently used to most recently used, so the
/// front of the list is always the next LRU eviction candidate.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: OrderedIndex<Vec<u8>>,
}

impl EntryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: OrderedIndex::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Returns the stored blob without touching recency.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key.
    pub fn peek_oldest_lru_key(&self) -> Option<&str> {
        self.entries.front().map(|(key, _)| key)
    }

    // == Insert ==
    /// Inserts a blob at the most recently used end.
    pub fn insert_tail(&mut self, key: String, blob: Vec<u8>) {
        self.entries.push_back(key, blob);
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    // == Touch ==
    /// Marks a key as most recently used without changing its blob.
    pub fn touch(&mut self, key: &str) -> bool {
        self.entries.move_to_back(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys ordered least to most recently used.
    pub fn keys_lru_order(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Iterates `(key, blob)` pairs least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(key, blob)| (key, blob.as_slice()))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(keys: &[&str]) -> EntryStore {
        let mut store = EntryStore::new();
        for key in keys {
            store.insert_tail(key.to_string(), key.as_bytes().to_vec());
        }
        store
    }

    #[test]
    fn test_insert_and_peek_oldest() {
        let store = store_with(&["key1", "key2", "key3"]);

        assert_eq!(store.len(), 3);
        assert_eq!(store.peek_oldest_lru_key(), Some("key1"));
        assert_eq!(store.get("key2"), Some(&b"key2"[..]));
    }

    #[test]
    fn test_touch_moves_to_most_recent() {
        let mut store = store_with(&["a", "b", "c"]);

        assert!(store.touch("a"));
        assert_eq!(store.peek_oldest_lru_key(), Some("b"));
        assert_eq!(store.keys_lru_order().collect::<Vec<_>>(), vec!["b", "c", "a"]);
        // Value is untouched
        assert_eq!(store.get("a"), Some(&b"a"[..]));
    }

    #[test]
    fn test_touch_missing_key() {
        let mut store = store_with(&["a"]);
        assert!(!store.touch("nonexistent"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store = store_with(&["key1", "key2", "key3"]);

        assert_eq!(store.remove("key2"), Some(b"key2".to_vec()));
        assert!(!store.contains("key2"));
        assert!(store.contains("key1"));
        assert!(store.contains("key3"));
        assert_eq!(store.remove("key2"), None);
    }

    #[test]
    fn test_touch_order_after_multiple_touches() {
        let mut store = store_with(&["a", "b", "c"]);

        store.touch("a");
        store.touch("c");
        store.touch("b");

        assert_eq!(store.keys_lru_order().collect::<Vec<_>>(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_empty_store() {
        let store = EntryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.peek_oldest_lru_key(), None);
    }
}
