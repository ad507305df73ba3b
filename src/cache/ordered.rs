//! Ordered Index Module
//!
//! Hash-indexed, arena-backed doubly-linked list keyed by string.
//!
//! The list keeps keys in an explicit order: new keys are appended at the
//! back, and an existing key can be moved to the back in O(1). Both the LRU
//! ordering of the entry store and the FIFO ordering of the expiry tracker
//! are built on this type.

use std::collections::HashMap;

/// Null link marker.
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<V> {
    key: String,
    value: Option<V>,
    prev: usize,
    next: usize,
}

// == Ordered Index ==
/// Insertion-ordered map with O(1) append, remove and move-to-back.
///
/// - Front = oldest
/// - Back = newest
#[derive(Debug)]
pub struct OrderedIndex<V> {
    /// Key to arena slot
    slots: HashMap<String, usize>,
    /// Node arena, freed slots are recycled through `free`
    arena: Vec<Node<V>>,
    head: usize,
    tail: usize,
    free: usize,
}

impl<V> Default for OrderedIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> OrderedIndex<V> {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            arena: Vec::new(),
            head: NIL,
            tail: NIL,
            free: NIL,
        }
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    // == Get ==
    /// Returns the value for `key` without changing its position.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.slots
            .get(key)
            .and_then(|&idx| self.arena[idx].value.as_ref())
    }

    // == Push Back ==
    /// Appends `key` at the back.
    ///
    /// An existing entry for the same key is replaced and moved to the back.
    pub fn push_back(&mut self, key: String, value: V) {
        if let Some(&idx) = self.slots.get(&key) {
            self.arena[idx].value = Some(value);
            self.move_slot_to_back(idx);
            return;
        }

        let idx = self.alloc(key.clone(), value);
        self.link_back(idx);
        self.slots.insert(key, idx);
    }

    // == Remove ==
    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.slots.remove(key)?;
        self.unlink(idx);
        self.release(idx)
    }

    // == Move To Back ==
    /// Moves an existing key to the back. Returns false if the key is absent.
    pub fn move_to_back(&mut self, key: &str) -> bool {
        match self.slots.get(key) {
            Some(&idx) => {
                self.move_slot_to_back(idx);
                true
            }
            None => false,
        }
    }

    // == Front ==
    /// Returns the oldest entry without removing it.
    pub fn front(&self) -> Option<(&str, &V)> {
        self.entry_at(self.head)
    }

    /// Returns the newest entry without removing it.
    pub fn back(&self) -> Option<(&str, &V)> {
        self.entry_at(self.tail)
    }

    /// Iterates entries front (oldest) to back (newest).
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            arena: &self.arena,
            current: self.head,
            remaining: self.slots.len(),
        }
    }

    // --- arena and link plumbing ---

    fn entry_at(&self, idx: usize) -> Option<(&str, &V)> {
        if idx == NIL {
            return None;
        }
        let node = &self.arena[idx];
        node.value.as_ref().map(|v| (node.key.as_str(), v))
    }

    fn alloc(&mut self, key: String, value: V) -> usize {
        let node = Node {
            key,
            value: Some(value),
            prev: NIL,
            next: NIL,
        };
        if self.free != NIL {
            let idx = self.free;
            self.free = self.arena[idx].next;
            self.arena[idx] = node;
            idx
        } else {
            self.arena.push(node);
            self.arena.len() - 1
        }
    }

    fn release(&mut self, idx: usize) -> Option<V> {
        let node = &mut self.arena[idx];
        node.key.clear();
        node.next = self.free;
        self.free = idx;
        node.value.take()
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.arena[idx].prev, self.arena[idx].next);

        if prev != NIL {
            self.arena[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.arena[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.arena[idx].prev = NIL;
        self.arena[idx].next = NIL;
    }

    fn link_back(&mut self, idx: usize) {
        self.arena[idx].prev = self.tail;
        self.arena[idx].next = NIL;

        if self.tail != NIL {
            self.arena[self.tail].next = idx;
        } else {
            self.head = idx;
        }
        self.tail = idx;
    }

    fn move_slot_to_back(&mut self, idx: usize) {
        if self.tail == idx {
            return;
        }
        self.unlink(idx);
        self.link_back(idx);
    }
}

/// Front-to-back iterator over an [`OrderedIndex`].
pub struct Iter<'a, V> {
    arena: &'a [Node<V>],
    current: usize,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.current != NIL && self.remaining > 0 {
            let node = &self.arena[self.current];
            self.current = node.next;
            if let Some(value) = node.value.as_ref() {
                self.remaining -= 1;
                return Some((node.key.as_str(), value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
