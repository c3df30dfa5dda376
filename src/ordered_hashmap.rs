use std::collections::HashMap;
use std::hash::Hash;

/// Hash map that remembers the order in which keys were first inserted.
#[derive(Debug, Clone)]
pub struct OrderedHashMap<K, V> {
    map: HashMap<K, V>,
    keys: Vec<K>,
}

impl<K: Hash + Eq + Clone, V> Default for OrderedHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V> OrderedHashMap<K, V> {
    pub fn new() -> Self {
        OrderedHashMap {
            map: HashMap::new(),
            keys: Vec::new(),
        }
    }

    /// Re-inserting an existing key replaces the value but keeps its place.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if !self.map.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.map.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys
            .iter()
            .filter_map(move |key| self.map.get(key).map(|value| (key, value)))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
