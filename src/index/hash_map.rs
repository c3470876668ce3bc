// hash_map.rs - Unordered sharded index (exact lookup)

use super::traits::{shard_key, StringIndex};
use std::collections::HashMap;

/// Hash-map variant of the sharded string index
#[derive(Debug)]
pub struct ShardedHashMap<V> {
    shards: HashMap<String, HashMap<String, V>>,
    spanner_length: u8,
    entries: usize,
}

impl<V> ShardedHashMap<V> {
    pub fn new(spanner_length: u8) -> Self {
        Self {
            shards: HashMap::new(),
            spanner_length,
            entries: 0,
        }
    }

    /// Insert or replace; returns the previous value
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        let shard = self
            .shards
            .entry(shard_key(key, self.spanner_length).to_string())
            .or_default();
        let previous = shard.insert(key.to_string(), value);
        if previous.is_none() {
            self.entries += 1;
        }
        previous
    }

    /// Mutable access to the value for `key`, inserting `default()` when missing
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: &str, default: F) -> &mut V {
        let shard = self
            .shards
            .entry(shard_key(key, self.spanner_length).to_string())
            .or_default();
        if !shard.contains_key(key) {
            self.entries += 1;
        }
        shard.entry(key.to_string()).or_insert_with(default)
    }

    /// Iterate all entries, shard by shard (no particular order)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.shards
            .values()
            .flat_map(|shard| shard.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Shard keys currently in use
    pub fn shard_keys(&self) -> impl Iterator<Item = &str> {
        self.shards.keys().map(|k| k.as_str())
    }

    /// Entries stored in one shard
    pub fn shard_len(&self, shard: &str) -> usize {
        self.shards.get(shard).map_or(0, |s| s.len())
    }
}

impl<V> StringIndex<V> for ShardedHashMap<V> {
    fn add(&mut self, key: &str, value: V) -> crate::Result<()> {
        self.insert(key, value);
        Ok(())
    }

    fn get_value(&self, key: &str) -> Option<&V> {
        self.shards
            .get(shard_key(key, self.spanner_length))?
            .get(key)
    }

    fn get_value_mut(&mut self, key: &str) -> Option<&mut V> {
        self.shards
            .get_mut(shard_key(key, self.spanner_length))?
            .get_mut(key)
    }

    fn len(&self) -> usize {
        self.entries
    }

    fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn spanner_length(&self) -> u8 {
        self.spanner_length
    }

    fn clear(&mut self) {
        self.shards.clear();
        self.entries = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = ShardedHashMap::new(3);
        index.insert("ABC123", 1);
        index.insert("ABC456", 2);
        index.insert("XY", 3);

        assert_eq!(index.len(), 3);
        assert_eq!(index.shard_count(), 2);
        assert_eq!(index.get_value("ABC456"), Some(&2));
        assert_eq!(index.get_value("XY"), Some(&3));
        assert!(!index.contains("ABC789"));
        assert_eq!(index.shard_len("ABC"), 2);

        assert_eq!(index.insert("ABC123", 10), Some(1));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut index: ShardedHashMap<u32> = ShardedHashMap::new(2);
        *index.get_or_insert_with("P1", || 0) += 1;
        *index.get_or_insert_with("P1", || 0) += 1;
        assert_eq!(index.get_value("P1"), Some(&2));
        assert_eq!(index.len(), 1);

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.spanner_length(), 2);
    }
}
