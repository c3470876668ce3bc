// sorted_list.rs - Ordered sharded index (append, sort, binary search)

use super::traits::{shard_key, StringIndex};
use crate::error::FastaError;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One shard: key/value pairs plus whether they are known to be in byte order
#[derive(Debug)]
struct Shard<V> {
    entries: Vec<(String, V)>,
    sorted: bool,
}

impl<V> Default for Shard<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            sorted: true,
        }
    }
}

impl<V> Shard<V> {
    fn position(&self, key: &str) -> Option<usize> {
        if self.sorted {
            self.entries
                .binary_search_by(|(k, _)| k.as_bytes().cmp(key.as_bytes()))
                .ok()
        } else {
            self.entries.iter().position(|(k, _)| k == key)
        }
    }
}

/// Sorted list-of-pairs variant of the sharded string index
///
/// In strict mode keys must arrive in byte order within each shard; an
/// out-of-order key is rejected. In permissive mode it is accepted, the shard
/// is marked unsorted, and lookups fall back to a linear scan until
/// [`ShardedSortedList::sort`] runs.
#[derive(Debug)]
pub struct ShardedSortedList<V> {
    shards: HashMap<String, Shard<V>>,
    spanner_length: u8,
    strict: bool,
    entries: usize,
}

impl<V> ShardedSortedList<V> {
    pub fn new(spanner_length: u8) -> Self {
        Self {
            shards: HashMap::new(),
            spanner_length,
            strict: false,
            entries: 0,
        }
    }

    /// Index that refuses keys arriving out of order
    pub fn strict(spanner_length: u8) -> Self {
        Self {
            strict: true,
            ..Self::new(spanner_length)
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// True when every shard is in byte order
    pub fn is_sorted(&self) -> bool {
        self.shards.values().all(|s| s.sorted)
    }

    /// Sort every shard by key (byte-wise)
    pub fn sort(&mut self) {
        for shard in self.shards.values_mut() {
            if !shard.sorted {
                shard
                    .entries
                    .sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
                shard.sorted = true;
            }
        }
    }

    /// Replace the value of an existing key; returns false when the key is absent
    pub fn set_value(&mut self, key: &str, value: V) -> bool {
        match self.get_value_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Iterate all entries, shard by shard
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.shards
            .values()
            .flat_map(|shard| shard.entries.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl<V> StringIndex<V> for ShardedSortedList<V> {
    fn add(&mut self, key: &str, value: V) -> crate::Result<()> {
        let spanner = shard_key(key, self.spanner_length);
        let shard = self.shards.entry(spanner.to_string()).or_default();

        if let Some((last, _)) = shard.entries.last() {
            if last.as_bytes().cmp(key.as_bytes()) == Ordering::Greater {
                if self.strict {
                    return Err(FastaError::index(format!(
                        "key '{}' added after '{}' in shard '{}'; input must be sorted",
                        key, last, spanner
                    )));
                }
                shard.sorted = false;
            }
        }

        shard.entries.push((key.to_string(), value));
        self.entries += 1;
        Ok(())
    }

    fn get_value(&self, key: &str) -> Option<&V> {
        let shard = self.shards.get(shard_key(key, self.spanner_length))?;
        shard.position(key).map(|i| &shard.entries[i].1)
    }

    fn get_value_mut(&mut self, key: &str) -> Option<&mut V> {
        let shard = self.shards.get_mut(shard_key(key, self.spanner_length))?;
        let index = shard.position(key)?;
        Some(&mut shard.entries[index].1)
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
    fn test_values_survive_sort() {
        let keys = ["XP_0003", "XP_0001", "NP_77", "A", "XP_0002", "NP_10"];
        for spanner in 1..=4u8 {
            let mut index = ShardedSortedList::new(spanner);
            for (i, key) in keys.iter().enumerate() {
                index.add(key, i).unwrap();
            }
            index.sort();
            assert!(index.is_sorted());
            for (i, key) in keys.iter().enumerate() {
                assert!(index.contains(key));
                assert_eq!(index.get_value(key), Some(&i));
            }
            assert_eq!(index.len(), keys.len());
        }
    }

    #[test]
    fn test_shard_membership() {
        assert_eq!(shard_key("XP_0001", 3), "XP_");
        assert_eq!(shard_key("AB", 3), "AB");
        assert_eq!(shard_key("ÅBC", 1), "Å");

        let mut index = ShardedSortedList::new(3);
        index.add("XP_1", ()).unwrap();
        index.add("XP_2", ()).unwrap();
        index.add("AB", ()).unwrap();
        assert_eq!(index.shard_count(), 2);
    }

    #[test]
    fn test_permissive_falls_back_to_scan() {
        let mut index = ShardedSortedList::new(1);
        index.add("B2", 2).unwrap();
        index.add("B1", 1).unwrap();
        assert!(!index.is_sorted());
        // Lookup still succeeds through the linear scan
        assert_eq!(index.get_value("B1"), Some(&1));
        assert_eq!(index.get_value("B2"), Some(&2));
    }

    #[test]
    fn test_strict_rejects_out_of_order() {
        let mut index = ShardedSortedList::strict(1);
        index.add("A1", 0).unwrap();
        index.add("A2", 0).unwrap();
        // Different shard, no ordering constraint across shards
        index.add("0", 0).unwrap();
        let err = index.add("A0", 0).unwrap_err();
        assert!(matches!(err, FastaError::Index { .. }));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_set_value() {
        let mut index = ShardedSortedList::strict(2);
        index.add("P1", 0u32).unwrap();
        assert!(index.set_value("P1", 5));
        assert!(!index.set_value("P9", 5));
        *index.get_value_mut("P1").unwrap() += 1;
        assert_eq!(index.get_value("P1"), Some(&6));
    }
}
