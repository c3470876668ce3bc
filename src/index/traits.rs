// traits.rs - Common interface of the sharded string indices

/// Shard key of `key`: its first `spanner_length` characters, or the whole key when shorter
pub fn shard_key(key: &str, spanner_length: u8) -> &str {
    match key.char_indices().nth(spanner_length as usize) {
        Some((byte_index, _)) => &key[..byte_index],
        None => key,
    }
}

/// A string-keyed index partitioned into shards by a key prefix ("spanner")
pub trait StringIndex<V> {
    /// Store a value; returns an error only for strict sorted indices fed out of order
    fn add(&mut self, key: &str, value: V) -> crate::Result<()>;

    /// Check whether the key is stored
    fn contains(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Value stored for the key
    fn get_value(&self, key: &str) -> Option<&V>;

    /// Mutable value stored for the key
    fn get_value_mut(&mut self, key: &str) -> Option<&mut V>;

    /// Total number of stored entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of shards currently allocated
    fn shard_count(&self) -> usize;

    /// Prefix length used to pick a shard
    fn spanner_length(&self) -> u8;

    /// Remove everything, keeping the spanner length
    fn clear(&mut self);
}
