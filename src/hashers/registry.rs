// registry.rs - Hasher registry for managing available hashers

use super::traits::SequenceHasher;
use super::{Md5Hasher, Sha1Hasher, Sha256Hasher};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the hasher used when none is configured
pub const DEFAULT_HASHER: &str = "sha1";

/// Registry for available hashers
pub struct HasherRegistry {
    hashers: HashMap<String, Arc<dyn SequenceHasher>>,
}

impl HasherRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            hashers: HashMap::new(),
        };

        // Register built-in hashers
        registry.register_hasher("sha1", Arc::new(Sha1Hasher));
        registry.register_hasher("sha256", Arc::new(Sha256Hasher));
        registry.register_hasher("md5", Arc::new(Md5Hasher));

        registry
    }

    /// Register a new hasher
    pub fn register_hasher(&mut self, name: &str, hasher: Arc<dyn SequenceHasher>) {
        self.hashers.insert(name.to_lowercase(), hasher);
    }

    /// Get a hasher by name (case-insensitive)
    pub fn get_hasher(&self, name: &str) -> Option<Arc<dyn SequenceHasher>> {
        self.hashers.get(&name.to_lowercase()).cloned()
    }

    /// Check if a hasher exists
    pub fn has_hasher(&self, name: &str) -> bool {
        self.hashers.contains_key(&name.to_lowercase())
    }

    /// List all available hashers
    pub fn list_hashers(&self) -> Vec<(&str, &str)> {
        let mut list: Vec<_> = self
            .hashers
            .values()
            .map(|h| (h.name(), h.description()))
            .collect();
        list.sort();
        list
    }

    /// Get all hasher names
    pub fn get_hasher_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hashers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

impl Default for HasherRegistry {
    fn default() -> Self {
        Self::new()
    }
}
