//! Concurrent cache of loaded schema descriptions

use crate::model::SchemaDescription;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe cache keyed by source (usually a canonical file path)
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: DashMap<String, Arc<SchemaDescription>>,
}

impl SchemaCache {
    /// Create a new empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            schemas: DashMap::new(),
        }
    }

    /// Register a description, replacing any previous one under the same key
    pub fn register(&self, key: impl Into<String>, schema: SchemaDescription) -> Arc<SchemaDescription> {
        let schema = Arc::new(schema);
        self.schemas.insert(key.into(), Arc::clone(&schema));
        schema
    }

    /// Get a description by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<SchemaDescription>> {
        self.schemas.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a key is cached
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.schemas.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Drop every cached description
    pub fn clear(&self) {
        self.schemas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_register_and_get() {
        let cache = SchemaCache::new();
        cache.register("a.json", SchemaDescription::new("a"));

        assert!(cache.contains("a.json"));
        assert_eq!(cache.get("a.json").unwrap().name, "a");
        assert!(cache.get("b.json").is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_registration() {
        let cache = Arc::new(SchemaCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache.register(format!("{i}.json"), SchemaDescription::new(format!("s{i}")));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }
}
