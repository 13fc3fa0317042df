// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process storage, mainly for tests and memory-only sessions.

use std::sync::Arc;

use dashmap::DashMap;

use super::TokenStorage;
use crate::error::PersistenceError;

/// Storage backed by a shared in-memory map.
///
/// Clones share the same map, so a test can keep a handle and inspect
/// what the session store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl TokenStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();

        storage.write("k", "v").unwrap();
        assert_eq!(handle.read("k").unwrap().as_deref(), Some("v"));

        handle.remove("k").unwrap();
        assert!(!storage.contains("k"));
        assert!(storage.remove("k").is_ok());
    }
}
