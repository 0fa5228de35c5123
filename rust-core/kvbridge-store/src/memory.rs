// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory store for kvbridge.
//
// Uses a `BTreeMap` wrapped in a tokio `RwLock` for thread-safe key-value
// storage with the same upsert semantics as the cluster. Intended for
// testing, development, and single-process runs without a cluster.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::KvStore;

/// An in-memory store backed by a sorted `BTreeMap`.
///
/// All data lives in process memory and is lost on drop. Clones share the
/// same map, so a clone handed to a driver stays observable from a test.
///
/// # Example
///
/// ```rust
/// use kvbridge_store::{KvStore, MemoryStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// assert!(store.put("hello", "world").await.unwrap());
/// assert_eq!(store.get("hello").await.unwrap(), Some("world".to_string()));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Return true if the store contains no keys.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.data.read().await;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut map = self.data.write().await;
        map.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        // Removing an absent key still succeeds.
        let mut map = self.data.write().await;
        map.remove(key);
        Ok(true)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
