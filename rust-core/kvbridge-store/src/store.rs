// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The three store primitives consumed by the driver.
//
// The underlying store only understands flat string keys mapped to single
// opaque string values. Writes are unconditional upserts; there is no
// conditional put, range read or batch primitive.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

/// A flat key-value store exposing `get`, `put` and `delete`.
///
/// `put` and `delete` report success as a boolean, mirroring the store
/// client contract: `Ok(false)` means the store answered and refused or
/// failed the write, while `Err` means the store could not be reached at
/// all. Callers treat both as a failed operation.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Retrieve the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist, rather than an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, creating or overwriting unconditionally.
    async fn put(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Remove `key` from the store.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// A human-readable name for this store, used in logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
