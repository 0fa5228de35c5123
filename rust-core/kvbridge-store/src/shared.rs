// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide store connection slot.
//
// One connection per process, created lazily by the first caller and reused
// by every later caller. The check-and-create step runs under a tokio
// `Mutex`; it is the only synchronization point in the driver. The handle is
// never torn down: connection lifetime is process lifetime.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

/// A lazily-initialized, shared store handle.
///
/// `new` is `const` so the slot can live in a `static`:
///
/// ```rust
/// use kvbridge_store::{MemoryStore, SharedConnection, StoreError};
///
/// static SLOT: SharedConnection<MemoryStore> = SharedConnection::new();
///
/// # tokio_test::block_on(async {
/// let a = SLOT.get_or_connect(|| async { Ok::<_, StoreError>(MemoryStore::new()) }).await.unwrap();
/// let b = SLOT.get_or_connect(|| async { Ok::<_, StoreError>(MemoryStore::new()) }).await.unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// # });
/// ```
pub struct SharedConnection<S> {
    slot: Mutex<Option<Arc<S>>>,
}

impl<S> SharedConnection<S> {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::const_new(None),
        }
    }

    /// Return the shared handle, running `connect` only if no caller has
    /// initialized the slot yet.
    ///
    /// The lock is held across `connect`, so concurrent first callers wait
    /// for the winner instead of racing to build a second connection. A
    /// failed `connect` leaves the slot empty for the next caller.
    pub async fn get_or_connect<F, Fut, E>(&self, connect: F) -> Result<Arc<S>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S, E>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(existing) = slot.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let connection = Arc::new(connect().await?);
        *slot = Some(Arc::clone(&connection));
        tracing::debug!("shared store connection initialized");
        Ok(connection)
    }
}

impl<S> Default for SharedConnection<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::MemoryStore;
    use crate::store::KvStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_second_caller_reuses_connection() {
        let shared = SharedConnection::new();
        let first = shared
            .get_or_connect(|| async { Ok::<_, StoreError>(MemoryStore::new()) })
            .await
            .unwrap();
        first.put("k", "v").await.unwrap();

        let second = shared
            .get_or_connect(|| async { Ok::<_, StoreError>(MemoryStore::new()) })
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_connect_once() {
        let shared = Arc::new(SharedConnection::new());
        let connects = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let shared = Arc::clone(&shared);
            let connects = Arc::clone(&connects);
            handles.push(tokio::spawn(async move {
                shared
                    .get_or_connect(|| async move {
                        connects.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, StoreError>(MemoryStore::new())
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut handles_out = Vec::new();
        for handle in handles {
            handles_out.push(handle.await.unwrap());
        }

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(handles_out.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_slot_empty() {
        let shared: SharedConnection<MemoryStore> = SharedConnection::new();
        let connects = AtomicUsize::new(0);

        let result = shared
            .get_or_connect(|| async {
                connects.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::EmptyNodeList)
            })
            .await;
        assert!(matches!(result, Err(StoreError::EmptyNodeList)));

        // The next caller connects again because nothing was stored.
        shared
            .get_or_connect(|| async {
                connects.fetch_add(1, Ordering::SeqCst);
                Ok::<_, StoreError>(MemoryStore::new())
            })
            .await
            .unwrap();
        shared
            .get_or_connect(|| async {
                connects.fetch_add(1, Ordering::SeqCst);
                Ok::<_, StoreError>(MemoryStore::new())
            })
            .await
            .unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }
}
