// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metrics-collecting wrapper for kvbridge stores.
//
// Wraps any `KvStore` and transparently collects operation counts, failure
// counts, latency sums, and byte transfer totals. The CLI prints these after
// a run with `--stats`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::KvStore;

/// Accumulated statistics for a store.
///
/// All counters are monotonically increasing for the lifetime of the
/// [`MetricsStore`] that owns them, until [`MetricsStore::reset_stats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    /// Number of `get` operations performed.
    pub get_count: u64,
    /// Number of `get` operations that found no value.
    pub get_miss_count: u64,
    /// Number of `put` operations performed.
    pub put_count: u64,
    /// Number of `delete` operations performed.
    pub delete_count: u64,
    /// Operations that errored or that the store reported as failed.
    pub failure_count: u64,
    /// Cumulative wall-clock latency of all `get` calls, in milliseconds.
    pub get_latency_sum_ms: f64,
    /// Cumulative wall-clock latency of all `put` calls, in milliseconds.
    pub put_latency_sum_ms: f64,
    /// Cumulative wall-clock latency of all `delete` calls, in milliseconds.
    pub delete_latency_sum_ms: f64,
    /// Total value bytes returned by `get`.
    pub total_bytes_read: u64,
    /// Total value bytes accepted by `put`.
    pub total_bytes_written: u64,
}

/// A store wrapper that collects operation metrics.
///
/// Delegates every operation to an inner store while measuring wall-clock
/// latency and counting invocations.
pub struct MetricsStore<S: KvStore> {
    inner: S,
    stats: Arc<RwLock<StoreStats>>,
}

impl<S: KvStore> MetricsStore<S> {
    /// Wrap `inner` with metrics collection.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stats: Arc::new(RwLock::new(StoreStats::default())),
        }
    }

    /// Return a snapshot of the current statistics.
    pub async fn stats(&self) -> StoreStats {
        self.stats.read().await.clone()
    }

    /// Reset all statistics to zero.
    pub async fn reset_stats(&self) {
        let mut s = self.stats.write().await;
        *s = StoreStats::default();
    }

    /// Return a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn failed(result: &Result<bool, StoreError>) -> bool {
    !matches!(result, Ok(true))
}

#[async_trait]
impl<S: KvStore> KvStore for MetricsStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let start = Instant::now();
        let result = self.inner.get(key).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.get_count += 1;
        s.get_latency_sum_ms += elapsed_ms;
        match result {
            Ok(Some(ref val)) => s.total_bytes_read += val.len() as u64,
            Ok(None) => s.get_miss_count += 1,
            Err(_) => s.failure_count += 1,
        }

        result
    }

    async fn put(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let start = Instant::now();
        let result = self.inner.put(key, value).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.put_count += 1;
        s.put_latency_sum_ms += elapsed_ms;
        if failed(&result) {
            s.failure_count += 1;
        } else {
            s.total_bytes_written += value.len() as u64;
        }

        result
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let start = Instant::now();
        let result = self.inner.delete(key).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.delete_count += 1;
        s.delete_latency_sum_ms += elapsed_ms;
        if failed(&result) {
            s.failure_count += 1;
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
