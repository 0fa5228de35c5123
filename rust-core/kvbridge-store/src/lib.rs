// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// kvbridge store primitives
//
// The distributed key-value store is consumed through exactly three
// primitives: `get`, `put` and `delete` over flat string keys and opaque
// string values. This crate defines that seam and the concrete clients
// behind it.
//
// # Modules
//
// - [`store`] -- The `KvStore` trait defining the three primitives.
// - [`error`] -- The `StoreError` enum covering transport and node failures.
// - [`memory`] -- An in-memory `BTreeMap` store for tests and local runs.
// - [`cluster`] -- The HTTP client addressing a cluster's primary node.
// - [`metrics`] -- A transparent wrapper that collects operation statistics.
// - [`shared`] -- The process-wide, initialize-once connection slot.
//
// # Example
//
// ```rust
// use kvbridge_store::{KvStore, MemoryStore, MetricsStore};
//
// # tokio_test::block_on(async {
// let store = MetricsStore::new(MemoryStore::new());
//
// assert!(store.put("5:users:u1", "R0:").await.unwrap());
// assert_eq!(store.get("5:users:u1").await.unwrap().as_deref(), Some("R0:"));
// assert_eq!(store.stats().await.put_count, 1);
// # });
// ```

pub mod cluster;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod shared;
pub mod store;

// Re-export the most commonly used types at the crate root for convenience.
pub use cluster::{ClusterClient, ClusterOptions};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use metrics::{MetricsStore, StoreStats};
pub use shared::SharedConnection;
pub use store::KvStore;
