// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! CRUD request translation.
//!
//! [`KvDriver`] maps the harness-facing record operations onto the three
//! store primitives:
//!
//! | Operation | Store calls | Failure outcomes |
//! |---|---|---|
//! | `read` | `get` | absent → `NOT_FOUND`, malformed value → `ERROR` |
//! | `insert` / `update` | `put` | encode failure or store failure → `ERROR` |
//! | `delete` | `delete` | store failure → `ERROR` |
//! | `scan` | none | always `NOT_IMPLEMENTED` |
//!
//! Insert and update are the same upsert: the store offers no conditional
//! put. The driver holds no state besides the shared store handle, and
//! every failure is converted to a [`Status`] here and logged.

use std::sync::Arc;

use kvbridge_store::{ClusterClient, KvStore, SharedConnection};

use crate::codec::{decode, encode, FieldSet, Record};
use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};
use crate::key::compose_key;
use crate::status::Status;

/// The one cluster connection per process.
static CLUSTER: SharedConnection<ClusterClient> = SharedConnection::new();

/// Record-oriented driver over a flat key-value store.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use kvbridge_core::{KvDriver, Status};
/// use kvbridge_store::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let driver = KvDriver::with_store(Arc::new(MemoryStore::new()));
///
/// assert_eq!(driver.insert("users", "u1", [("name", "Ann")]).await, Status::Ok);
///
/// let (status, record) = driver.read("users", "u1", None).await;
/// assert_eq!(status, Status::Ok);
/// assert_eq!(record.unwrap()["name"], "Ann");
/// # });
/// ```
pub struct KvDriver<S: KvStore + ?Sized = dyn KvStore> {
    store: Arc<S>,
}

impl<S: KvStore + ?Sized> Clone for KvDriver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl KvDriver<ClusterClient> {
    /// Attach to the process-wide cluster connection, creating it on the
    /// first call.
    ///
    /// Only the first successful call uses `config`; later calls share the
    /// connection it created, whatever config they pass. A failed first
    /// call leaves no connection behind.
    pub async fn init(config: &DriverConfig) -> DriverResult<Self> {
        config.validate()?;
        let store = CLUSTER
            .get_or_connect(move || async move {
                let primary = config.primary().unwrap_or_default();
                let client =
                    ClusterClient::connect(&config.nodes, primary, config.cluster_options())?;
                tracing::info!(nodes = %config.nodes.join(","), "store connection initialized");
                Ok::<_, DriverError>(client)
            })
            .await?;
        Ok(Self { store })
    }
}

impl<S: KvStore + ?Sized> KvDriver<S> {
    /// Drive an explicit store instead of the shared cluster connection.
    pub fn with_store(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The store this driver sends primitives to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read a record, keeping only `fields` when given and non-empty.
    pub async fn read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&FieldSet>,
    ) -> (Status, Option<Record>) {
        match self.try_read(table, key, fields).await {
            Ok(record) => (Status::Ok, Some(record)),
            Err(err) => (report("read", table, key, &err), None),
        }
    }

    /// Range reads are not offered by the store; this never touches it.
    pub async fn scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        _fields: Option<&FieldSet>,
    ) -> Status {
        tracing::debug!(table, start_key, record_count, "scan requested");
        report("scan", table, start_key, &DriverError::NotImplemented("scan"))
    }

    /// Write `values` under `(table, key)`, replacing any previous record.
    pub async fn update<I, K, V>(&self, table: &str, key: &str, values: I) -> Status
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        match self.try_write(table, key, values).await {
            Ok(()) => Status::Ok,
            Err(err) => report("update", table, key, &err),
        }
    }

    /// Same store call as [`KvDriver::update`].
    pub async fn insert<I, K, V>(&self, table: &str, key: &str, values: I) -> Status
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        match self.try_write(table, key, values).await {
            Ok(()) => Status::Ok,
            Err(err) => report("insert", table, key, &err),
        }
    }

    /// Remove the record under `(table, key)`.
    pub async fn delete(&self, table: &str, key: &str) -> Status {
        match self.try_delete(table, key).await {
            Ok(()) => Status::Ok,
            Err(err) => report("delete", table, key, &err),
        }
    }

    /// Nothing to release: the connection lives as long as the process.
    pub fn cleanup(&self) {}

    /// [`KvDriver::read`] without the status conversion.
    pub async fn try_read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&FieldSet>,
    ) -> DriverResult<Record> {
        let flat = compose_key(table, key);
        let value = self.store.get(&flat).await?.ok_or(DriverError::NotFound)?;
        Ok(decode(&value, fields)?)
    }

    /// [`KvDriver::update`] without the status conversion.
    pub async fn try_write<I, K, V>(&self, table: &str, key: &str, values: I) -> DriverResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let flat = compose_key(table, key);
        let value = encode(values)?;
        if self.store.put(&flat, &value).await? {
            Ok(())
        } else {
            Err(DriverError::StoreRejected { operation: "put" })
        }
    }

    /// [`KvDriver::delete`] without the status conversion.
    pub async fn try_delete(&self, table: &str, key: &str) -> DriverResult<()> {
        let flat = compose_key(table, key);
        if self.store.delete(&flat).await? {
            Ok(())
        } else {
            Err(DriverError::StoreRejected {
                operation: "delete",
            })
        }
    }
}

/// Log a failed operation and return the status it maps to.
fn report(op: &str, table: &str, key: &str, err: &DriverError) -> Status {
    let status = err.status();
    match status {
        Status::NotFound | Status::NotImplemented => {
            tracing::debug!(op, table, key, %status, "operation not served");
        }
        _ => tracing::error!(op, table, key, error = %err, "error encountered for key"),
    }
    status
}
