// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! HTTP client for a key-value store cluster.
//!
//! [`ClusterClient`] is constructed from the full list of cluster nodes plus
//! one designated primary. Every primitive is sent to the primary; the rest
//! of the list is kept for health checks and logging. Replication, leader
//! election and consistency all live on the server side.
//!
//! Wire protocol, per primitive:
//!
//! | Primitive | Request | Outcome |
//! |---|---|---|
//! | `get` | `GET /kv/{key}` | 200 → body is the value (must be UTF-8), 404 → absent |
//! | `put` | `PUT /kv/{key}` with the value as body | 2xx → `true`, else `false` |
//! | `delete` | `DELETE /kv/{key}` | 2xx or 404 → `true`, else `false` |
//!
//! Keys are percent-encoded as a single path segment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::error::StoreError;
use crate::store::KvStore;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// ClusterOptions
// ---------------------------------------------------------------------------

/// Connection tuning for a [`ClusterClient`].
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Channel-count hint: the most idle pooled connections kept per node.
    /// `None` leaves the pool unbounded.
    pub channels: Option<usize>,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            channels: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// ClusterClient
// ---------------------------------------------------------------------------

/// Client for a key-value store cluster.
///
/// # Examples
///
/// ```rust,no_run
/// use kvbridge_store::{ClusterClient, ClusterOptions, KvStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), kvbridge_store::StoreError> {
/// let nodes = vec!["10.0.0.1:7000".to_string(), "10.0.0.2:7000".to_string()];
/// let client = ClusterClient::connect(&nodes, &nodes[0], ClusterOptions::default())?;
/// client.put("5:users:u1", "R0:").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ClusterClient {
    /// Every node in the cluster, normalized to base URLs.
    nodes: Vec<Url>,
    /// The node all primitives are sent to.
    primary: Url,
    /// Underlying `reqwest` HTTP client (connection-pooled).
    http: reqwest::Client,
}

impl ClusterClient {
    /// Build a client for `nodes`, sending all primitives to `primary`.
    ///
    /// Addresses may be full URLs or bare `host:port` pairs, which are
    /// treated as plain HTTP. No request is made here; unreachable nodes
    /// surface on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyNodeList`] for an empty node list and
    /// [`StoreError::InvalidAddress`] for an address that is not a usable
    /// HTTP base URL.
    pub fn connect(
        nodes: &[String],
        primary: &str,
        options: ClusterOptions,
    ) -> Result<Self, StoreError> {
        if nodes.is_empty() {
            return Err(StoreError::EmptyNodeList);
        }

        let nodes = nodes
            .iter()
            .map(|address| parse_node(address))
            .collect::<Result<Vec<_>, _>>()?;
        let primary = parse_node(primary)?;

        // reqwest is built without a bundled crypto provider; install ring
        // once so https nodes work. Losing the race to another installer is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut builder = reqwest::Client::builder().timeout(options.timeout);
        if let Some(channels) = options.channels {
            builder = builder.pool_max_idle_per_host(channels);
        }
        let http = builder.build()?;

        tracing::info!(
            primary = %primary,
            nodes = nodes.len(),
            channels = ?options.channels,
            "cluster client created"
        );

        Ok(Self {
            nodes,
            primary,
            http,
        })
    }

    /// Return the configured nodes as base URLs.
    pub fn nodes(&self) -> &[Url] {
        &self.nodes
    }

    /// Return the primary node's base URL.
    pub fn primary(&self) -> &Url {
        &self.primary
    }

    /// Ping `GET /health` on every node, reporting which ones answered 2xx.
    pub async fn health(&self) -> Vec<(Url, bool)> {
        let mut report = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let healthy = match node.join("health") {
                Ok(url) => match self.http.get(url).send().await {
                    Ok(response) => response.status().is_success(),
                    Err(err) => {
                        tracing::debug!(node = %node, error = %err, "health check failed");
                        false
                    }
                },
                Err(_) => false,
            };
            report.push((node.clone(), healthy));
        }
        report
    }

    /// Build `{primary}/kv/{key}` with `key` as one percent-encoded segment.
    fn key_url(&self, key: &str) -> Result<Url, StoreError> {
        let mut url = self.primary.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidAddress {
                address: self.primary.to_string(),
                reason: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .push("kv")
            .push(key);
        Ok(url)
    }

    fn write_outcome(&self, op: &str, key: &str, status: StatusCode) -> bool {
        if status.is_success() {
            return true;
        }
        tracing::warn!(op, key, status = status.as_u16(), primary = %self.primary, "store rejected write");
        false
    }
}

/// Normalize a configured address into a base URL ending in `/`.
fn parse_node(address: &str) -> Result<Url, StoreError> {
    let trimmed = address.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|err| StoreError::InvalidAddress {
        address: address.to_string(),
        reason: err.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() || url.host().is_none()
    {
        return Err(StoreError::InvalidAddress {
            address: address.to_string(),
            reason: "expected an http(s) host address".to_string(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl KvStore for ClusterClient {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let response = self.http.get(self.key_url(key)?).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.bytes().await?;
                let value = String::from_utf8(body.to_vec()).map_err(|err| {
                    StoreError::CorruptValue {
                        key: key.to_string(),
                        reason: err.to_string(),
                    }
                })?;
                Ok(Some(value))
            }
            status => Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                node: self.primary.to_string(),
            }),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let response = self
            .http
            .put(self.key_url(key)?)
            .body(value.to_string())
            .send()
            .await?;
        Ok(self.write_outcome("put", key, response.status()))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let response = self.http.delete(self.key_url(key)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(true);
        }
        Ok(self.write_outcome("delete", key, response.status()))
    }

    fn name(&self) -> &str {
        "cluster"
    }
}
