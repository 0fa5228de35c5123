// SPDX-License-Identifier: PMPL-1.0-or-later
//! Cluster client tests against an in-process HTTP node.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::sync::RwLock;

use kvbridge_store::{ClusterClient, ClusterOptions, KvStore, StoreError};

#[derive(Clone, Default)]
struct Node {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    reject_writes: Arc<AtomicBool>,
}

async fn get_kv(State(node): State<Node>, Path(key): Path<String>) -> Result<Vec<u8>, StatusCode> {
    node.data
        .read()
        .await
        .get(&key)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

async fn put_kv(State(node): State<Node>, Path(key): Path<String>, body: String) -> StatusCode {
    if node.reject_writes.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    node.data.write().await.insert(key, body.into_bytes());
    StatusCode::NO_CONTENT
}

async fn delete_kv(State(node): State<Node>, Path(key): Path<String>) -> StatusCode {
    if node.reject_writes.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match node.data.write().await.remove(&key) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// Start a node on an ephemeral port and return its `host:port` address.
async fn spawn_node(node: Node) -> String {
    let app = Router::new()
        .route("/kv/{key}", get(get_kv).put(put_kv).delete(delete_kv))
        .route("/health", get(|| async { "ok" }))
        .with_state(node);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

fn connect(address: &str) -> ClusterClient {
    let nodes = vec![address.to_string()];
    let options = ClusterOptions {
        channels: Some(4),
        timeout: Duration::from_secs(5),
    };
    ClusterClient::connect(&nodes, &nodes[0], options).unwrap()
}

#[tokio::test]
async fn test_put_get_delete_round_trip() {
    let node = Node::default();
    let client = connect(&spawn_node(node.clone()).await);

    assert_eq!(client.get("5:users:u1").await.unwrap(), None);

    assert!(client.put("5:users:u1", "R1:4:name=3:Ann").await.unwrap());
    assert_eq!(
        client.get("5:users:u1").await.unwrap().as_deref(),
        Some("R1:4:name=3:Ann")
    );
    assert_eq!(
        node.data.read().await.get("5:users:u1").map(Vec::as_slice),
        Some(b"R1:4:name=3:Ann".as_slice())
    );

    assert!(client.delete("5:users:u1").await.unwrap());
    assert_eq!(client.get("5:users:u1").await.unwrap(), None);
}

#[tokio::test]
async fn test_keys_with_reserved_characters_survive_the_path() {
    let node = Node::default();
    let client = connect(&spawn_node(node.clone()).await);

    let key = "3:a/b:k?x=1#frag %";
    assert!(client.put(key, "v").await.unwrap());
    assert!(node.data.read().await.contains_key(key));
    assert_eq!(client.get(key).await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn test_empty_value_round_trips() {
    let client = connect(&spawn_node(Node::default()).await);
    assert!(client.put("k", "").await.unwrap());
    assert_eq!(client.get("k").await.unwrap(), Some(String::new()));
}

#[tokio::test]
async fn test_non_utf8_value_is_corrupt() {
    let node = Node::default();
    let client = connect(&spawn_node(node.clone()).await);
    node.data
        .write()
        .await
        .insert("5:users:u1".to_string(), vec![b'R', 0xff, 0xfe]);

    match client.get("5:users:u1").await {
        Err(StoreError::CorruptValue { key, .. }) => assert_eq!(key, "5:users:u1"),
        other => panic!("expected a corrupt value error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_of_missing_key_succeeds() {
    let client = connect(&spawn_node(Node::default()).await);
    assert!(client.delete("never-written").await.unwrap());
}

#[tokio::test]
async fn test_rejected_writes_report_false() {
    let node = Node::default();
    let client = connect(&spawn_node(node.clone()).await);
    node.reject_writes.store(true, Ordering::SeqCst);

    assert!(!client.put("k", "v").await.unwrap());
    assert!(!client.delete("k").await.unwrap());
    assert!(node.data.read().await.is_empty());
}

#[tokio::test]
async fn test_unreachable_primary_is_a_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let client = connect(&address);
    assert!(matches!(client.get("k").await, Err(StoreError::Network(_))));
    assert!(matches!(client.put("k", "v").await, Err(StoreError::Network(_))));
}

#[tokio::test]
async fn test_health_reports_each_node() {
    let up = spawn_node(Node::default()).await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let down = listener.local_addr().unwrap().to_string();
    drop(listener);

    let nodes = vec![up.clone(), down];
    let client = ClusterClient::connect(&nodes, &up, ClusterOptions::default()).unwrap();
    let report = client.health().await;

    assert_eq!(report.len(), 2);
    assert!(report[0].1);
    assert!(!report[1].1);
}
