//! Real HTTP integration tests for the registry service.
//!
//! Each test boots the router on a random port and talks to it with
//! reqwest, the same way peers do.

use peerlink_api::{start_with_registry, ServerHandle};
use peerlink_registry::{PeerRegistry, PeerStore};
use peerlink_types::{Message, PeerRecord};
use peerlink_wire::{DirectMessenger, InboundListener, ListenerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

async fn start_registry(rate_limit_per_minute: u32) -> ServerHandle {
    let registry = PeerRegistry::new(
        PeerStore::open_in_memory().unwrap(),
        Arc::new(DirectMessenger::new(Duration::from_secs(1))),
        Duration::from_secs(2),
    );
    start_with_registry("127.0.0.1:0", registry, rate_limit_per_minute)
        .await
        .unwrap()
}

fn peer_json(username: &str, port: u16) -> serde_json::Value {
    serde_json::json!({"username": username, "host": "127.0.0.1", "port": port})
}

#[tokio::test]
async fn test_register_then_available() {
    let server = start_registry(6000).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/register/", server.url()))
        .json(&peer_json("alice", 9001))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let stored: PeerRecord = resp.json().await.unwrap();
    assert_eq!(stored, PeerRecord::new("alice", "127.0.0.1", 9001));

    for path in ["/available/", "/available"] {
        let peers: Vec<PeerRecord> = client
            .get(format!("{}{path}", server.url()))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(peers, vec![stored.clone()]);
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_and_invalid_registration_are_400() {
    let server = start_registry(6000).await;
    let client = reqwest::Client::new();
    let url = format!("{}/register/", server.url());

    let resp = client.post(&url).json(&peer_json("alice", 9001)).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client.post(&url).json(&peer_json("alice", 9100)).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("alice"));

    // Port below 1024.
    let resp = client.post(&url).json(&peer_json("carol", 80)).send().await.unwrap();
    assert_eq!(resp.status(), 400);

    // Malformed body.
    let resp = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["detail"].is_string());

    assert_eq!(server.registry.count().unwrap(), 1);
    server.shutdown().await;
}

#[tokio::test]
async fn test_unregister_known_and_unknown() {
    let server = start_registry(6000).await;
    let client = reqwest::Client::new();
    server
        .registry
        .register(PeerRecord::new("alice", "127.0.0.1", 9001))
        .unwrap();

    let resp = client
        .delete(format!("{}/unregister/alice", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .delete(format!("{}/unregister/alice", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "User alice not found");

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_relays_to_registered_listener() {
    let server = start_registry(6000).await;
    let client = reqwest::Client::new();

    let (tx, mut rx) = mpsc::channel(4);
    let mut config = ListenerConfig::new("127.0.0.1", PeerRecord::new("bob", "127.0.0.1", 0));
    config.read_timeout = Duration::from_millis(500);
    let listener = InboundListener::new(config, Arc::new(tx));
    let port = listener.start().await.unwrap().port();

    let alice = PeerRecord::new("alice", "127.0.0.1", 9001);
    let bob = PeerRecord::new("bob", "127.0.0.1", port);
    server.registry.register(alice.clone()).unwrap();
    server.registry.register(bob.clone()).unwrap();

    let resp = client
        .post(format!("{}/send/", server.url()))
        .json(&Message::new(alice, bob, "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.data(), "hi");

    listener.stop().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_send_unknown_receiver_is_404_and_dead_receiver_is_400() {
    let server = start_registry(6000).await;
    let client = reqwest::Client::new();
    let alice = PeerRecord::new("alice", "127.0.0.1", 9001);

    let resp = client
        .post(format!("{}/send/", server.url()))
        .json(&Message::new(
            alice.clone(),
            PeerRecord::new("ghost", "127.0.0.1", 9999),
            "hi",
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Registered, but nothing is listening on the port.
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_port = closed.local_addr().unwrap().port();
    drop(closed);
    let dave = PeerRecord::new("dave", "127.0.0.1", dead_port);
    server.registry.register(dave.clone()).unwrap();

    let resp = client
        .post(format!("{}/send/", server.url()))
        .json(&Message::new(alice, dave, "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    server.shutdown().await;
}

#[tokio::test]
async fn test_health_reports_peer_count() {
    let server = start_registry(6000).await;
    server
        .registry
        .register(PeerRecord::new("alice", "127.0.0.1", 9001))
        .unwrap();

    let body: serde_json::Value = reqwest::get(format!("{}/health", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["peers"], 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_exhausted_budget_gets_429() {
    // 20 tokens per minute; each /send/ costs 10.
    let server = start_registry(20).await;
    let client = reqwest::Client::new();
    let msg = Message::new(
        PeerRecord::new("alice", "127.0.0.1", 9001),
        PeerRecord::new("ghost", "127.0.0.1", 9999),
        "hi",
    );

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let resp = client
            .post(format!("{}/send/", server.url()))
            .json(&msg)
            .send()
            .await
            .unwrap();
        statuses.push(resp.status().as_u16());
    }
    assert_eq!(statuses, vec![404, 404, 429]);

    server.shutdown().await;
}
