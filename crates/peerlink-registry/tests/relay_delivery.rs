//! Registry relay against real listeners.
//!
//! The registry forwards over the same raw-TCP protocol peers use for direct
//! delivery, so a live InboundListener must observe relayed text unchanged.

use peerlink_registry::{PeerRegistry, PeerStore};
use peerlink_types::{Message, PeerLinkError, PeerRecord};
use peerlink_wire::{DirectMessenger, InboundListener, ListenerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn registry() -> PeerRegistry {
    PeerRegistry::new(
        PeerStore::open_in_memory().unwrap(),
        Arc::new(DirectMessenger::new(Duration::from_secs(1))),
        Duration::from_secs(2),
    )
}

async fn start_listener(username: &str) -> (InboundListener, u16, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(8);
    let mut config = ListenerConfig::new("127.0.0.1", PeerRecord::new(username, "127.0.0.1", 0));
    config.read_timeout = Duration::from_millis(500);
    let listener = InboundListener::new(config, Arc::new(tx));
    let port = listener.start().await.unwrap().port();
    (listener, port, rx)
}

#[tokio::test]
async fn test_relay_reaches_live_listener() {
    let registry = registry();
    let (listener, port, mut rx) = start_listener("bob").await;

    let alice = PeerRecord::new("alice", "127.0.0.1", 9001);
    let bob = PeerRecord::new("bob", "127.0.0.1", port);
    registry.register(alice.clone()).unwrap();
    registry.register(bob.clone()).unwrap();

    registry
        .relay(&Message::new(alice, bob, "relayed hello"))
        .await
        .unwrap();

    let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.data(), "relayed hello");
    listener.stop().await;
}

#[tokio::test]
async fn test_relay_to_stopped_listener_fails_loudly() {
    let registry = registry();
    let (listener, port, _rx) = start_listener("bob").await;
    listener.stop().await;

    let alice = PeerRecord::new("alice", "127.0.0.1", 9001);
    let bob = PeerRecord::new("bob", "127.0.0.1", port);
    registry.register(bob.clone()).unwrap();

    let err = registry
        .relay(&Message::new(alice, bob, "anyone there?"))
        .await
        .unwrap_err();
    assert!(matches!(err, PeerLinkError::RelayFailed(_)), "got {err:?}");
}

#[tokio::test]
async fn test_concurrent_distinct_registrations_all_succeed() {
    let registry = registry();
    let mut tasks = Vec::new();
    for i in 0..16u16 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.register(PeerRecord::new(format!("peer-{i}"), "127.0.0.1", 10_000 + i))
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let peers = registry.list().unwrap();
    assert_eq!(peers.len(), 16);
    for i in 0..16u16 {
        let name = format!("peer-{i}");
        assert_eq!(peers.iter().filter(|p| p.username == name).count(), 1);
    }
}
