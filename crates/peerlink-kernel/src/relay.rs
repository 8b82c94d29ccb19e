//! Relay fallback: hand a message to the registry for forwarding.

use crate::registry_client::{ClientError, RegistryClient};
use async_trait::async_trait;
use peerlink_types::{Message, PeerLinkError, PeerLinkResult};

/// Second delivery path, used when direct delivery fails.
#[async_trait]
pub trait RelaySend: Send + Sync + 'static {
    /// One attempt, no retries. `NotFound` if the receiver is unknown to
    /// the relay, `RelayFailed` for every other failure.
    async fn relay(&self, message: &Message) -> PeerLinkResult<()>;
}

/// Relays through the registry's `/send/` endpoint. Never contacts the
/// receiver itself.
#[derive(Debug, Clone)]
pub struct RelayFallback {
    client: RegistryClient,
}

impl RelayFallback {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RelaySend for RelayFallback {
    async fn relay(&self, message: &Message) -> PeerLinkResult<()> {
        self.client.relay(message).await.map_err(|e| match e {
            ClientError::NotFound(detail) => PeerLinkError::NotFound(detail),
            other => PeerLinkError::RelayFailed(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_types::PeerRecord;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_registry_is_relay_failed() {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = l.local_addr().unwrap().port();
        drop(l);
        let relay = RelayFallback::new(RegistryClient::new(
            &format!("http://127.0.0.1:{port}"),
            Duration::from_secs(2),
            Duration::from_secs(1),
        ));

        let msg = Message::new(
            PeerRecord::new("alice", "127.0.0.1", 9001),
            PeerRecord::new("bob", "127.0.0.1", 9002),
            "hi",
        );
        let err = relay.relay(&msg).await.unwrap_err();
        assert!(matches!(err, PeerLinkError::RelayFailed(_)));
    }
}
