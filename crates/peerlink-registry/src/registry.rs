//! Peer registry — the authoritative username → address mapping.
//!
//! [`PeerRegistry`] wraps a [`PeerStore`] with validation and logging, and
//! performs the registry's half of relay delivery: resolve the receiver from
//! its own records, then push the payload over a [`Transport`] within a
//! bounded time.
//!
//! Duplicate registrations are rejected; the first record for a username
//! stays until it is explicitly unregistered.

use crate::store::PeerStore;
use peerlink_types::config::RegistryConfig;
use peerlink_types::error::{PeerLinkError, PeerLinkResult};
use peerlink_types::{Message, PeerRecord};
use peerlink_wire::{DirectMessenger, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Thread-safe registry of reachable peers.
#[derive(Clone)]
pub struct PeerRegistry {
    store: PeerStore,
    transport: Arc<dyn Transport>,
    relay_timeout: Duration,
}

impl PeerRegistry {
    pub fn new(store: PeerStore, transport: Arc<dyn Transport>, relay_timeout: Duration) -> Self {
        Self {
            store,
            transport,
            relay_timeout,
        }
    }

    /// Build a registry from config: file-backed when `db_path` is set,
    /// in-memory otherwise, relaying through a [`DirectMessenger`].
    pub fn from_config(config: &RegistryConfig) -> PeerLinkResult<Self> {
        let store = match &config.db_path {
            Some(path) => {
                info!(path = %path.display(), "opening peer database");
                PeerStore::open(path)?
            }
            None => PeerStore::open_in_memory()?,
        };
        let messenger = DirectMessenger::new(config.relay_timeout());
        Ok(Self::new(
            store,
            Arc::new(messenger),
            config.relay_timeout(),
        ))
    }

    /// Register a new peer. Rejects invalid records and taken usernames.
    pub fn register(&self, record: PeerRecord) -> PeerLinkResult<PeerRecord> {
        record.validate()?;
        match self.store.insert(&record) {
            Ok(stored) => {
                info!(peer = %stored, "peer registered");
                Ok(stored)
            }
            Err(e) => {
                warn!(peer = %record, "registration rejected: {e}");
                Err(e)
            }
        }
    }

    /// All registered peers in insertion order.
    pub fn list(&self) -> PeerLinkResult<Vec<PeerRecord>> {
        self.store.list()
    }

    /// Remove a peer.
    pub fn unregister(&self, username: &str) -> PeerLinkResult<PeerRecord> {
        let removed = self.store.remove(username)?;
        info!(peer = %removed, "peer unregistered");
        Ok(removed)
    }

    /// Current address of a peer.
    pub fn resolve(&self, username: &str) -> PeerLinkResult<PeerRecord> {
        self.store
            .get(username)?
            .ok_or_else(|| PeerLinkError::NotFound(username.to_string()))
    }

    pub fn count(&self) -> PeerLinkResult<usize> {
        self.store.count()
    }

    /// Forward a message to its receiver's registered address.
    ///
    /// The address carried inside the message is ignored; only the registry's
    /// own record is trusted. Returns the record the payload went to.
    /// `NotFound` if the receiver is unknown, `RelayFailed` on connection
    /// error or when `relay_timeout` elapses.
    pub async fn relay(&self, message: &Message) -> PeerLinkResult<PeerRecord> {
        let target = self.resolve(&message.receiver().username)?;
        let send = self
            .transport
            .send(&target.host, target.port, message.data());

        match tokio::time::timeout(self.relay_timeout, send).await {
            Ok(Ok(())) => {
                info!(
                    from = %message.sender().username,
                    to = %target,
                    "message relayed"
                );
                Ok(target)
            }
            Ok(Err(e)) => {
                warn!(to = %target, "relay delivery failed: {e}");
                Err(PeerLinkError::RelayFailed(e.to_string()))
            }
            Err(_) => {
                warn!(to = %target, "relay delivery timed out");
                Err(PeerLinkError::RelayFailed(format!(
                    "delivery to {target} timed out after {}ms",
                    self.relay_timeout.as_millis()
                )))
            }
        }
    }
}
