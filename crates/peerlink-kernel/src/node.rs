//! One peer process: inbound listener plus registry membership.

use crate::dispatcher::Dispatcher;
use crate::registry_client::{ClientError, RegistryClient};
use crate::relay::RelayFallback;
use peerlink_types::config::PeerConfig;
use peerlink_types::{DeliveryOutcome, Message, PeerLinkError, PeerLinkResult, PeerRecord};
use peerlink_wire::{DirectMessenger, InboundListener, ListenerConfig, MessageHandler, WireError};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A running peer.
///
/// Booting binds the listener first and then registers, so the registry never
/// hands out an address nobody is listening on. A failed registration is
/// reported through [`registration_error`](Self::registration_error) but
/// does not stop the node; the peer can still receive direct messages.
pub struct PeerNode {
    identity: PeerRecord,
    local_addr: SocketAddr,
    client: RegistryClient,
    dispatcher: Dispatcher,
    listener: InboundListener,
    registration_error: Option<ClientError>,
    /// Set only when this node's own registration succeeded.
    registered: AtomicBool,
}

impl PeerNode {
    /// Start listening as `identity` and register with the registry.
    ///
    /// An identity port of `0` binds an ephemeral port; the bound port is
    /// what gets registered.
    pub async fn boot(
        config: &PeerConfig,
        identity: PeerRecord,
        handler: Arc<dyn MessageHandler>,
    ) -> PeerLinkResult<Self> {
        let mut listener_config = ListenerConfig::new(config.bind_host.clone(), identity.clone());
        listener_config.max_frame_size = config.max_frame_size;
        listener_config.read_timeout = config.read_timeout();
        listener_config.drain_timeout = config.drain_timeout();

        let listener = InboundListener::new(listener_config, handler);
        let local_addr = listener.start().await.map_err(wire_error)?;

        let mut identity = identity;
        if identity.port == 0 {
            identity.port = local_addr.port();
        }

        let client = RegistryClient::from_config(config);
        let dispatcher = Dispatcher::new(
            Arc::new(DirectMessenger::new(config.connect_timeout())),
            Arc::new(RelayFallback::new(client.clone())),
        );

        let registration_error = match client.register_by_record(&identity).await {
            Ok(_) => None,
            Err(e) => {
                warn!(peer = %identity, "registration failed, listener stays up: {e}");
                Some(e)
            }
        };

        info!(peer = %identity, addr = %local_addr, "peer node up");
        Ok(Self {
            identity,
            local_addr,
            client,
            dispatcher,
            listener,
            registered: AtomicBool::new(registration_error.is_none()),
            registration_error,
        })
    }

    pub fn identity(&self) -> &PeerRecord {
        &self.identity
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn client(&self) -> &RegistryClient {
        &self.client
    }

    /// Why registration failed at boot, if it did.
    pub fn registration_error(&self) -> Option<&ClientError> {
        self.registration_error.as_ref()
    }

    /// Look `username` up in the registry and deliver `text` to it.
    pub async fn dispatch_to(&self, username: &str, text: &str) -> PeerLinkResult<DeliveryOutcome> {
        let receiver = self.client.resolve(username).await?;
        Ok(self.dispatch_to_record(receiver, text).await)
    }

    /// Deliver `text` to a receiver whose address the caller already holds.
    pub async fn dispatch_to_record(&self, receiver: PeerRecord, text: &str) -> DeliveryOutcome {
        let message = Message::new(self.identity.clone(), receiver, text);
        self.dispatcher.dispatch(&message).await
    }

    /// Registered peers other than this one. Empty if the registry is down.
    pub async fn peers(&self) -> Vec<PeerRecord> {
        self.client
            .available()
            .await
            .into_iter()
            .filter(|p| p.username != self.identity.username)
            .collect()
    }

    /// Whether the registry record for this username belongs to this node.
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Unregister (best-effort) and stop the listener.
    ///
    /// A node whose registration was refused never unregisters: the record
    /// under its username belongs to another peer.
    pub async fn shutdown(&self) {
        if self.registered.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.client.unregister(&self.identity.username).await {
                warn!(username = %self.identity.username, "unregister failed: {e}");
            }
        } else {
            debug!(username = %self.identity.username, "not registered, skipping unregister");
        }
        self.listener.stop().await;
        info!(peer = %self.identity, "peer node stopped");
    }

    /// Stop the listener but stay registered.
    pub async fn stop_listener(&self) {
        self.listener.stop().await;
    }
}

fn wire_error(e: WireError) -> PeerLinkError {
    match e {
        WireError::Io(io) => PeerLinkError::Io(io),
        WireError::InvalidConfig(reason) => PeerLinkError::Config(reason),
        other => PeerLinkError::Internal(other.to_string()),
    }
}
