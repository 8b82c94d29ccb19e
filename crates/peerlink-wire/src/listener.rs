//! InboundListener — accepts direct connections from other peers.
//!
//! An [`InboundListener`] binds a TCP port and spawns an accept loop. Every
//! accepted connection runs in its own task: it reads whatever the sender
//! writes before closing (bounded by `max_frame_size`), decodes it as UTF-8,
//! and passes the resulting [`Message`] to the registered [`MessageHandler`].
//!
//! A failing or panicking handler only ends its own connection task; the
//! accept loop keeps running.

use async_trait::async_trait;
use peerlink_types::peer::UNKNOWN_USERNAME;
use peerlink_types::{Message, PeerLinkError, PeerRecord};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Errors from the listener lifecycle.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Listener already bound on {0}")]
    AlreadyStarted(SocketAddr),
    #[error("Invalid listener config: {0}")]
    InvalidConfig(String),
}

/// Callback that receives every decoded inbound message.
///
/// Called once per connection, concurrently across connections. Returning
/// `Err` (or panicking) is logged and isolated to that connection.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn on_message(&self, message: Message) -> Result<(), String>;
}

/// Forward inbound messages into a channel.
#[async_trait]
impl MessageHandler for mpsc::Sender<Message> {
    async fn on_message(&self, message: Message) -> Result<(), String> {
        self.send(message)
            .await
            .map_err(|_| "message channel closed".to_string())
    }
}

/// Configuration for an InboundListener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Host to bind on.
    pub bind_host: String,
    /// Port to bind on (`0` picks an ephemeral port).
    pub port: u16,
    /// This peer's identity, used as the receiver of inbound messages.
    pub identity: PeerRecord,
    /// Largest payload read from one connection.
    pub max_frame_size: usize,
    /// How long a sender may stay silent before the payload is considered complete.
    pub read_timeout: Duration,
    /// How long `stop()` waits for in-flight connections before aborting them.
    pub drain_timeout: Duration,
}

impl ListenerConfig {
    pub fn new(bind_host: impl Into<String>, identity: PeerRecord) -> Self {
        Self {
            bind_host: bind_host.into(),
            port: identity.port,
            identity,
            max_frame_size: 1024,
            read_timeout: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(2),
        }
    }
}

/// First allocation for an inbound payload.
const INITIAL_READ_CAPACITY: usize = 4096;

/// State shared by every connection task.
struct ConnectionContext {
    identity: PeerRecord,
    handler: Arc<dyn MessageHandler>,
    max_frame_size: usize,
    read_timeout: Duration,
}

struct Running {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

/// Per-peer listener for direct deliveries.
pub struct InboundListener {
    config: ListenerConfig,
    handler: Arc<dyn MessageHandler>,
    running: Mutex<Option<Running>>,
}

impl InboundListener {
    pub fn new(config: ListenerConfig, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            config,
            handler,
            running: Mutex::new(None),
        }
    }

    /// Bind and spawn the accept loop. Returns the bound address.
    ///
    /// Fails with [`WireError::AlreadyStarted`] if the listener is already bound,
    /// and with [`WireError::InvalidConfig`] for a zero `max_frame_size`.
    pub async fn start(&self) -> Result<SocketAddr, WireError> {
        if self.config.max_frame_size == 0 {
            return Err(WireError::InvalidConfig(
                "max_frame_size must be at least 1".into(),
            ));
        }
        let mut running = self.running.lock().await;
        if let Some(r) = running.as_ref() {
            return Err(WireError::AlreadyStarted(r.local_addr));
        }

        let listener =
            TcpListener::bind((self.config.bind_host.as_str(), self.config.port)).await?;
        let local_addr = listener.local_addr()?;

        info!(
            addr = %local_addr,
            username = %self.config.identity.username,
            "listening for direct messages"
        );

        let mut identity = self.config.identity.clone();
        if identity.port == 0 {
            identity.port = local_addr.port();
        }
        let ctx = Arc::new(ConnectionContext {
            identity,
            handler: Arc::clone(&self.handler),
            max_frame_size: self.config.max_frame_size,
            read_timeout: self.config.read_timeout,
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let drain_timeout = self.config.drain_timeout;
        let accept_task = tokio::spawn(async move {
            accept_loop(listener, ctx, shutdown_rx, drain_timeout).await;
        });

        *running = Some(Running {
            local_addr,
            shutdown_tx,
            accept_task,
        });
        Ok(local_addr)
    }

    /// Stop accepting, release the port, and drain in-flight connections.
    ///
    /// Does nothing if the listener is not running.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        let _ = running.shutdown_tx.send(true);
        if let Err(e) = running.accept_task.await {
            error!(addr = %running.local_addr, "accept loop ended abnormally: {e}");
        }
        info!(addr = %running.local_addr, "listener stopped");
    }

    /// The bound address, if running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

/// Accept loop — runs in a spawned task until shutdown is signalled.
async fn accept_loop(
    listener: TcpListener,
    ctx: Arc<ConnectionContext>,
    mut shutdown_rx: watch::Receiver<bool>,
    drain_timeout: Duration,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!(from = %addr, "accepted connection");
                    connections.spawn(handle_connection(stream, addr, Arc::clone(&ctx)));
                }
                Err(e) => {
                    error!("accept error: {e}");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                log_connection_exit(joined);
            }
        }
    }

    // Release the port before waiting on stragglers.
    drop(listener);

    let drained = tokio::time::timeout(drain_timeout, async {
        while let Some(joined) = connections.join_next().await {
            log_connection_exit(joined);
        }
    })
    .await;
    if drained.is_err() {
        warn!(
            remaining = connections.len(),
            "drain timeout elapsed, aborting in-flight connections"
        );
        connections.abort_all();
    }
}

fn log_connection_exit(joined: Result<(), JoinError>) {
    match joined {
        Ok(()) => {}
        Err(e) if e.is_panic() => error!("message handler panicked; connection dropped"),
        Err(e) => debug!("connection task cancelled: {e}"),
    }
}

/// Handle one inbound connection: read, decode, hand off, close.
async fn handle_connection(mut stream: TcpStream, addr: SocketAddr, ctx: Arc<ConnectionContext>) {
    let payload = match read_payload(&mut stream, ctx.max_frame_size, ctx.read_timeout).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(from = %addr, "read failed: {e}");
            return;
        }
    };

    if payload.is_empty() {
        warn!(from = %addr, "empty message received");
        let _ = stream.shutdown().await;
        return;
    }

    let truncated = payload.len() >= ctx.max_frame_size;
    match decode_payload(payload, truncated) {
        Ok(text) => {
            info!(from = %addr, bytes = text.len(), "message received");
            let sender = PeerRecord::new(UNKNOWN_USERNAME, addr.ip().to_string(), addr.port());
            let message = Message::new(sender, ctx.identity.clone(), text);
            if let Err(e) = ctx.handler.on_message(message).await {
                warn!(from = %addr, "message handler failed: {e}");
            }
        }
        Err(e) => warn!(from = %addr, "dropping message: {e}"),
    }

    let _ = stream.shutdown().await;
    debug!(from = %addr, "connection closed");
}

/// Read until EOF, `max` bytes, or `idle` passes without new data.
pub(crate) async fn read_payload<R: AsyncRead + Unpin>(
    reader: &mut R,
    max: usize,
    idle: Duration,
) -> std::io::Result<Vec<u8>> {
    // Grows with what the sender actually writes, never past `max`.
    let mut buf = Vec::with_capacity(max.min(INITIAL_READ_CAPACITY));
    while buf.len() < max {
        let mut limited = (&mut *reader).take((max - buf.len()) as u64);
        match tokio::time::timeout(idle, limited.read_buf(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e),
            // Sender stopped writing without closing.
            Err(_) => break,
        }
    }
    Ok(buf)
}

/// Decode a payload as UTF-8.
///
/// When the read was cut off at the frame limit, a multi-byte character split
/// by the cut is dropped rather than failing the whole message.
pub(crate) fn decode_payload(mut bytes: Vec<u8>, truncated: bool) -> Result<String, PeerLinkError> {
    match std::str::from_utf8(&bytes) {
        Ok(_) => {}
        Err(e) if truncated && e.error_len().is_none() => {
            bytes.truncate(e.valid_up_to());
        }
        Err(e) => return Err(PeerLinkError::Decode(e.to_string())),
    }
    String::from_utf8(bytes).map_err(|e| PeerLinkError::Decode(e.to_string()))
}
