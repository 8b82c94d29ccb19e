//! Shared error types for PeerLink.

use thiserror::Error;

/// Top-level error type for the PeerLink system.
#[derive(Error, Debug)]
pub enum PeerLinkError {
    /// The target refused or could not be reached.
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// A network operation exceeded its time budget.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The username is not known to the registry.
    #[error("Peer not found: {0}")]
    NotFound(String),

    /// A peer with this username is already registered.
    #[error("Peer already registered: {0}")]
    Conflict(String),

    /// The registry could not forward a relayed message.
    #[error("Relay failed: {0}")]
    RelayFailed(String),

    /// Inbound bytes were not valid UTF-8 text.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A record or argument failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The registry backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Alias for Result with PeerLinkError.
pub type PeerLinkResult<T> = Result<T, PeerLinkError>;
