//! Peer address records.

use crate::error::{PeerLinkError, PeerLinkResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest port a peer may register.
pub const MIN_PEER_PORT: u16 = 1024;

/// Username reported for inbound senders, since the wire carries no sender header.
pub const UNKNOWN_USERNAME: &str = "unknown";

/// A peer identified by its username and reachable address.
///
/// The registry owns the authoritative copy; everything else holds clones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Unique, non-empty identity key.
    pub username: String,
    /// IP address or hostname the peer listens on.
    pub host: String,
    /// TCP port the peer listens on.
    pub port: u16,
}

impl PeerRecord {
    pub fn new(username: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            username: username.into(),
            host: host.into(),
            port,
        }
    }

    /// Check the registration constraints: non-empty username and host,
    /// port within `[1024, 65535]`.
    pub fn validate(&self) -> PeerLinkResult<()> {
        if self.username.trim().is_empty() {
            return Err(PeerLinkError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(PeerLinkError::InvalidInput(format!(
                "host must not be empty for '{}'",
                self.username
            )));
        }
        if self.port < MIN_PEER_PORT {
            return Err(PeerLinkError::InvalidInput(format!(
                "port {} is outside {MIN_PEER_PORT}-65535",
                self.port
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PeerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.username, self.host, self.port)
    }
}
