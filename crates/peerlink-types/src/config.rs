//! Configuration types for the registry service and peer processes.
//!
//! One [`PeerLinkConfig`] value is built at startup and handed to every
//! component constructor. Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration (`~/.peerlink/config.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerLinkConfig {
    /// Registry service settings.
    pub registry: RegistryConfig,
    /// Peer process settings.
    pub peer: PeerConfig,
}

/// Settings for the registry service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Address the HTTP service binds to.
    pub listen_addr: String,
    /// SQLite database file. In-memory when unset.
    pub db_path: Option<PathBuf>,
    /// Upper bound on the relay's second-hop delivery.
    pub relay_timeout_ms: u64,
    /// Token budget per client IP per minute.
    pub rate_limit_per_minute: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            db_path: None,
            relay_timeout_ms: 5_000,
            rate_limit_per_minute: 600,
        }
    }
}

impl RegistryConfig {
    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }
}

/// Settings for a peer process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Base URL of the registry service.
    pub registry_url: String,
    /// Host the inbound listener binds to.
    pub bind_host: String,
    /// Timeout for opening a direct connection.
    pub connect_timeout_ms: u64,
    /// Timeout for each registry HTTP request.
    pub request_timeout_ms: u64,
    /// How long an inbound sender may stay silent before the read ends.
    pub read_timeout_ms: u64,
    /// Largest inbound payload in bytes; anything beyond is cut off.
    pub max_frame_size: usize,
    /// How long `stop()` waits for in-flight connections.
    pub drain_timeout_ms: u64,
    /// Accounts file. Defaults to `~/.peerlink/accounts.json`.
    pub accounts_file: Option<PathBuf>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            registry_url: "http://127.0.0.1:8000".to_string(),
            bind_host: "127.0.0.1".to_string(),
            connect_timeout_ms: 3_000,
            request_timeout_ms: 10_000,
            read_timeout_ms: 5_000,
            max_frame_size: 1024,
            drain_timeout_ms: 2_000,
            accounts_file: None,
        }
    }
}

impl PeerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
