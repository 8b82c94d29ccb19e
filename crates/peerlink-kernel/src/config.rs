//! Configuration loading from `~/.peerlink/config.toml` with defaults.

use peerlink_types::config::{PeerConfig, PeerLinkConfig};
use std::path::{Path, PathBuf};
use tracing::info;

/// Overrides `peer.registry_url` when set.
pub const REGISTRY_URL_ENV: &str = "PEERLINK_REGISTRY_URL";

/// Load configuration from a TOML file, with defaults.
///
/// Missing, unreadable, or invalid files fall back to defaults; the
/// `PEERLINK_REGISTRY_URL` environment variable is applied last.
pub fn load_config(path: Option<&Path>) -> PeerLinkConfig {
    let mut config = load_file(path);
    apply_env_overrides(&mut config, std::env::var(REGISTRY_URL_ENV).ok());
    sanitize(&mut config);
    config
}

/// Replace values the runtime cannot work with by their defaults.
fn sanitize(config: &mut PeerLinkConfig) {
    if config.peer.max_frame_size == 0 {
        let fallback = PeerConfig::default().max_frame_size;
        tracing::warn!(
            fallback,
            "peer.max_frame_size must be at least 1, using default"
        );
        config.peer.max_frame_size = fallback;
    }
}

fn load_file(path: Option<&Path>) -> PeerLinkConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return PeerLinkConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<PeerLinkConfig>(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                PeerLinkConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            PeerLinkConfig::default()
        }
    }
}

fn apply_env_overrides(config: &mut PeerLinkConfig, registry_url: Option<String>) {
    if let Some(url) = registry_url.filter(|u| !u.trim().is_empty()) {
        info!(url = %url, "registry URL taken from {REGISTRY_URL_ENV}");
        config.peer.registry_url = url;
    }
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    peerlink_home().join("config.toml")
}

/// Get the PeerLink home directory.
pub fn peerlink_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".peerlink")
}

/// Where accounts are stored unless `peer.accounts_file` says otherwise.
pub fn default_accounts_path() -> PathBuf {
    peerlink_home().join("accounts.json")
}
