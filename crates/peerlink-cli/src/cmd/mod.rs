//! Command implementations by domain.

pub mod account;
pub mod peer;
pub mod registry;

use peerlink_kernel::config::load_config;
use peerlink_types::config::PeerLinkConfig;
use std::path::PathBuf;

pub(crate) fn load(config: Option<PathBuf>) -> PeerLinkConfig {
    load_config(config.as_deref())
}
