//! Peer-side core for PeerLink.
//!
//! Talks to the registry over HTTP, dispatches messages directly with a
//! single relay fallback, persists local accounts, and ties the inbound
//! listener and registry membership together in [`PeerNode`].

pub mod account;
pub mod config;
pub mod dispatcher;
pub mod node;
pub mod registry_client;
pub mod relay;

pub use account::AccountStore;
pub use dispatcher::Dispatcher;
pub use node::PeerNode;
pub use registry_client::{ClientError, RegistryClient};
pub use relay::{RelayFallback, RelaySend};
