//! Peer registry for PeerLink.
//!
//! Holds the authoritative username → address mapping and performs the
//! registry side of relay delivery.
//!
//! - **PeerStore** (SQLite): records with a unique username, mutated in transactions
//! - **PeerRegistry**: register/list/unregister/resolve plus bounded relay forwarding

pub mod migration;
pub mod registry;
pub mod store;

pub use registry::PeerRegistry;
pub use store::PeerStore;
