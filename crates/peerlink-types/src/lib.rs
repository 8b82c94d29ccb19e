//! Core types for PeerLink.
//!
//! This crate defines the value types shared by the registry, the wire
//! layer, and the peer kernel. It contains no business logic.

pub mod account;
pub mod config;
pub mod error;
pub mod message;
pub mod peer;

pub use account::Account;
pub use error::{PeerLinkError, PeerLinkResult};
pub use message::{DeliveryOutcome, Message};
pub use peer::PeerRecord;
