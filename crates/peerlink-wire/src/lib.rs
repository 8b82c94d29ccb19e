//! PeerLink wire layer: peer-to-peer text delivery over raw TCP.
//!
//! The protocol has no framing: a message is the UTF-8 text a sender writes
//! before closing its side of the connection. There are no headers and no
//! acknowledgement.
//!
//! ## Architecture
//!
//! - **InboundListener**: binds a TCP port and hands each received message
//!   to a [`MessageHandler`]
//! - **DirectMessenger**: opens one connection per message and writes it
//! - **Transport**: the seam the registry relay and the dispatcher send through

pub mod listener;
pub mod messenger;

pub use listener::{InboundListener, ListenerConfig, MessageHandler, WireError};
pub use messenger::{DirectMessenger, SendError, Transport};
