//! Messages and delivery outcomes.

use crate::peer::PeerRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A text message from one peer to another.
///
/// Immutable once built: fields are private and only readable through
/// accessors. Exists only for the duration of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: PeerRecord,
    receiver: PeerRecord,
    /// Older clients post the text as `content`.
    #[serde(alias = "content")]
    data: String,
}

impl Message {
    pub fn new(sender: PeerRecord, receiver: PeerRecord, data: impl Into<String>) -> Self {
        Self {
            sender,
            receiver,
            data: data.into(),
        }
    }

    pub fn sender(&self) -> &PeerRecord {
        &self.sender
    }

    pub fn receiver(&self) -> &PeerRecord {
        &self.receiver
    }

    pub fn data(&self) -> &str {
        &self.data
    }
}

/// Result of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The receiver's listener accepted the payload directly.
    DeliveredDirect,
    /// The registry forwarded the payload on the sender's behalf.
    DeliveredRelay,
    /// Both paths failed.
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeliveredDirect => write!(f, "delivered directly"),
            Self::DeliveredRelay => write!(f, "delivered via relay"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
