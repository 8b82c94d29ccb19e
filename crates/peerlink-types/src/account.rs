//! Locally persisted accounts.

use crate::peer::PeerRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A local identity the user can log in as.
///
/// Holds the peer address it registers with rather than extending it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The address this account registers with.
    #[serde(flatten)]
    pub peer: PeerRecord,
    /// When the account was first saved.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(peer: PeerRecord) -> Self {
        Self {
            peer,
            created_at: Utc::now(),
        }
    }

    pub fn username(&self) -> &str {
        &self.peer.username
    }
}
