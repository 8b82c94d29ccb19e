//! Message dispatch: direct first, then one relay attempt.
//!
//! ```text
//! TryDirect --ok--> DeliveredDirect
//!     |
//!   error
//!     v
//! TryRelay  --ok--> DeliveredRelay
//!     |
//!   error
//!     v
//! Failed(direct error + relay error)
//! ```

use crate::relay::RelaySend;
use peerlink_types::{DeliveryOutcome, Message};
use peerlink_wire::Transport;
use std::sync::Arc;
use tracing::{info, warn};

/// Delivers messages over a direct transport with a single relay fallback.
#[derive(Clone)]
pub struct Dispatcher {
    direct: Arc<dyn Transport>,
    relay: Arc<dyn RelaySend>,
}

impl Dispatcher {
    pub fn new(direct: Arc<dyn Transport>, relay: Arc<dyn RelaySend>) -> Self {
        Self { direct, relay }
    }

    /// Deliver `message`. Never retries beyond the one fallback hop.
    pub async fn dispatch(&self, message: &Message) -> DeliveryOutcome {
        let receiver = message.receiver();

        let direct_err = match self
            .direct
            .send(&receiver.host, receiver.port, message.data())
            .await
        {
            Ok(()) => {
                info!(to = %receiver, "delivered directly");
                return DeliveryOutcome::DeliveredDirect;
            }
            Err(e) => e,
        };

        warn!(to = %receiver, "direct delivery failed, trying relay: {direct_err}");

        match self.relay.relay(message).await {
            Ok(()) => {
                info!(to = %receiver.username, "delivered via relay");
                DeliveryOutcome::DeliveredRelay
            }
            Err(relay_err) => {
                warn!(to = %receiver.username, "relay failed: {relay_err}");
                DeliveryOutcome::Failed(format!(
                    "direct delivery failed ({direct_err}); relay failed ({relay_err})"
                ))
            }
        }
    }
}
