//! Transport Interface
//!
//! Delivery of serialized messages between actor addresses is a vendor
//! concern; the VM's responsibility ends at hand-off. Inbound delivery
//! for locally hosted actors goes through [`MailboxRouter::enqueue`]
//! (see the actor module).
//!
//! [`MailboxRouter::enqueue`]: crate::actor::MailboxRouter::enqueue

use std::fmt;

use crate::actor::ActorAddr;
use crate::message::MessagePayload;

/// Outcome of a transport hand-off. `Rejected` is informational; a send
/// is fire-and-forget from the actor's perspective.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Accepted,
    Rejected(String),
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Accepted => f.write_str("accepted"),
            Delivery::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

/// Vendor-supplied message carrier. Implementations may cross process or
/// host boundaries; the in-process loopback lives in `ave-host`.
pub trait Transport: Send {
    fn deliver(&self, payload: &MessagePayload, target: ActorAddr) -> Delivery;
}
