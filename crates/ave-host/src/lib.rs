//! Host crate: transport implementations for AVE
//!
//! This crate contains the mechanical bridge between a scheduler's
//! `SEND` effects and actor mailboxes. It intentionally contains no
//! routing policy beyond the scheduler's own table.

pub use ave_core::transport::{Delivery, Transport};
pub use ave_core::MessagePayload;

use std::sync::Arc;

use tracing::trace;

use ave_core::actor::{ActorAddr, MailboxRouter};
use ave_core::Scheduler;

/// In-process transport: encodes each payload to its wire form and
/// enqueues it on the target's mailbox through the scheduler's routing
/// table. The wire encode/decode pass is deliberate; local delivery
/// exercises the same codec path a networked transport would.
pub struct LoopbackTransport {
    router: Arc<MailboxRouter>,
}

impl LoopbackTransport {
    pub fn new(router: Arc<MailboxRouter>) -> Self {
        LoopbackTransport { router }
    }

    /// Build a scheduler-ready transport and install it
    pub fn install(scheduler: &mut Scheduler) {
        let transport = LoopbackTransport::new(scheduler.router());
        scheduler.set_transport(Box::new(transport));
    }
}

impl Transport for LoopbackTransport {
    fn deliver(&self, payload: &MessagePayload, target: ActorAddr) -> Delivery {
        let bytes = payload.encode();
        let outcome = self.router.enqueue(bytes, target);
        trace!(%target, %outcome, "loopback delivery");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ave_core::message::{MsgOp, Shape};

    #[test]
    fn delivery_reaches_a_registered_mailbox() {
        let router = Arc::new(MailboxRouter::new());
        let mailbox = ave_core::actor::Mailbox::new();
        router.register(ActorAddr(3), mailbox.sender());

        let transport = LoopbackTransport::new(Arc::clone(&router));
        let payload = MessagePayload {
            ops: vec![MsgOp::Int(0, 9), MsgOp::Store(0, 0)],
            shape: Shape::Slot(0),
        };
        assert_eq!(transport.deliver(&payload, ActorAddr(3)), Delivery::Accepted);
        assert_eq!(mailbox.try_take(), Some(payload.encode()));
    }

    #[test]
    fn delivery_to_unknown_address_is_rejected() {
        let router = Arc::new(MailboxRouter::new());
        let transport = LoopbackTransport::new(router);
        let payload = MessagePayload {
            ops: vec![],
            shape: Shape::Slot(0),
        };
        assert!(matches!(
            transport.deliver(&payload, ActorAddr(99)),
            Delivery::Rejected(_)
        ));
    }
}
