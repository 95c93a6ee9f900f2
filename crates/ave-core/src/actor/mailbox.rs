//! Mailbox & Router
//!
//! Per-actor FIFO of raw message payload bytes. The producer side is a
//! clonable channel sender, safe for concurrent enqueue from transport
//! threads; the consumer side belongs to the owning actor alone. Decoding
//! happens at `RECV`, in the receiver's context, so a hostile payload can
//! only ever hurt the message itself.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::transport::Delivery;

/// Address of an actor, unique within a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorAddr(pub u64);

impl fmt::Display for ActorAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// FIFO queue of pending raw payloads for one actor
#[derive(Debug)]
pub struct Mailbox {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl Mailbox {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Mailbox { tx, rx }
    }

    /// Producer handle for the router; clonable across threads
    pub fn sender(&self) -> Sender<Vec<u8>> {
        self.tx.clone()
    }

    /// Non-blocking dequeue by the owning actor
    pub fn try_take(&self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Consumer end, used by the scheduler to wait on many mailboxes
    pub fn receiver(&self) -> &Receiver<Vec<u8>> {
        &self.rx
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing table from actor addresses to mailbox senders. This is the
/// inbound half of the transport interface: `enqueue` is what a transport
/// calls when a message arrives for a locally hosted actor.
#[derive(Debug, Default)]
pub struct MailboxRouter {
    routes: RwLock<HashMap<ActorAddr, Sender<Vec<u8>>>>,
}

impl MailboxRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, addr: ActorAddr, sender: Sender<Vec<u8>>) {
        if let Ok(mut routes) = self.routes.write() {
            routes.insert(addr, sender);
        }
    }

    /// Terminated actors become unroutable
    pub fn unregister(&self, addr: ActorAddr) {
        if let Ok(mut routes) = self.routes.write() {
            routes.remove(&addr);
        }
    }

    /// Append a payload to the target's mailbox, FIFO order preserved
    pub fn enqueue(&self, payload: Vec<u8>, target: ActorAddr) -> Delivery {
        let routes = match self.routes.read() {
            Ok(routes) => routes,
            Err(_) => return Delivery::Rejected("router poisoned".to_string()),
        };
        match routes.get(&target) {
            Some(sender) => match sender.send(payload) {
                Ok(()) => Delivery::Accepted,
                Err(_) => Delivery::Rejected(format!("{target} mailbox closed")),
            },
            None => Delivery::Rejected(format!("{target} is not routable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let mailbox = Mailbox::new();
        let sender = mailbox.sender();
        sender.send(vec![1]).unwrap();
        sender.send(vec![2]).unwrap();
        assert_eq!(mailbox.try_take(), Some(vec![1]));
        assert_eq!(mailbox.try_take(), Some(vec![2]));
        assert_eq!(mailbox.try_take(), None);
    }

    #[test]
    fn concurrent_enqueue_loses_nothing() {
        let mailbox = Mailbox::new();
        let router = MailboxRouter::new();
        let addr = ActorAddr(1);
        router.register(addr, mailbox.sender());

        let router = std::sync::Arc::new(router);
        let mut handles = Vec::new();
        for t in 0..4u8 {
            let router = router.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..100u8 {
                    assert_eq!(router.enqueue(vec![t, i], addr), Delivery::Accepted);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(mailbox.len(), 400);
    }

    #[test]
    fn unroutable_target_rejected() {
        let router = MailboxRouter::new();
        assert!(matches!(
            router.enqueue(vec![], ActorAddr(9)),
            Delivery::Rejected(_)
        ));
    }

    #[test]
    fn unregister_makes_unroutable() {
        let mailbox = Mailbox::new();
        let router = MailboxRouter::new();
        let addr = ActorAddr(2);
        router.register(addr, mailbox.sender());
        assert_eq!(router.enqueue(vec![0], addr), Delivery::Accepted);
        router.unregister(addr);
        assert!(matches!(
            router.enqueue(vec![0], addr),
            Delivery::Rejected(_)
        ));
    }
}
