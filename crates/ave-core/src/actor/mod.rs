//! Actor runtime: isolated execution units, their mailboxes, and the
//! cooperative scheduler that drives them.

pub mod actor;
pub mod mailbox;
pub mod scheduler;

pub use actor::{Actor, ActorState, Effect};
pub use mailbox::{ActorAddr, Mailbox, MailboxRouter};
pub use scheduler::Scheduler;
