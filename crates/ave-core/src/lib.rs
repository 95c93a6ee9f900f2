//! Actor Virtual Engine - Core Library
//!
//! Public API surface for the AVE core: the register machine, the actor
//! runtime, the assembler and binary loader, and the message codec.

pub mod error;
pub mod config;
pub mod bytecode;
pub mod vm;
pub mod asm;
pub mod loader;
pub mod message;
pub mod actor;
pub mod transport;

// Re-export commonly used types
pub use error::{Fault, LoadError, LoadResult, PayloadError, VmResult};
pub use config::VmConfig;
pub use bytecode::{Instruction, OpCode, Program};
pub use asm::assemble;
pub use loader::ProgramLoader;
pub use message::MessagePayload;
pub use actor::{Actor, ActorAddr, ActorState, MailboxRouter, Scheduler};
pub use transport::{Delivery, Transport};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{Reg, Value};
    use std::sync::Arc;

    /// In-process transport over the scheduler's own routing table
    struct RouterTransport(Arc<MailboxRouter>);

    impl Transport for RouterTransport {
        fn deliver(&self, payload: &MessagePayload, target: ActorAddr) -> Delivery {
            self.0.enqueue(payload.encode(), target)
        }
    }

    fn run_program(program: Program) -> Scheduler {
        let mut scheduler = Scheduler::new(program, VmConfig::new());
        let transport = RouterTransport(scheduler.router());
        scheduler.set_transport(Box::new(transport));
        scheduler.spawn(0);
        scheduler.run();
        scheduler
    }

    #[test]
    fn assemble_encode_load_run_pipeline() {
        let source = "\
start:
    INT R0, 6
    INT R1, 7
    MUL R2, R0, R1
    HLT
";
        let program = assemble(source).expect("assembly failed");
        let bytes = ProgramLoader::encode(&program);
        let loaded = ProgramLoader::load(&bytes).expect("load failed");
        assert_eq!(loaded.label("start"), Some(0));

        let scheduler = run_program(loaded);
        let actor = scheduler.actor(ActorAddr(0)).expect("missing actor");
        assert_eq!(actor.state(), &ActorState::Halted);
        assert_eq!(actor.register(Reg::R2), &Value::Int(42));
    }

    #[test]
    fn messages_are_copies_not_shared_references() {
        // The sender mutates its tuple after SEND; the receiver must see
        // the value as it was at serialization time.
        let source = "\
main:
    SPAWN R0, child
    TUP R1, 1
    INT R2, 0
    INT R3, 5
    SET_C R1, R2, R3
    SEND R1, R0
    INT R3, 9
    SET_C R1, R2, R3
    HLT
child:
    RECV
    INT R1, 0
    MOV_C RM, R1, R2
    HLT
";
        let program = assemble(source).expect("assembly failed");
        let scheduler = run_program(program);
        assert!(scheduler.faults().is_empty());

        let main = scheduler.actor(ActorAddr(0)).expect("missing actor");
        let child = scheduler.actor(ActorAddr(1)).expect("missing actor");
        assert_eq!(main.state(), &ActorState::Halted);
        assert_eq!(child.state(), &ActorState::Halted);
        assert_eq!(child.register(Reg::R2), &Value::Int(5));
    }

    #[test]
    fn spawned_actors_share_no_register_or_memory_state() {
        let source = "\
main:
    INT R5, 123
    STORE R5, 0
    SPAWN R0, child
    HLT
child:
    LOAD R6, 0
    HLT
";
        let program = assemble(source).expect("assembly failed");
        let scheduler = run_program(program);
        let child = scheduler.actor(ActorAddr(1)).expect("missing actor");
        assert_eq!(child.state(), &ActorState::Halted);
        // Fresh actor: zeroed registers and memory
        assert_eq!(child.register(Reg::R5), &Value::Int(0));
        assert_eq!(child.register(Reg::R6), &Value::Int(0));
    }
}
