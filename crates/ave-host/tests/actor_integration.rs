use ave_core::actor::{ActorAddr, ActorState};
use ave_core::vm::{Reg, Value};
use ave_core::{assemble, Scheduler, VmConfig};
use ave_host::LoopbackTransport;

fn run(source: &str) -> Scheduler {
    let program = assemble(source).expect("assembly failed");
    let mut scheduler = Scheduler::new(program, VmConfig::new());
    LoopbackTransport::install(&mut scheduler);
    scheduler.spawn_at_label("main").expect("missing main label");
    scheduler.run();
    scheduler
}

// Two workers double the values they receive and reply to the
// coordinator, which sums the replies.
#[test]
fn coordinator_and_two_workers() {
    let scheduler = run("\
main:
    SPAWN R0, worker
    SPAWN R1, worker
    INT R2, 10
    SEND R2, R0
    INT R2, 20
    SEND R2, R1
    RECV
    MOVE R3, RM
    RECV
    ADD R3, R3, RM
    HLT
worker:
    RECV
    ADD R0, RM, RM
    INT R1, 0
    SEND R0, R1
    HLT
");
    assert!(scheduler.faults().is_empty());
    let main = scheduler.actor(ActorAddr(0)).expect("missing actor");
    assert_eq!(main.state(), &ActorState::Halted);
    assert_eq!(main.register(Reg::R3), &Value::Int(60));
}

// A map survives the wire: the child looks up the key the parent set.
#[test]
fn map_message_roundtrip() {
    let scheduler = run("\
main:
    SPAWN R0, child
    MAP R1
    ATOM R2, count
    INT R3, 3
    SET_C R1, R2, R3
    SEND R1, R0
    HLT
child:
    RECV
    ATOM R1, count
    MOV_C RM, R1, R2
    HLT
");
    assert!(scheduler.faults().is_empty());
    let child = scheduler.actor(ActorAddr(1)).expect("missing actor");
    assert_eq!(child.register(Reg::R2), &Value::Int(3));
}

// Request/reply over a string payload: the child reports the byte length.
#[test]
fn string_length_service() {
    let scheduler = run("\
main:
    SPAWN R0, sizer
    STR R1, \"hello\"
    SEND R1, R0
    RECV
    MOVE R2, RM
    HLT
sizer:
    RECV
    SIZE R0, RM
    INT R1, 0
    SEND R0, R1
    HLT
");
    assert!(scheduler.faults().is_empty());
    let main = scheduler.actor(ActorAddr(0)).expect("missing actor");
    assert_eq!(main.register(Reg::R2), &Value::Int(5));
}

// Mailbox FIFO across the wire: three sends arrive in order.
#[test]
fn mailbox_preserves_send_order() {
    let scheduler = run("\
main:
    SPAWN R0, sink
    INT R1, 1
    SEND R1, R0
    INT R1, 2
    SEND R1, R0
    INT R1, 3
    SEND R1, R0
    HLT
sink:
    RECV
    MOVE R1, RM
    RECV
    MOVE R2, RM
    RECV
    MOVE R3, RM
    HLT
");
    assert!(scheduler.faults().is_empty());
    let sink = scheduler.actor(ActorAddr(1)).expect("missing actor");
    assert_eq!(sink.register(Reg::R1), &Value::Int(1));
    assert_eq!(sink.register(Reg::R2), &Value::Int(2));
    assert_eq!(sink.register(Reg::R3), &Value::Int(3));
}

// A ring of relays: each one learns its downstream address from its
// first message, then increments and forwards the second.
#[test]
fn relay_ring_increments_per_hop() {
    let scheduler = run("\
main:
    SPAWN R0, relay
    SPAWN R1, relay
    SEND R1, R0
    INT R2, 0
    SEND R2, R1
    INT R2, 7
    SEND R2, R0
    RECV
    MOVE R3, RM
    HLT
relay:
    RECV
    MOVE R0, RM
    RECV
    INT R1, 1
    ADD R2, RM, R1
    SEND R2, R0
    HLT
");
    assert!(scheduler.faults().is_empty());
    let main = scheduler.actor(ActorAddr(0)).expect("missing actor");
    assert_eq!(main.state(), &ActorState::Halted);
    assert_eq!(main.register(Reg::R3), &Value::Int(9));
}
