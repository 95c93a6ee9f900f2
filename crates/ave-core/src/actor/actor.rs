//! Actor
//!
//! One isolated unit of execution: register file, memory, composite heap,
//! stack, and mailbox, driven strictly sequentially by the interpreter in
//! `step`. Actors share nothing mutable; the only cross-actor relations
//! are the address relation used by `SPAWN`/`SEND` and the immutable
//! program they run.

use std::sync::Arc;
use std::time::Instant;

use tracing::{trace, warn};

use crate::bytecode::{Instruction, Program};
use crate::config::VmConfig;
use crate::error::{Fault, VmResult};
use crate::message::{assemble_payload, serialize, MessagePayload};
use crate::vm::heap::Heap;
use crate::vm::memory::Memory;
use crate::vm::registers::{Reg, RegisterFile};
use crate::vm::stack::Stack;
use crate::vm::value::Value;

use super::mailbox::{ActorAddr, Mailbox};

/// Lifecycle state of an actor
#[derive(Debug, Clone, PartialEq)]
pub enum ActorState {
    Runnable,
    /// Suspended in `RECV` on an empty mailbox
    Waiting,
    /// Executed `HLT`
    Halted,
    /// Terminated by a runtime fault
    Faulted(Fault),
}

/// What the scheduler must do after a step, beyond the actor's own state
#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    Halt,
    /// `RECV` found the mailbox empty
    Block,
    /// Instantiate a sibling and write its address into `dest`
    Spawn { dest: Reg, entry: u32 },
    /// Hand a serialized value to the transport
    Send {
        payload: MessagePayload,
        target: ActorAddr,
    },
}

#[derive(Debug)]
pub struct Actor {
    address: ActorAddr,
    regs: RegisterFile,
    memory: Memory,
    heap: Heap,
    stack: Stack,
    mailbox: Mailbox,
    program: Arc<Program>,
    pub(crate) state: ActorState,
    pub(crate) blocked_since: Option<Instant>,
}

/// Comparison selector shared by the six comparison instructions
enum Cmp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Actor {
    /// Fresh, zero-initialized actor starting at `entry`
    pub fn new(address: ActorAddr, program: Arc<Program>, entry: u32, config: &VmConfig) -> Self {
        let mut actor = Actor {
            address,
            regs: RegisterFile::new(),
            memory: Memory::new(config.memory_cells),
            heap: Heap::new(config.max_heap_slots),
            stack: Stack::new(config.max_stack_size),
            mailbox: Mailbox::new(),
            program,
            state: ActorState::Runnable,
            blocked_since: None,
        };
        actor.set_pc(entry as usize);
        actor
    }

    pub fn address(&self) -> ActorAddr {
        self.address
    }

    pub fn state(&self) -> &ActorState {
        &self.state
    }

    pub fn register(&self, reg: Reg) -> &Value {
        self.regs.get(reg)
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub(crate) fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    fn pc(&self) -> VmResult<usize> {
        match self.regs.get(Reg::Pc) {
            Value::Int(n) if *n >= 0 => Ok(*n as usize),
            Value::Int(n) => Err(Fault::InvalidJumpTarget(*n)),
            other => Err(Fault::TypeMismatch {
                expected: "int program counter",
                found: other.kind(),
            }),
        }
    }

    fn set_pc(&mut self, pc: usize) {
        self.regs.set(Reg::Pc, Value::Int(pc as i64));
    }

    /// Write to a general destination. ZF only ever holds a comparison
    /// flag and PC only ever holds a non-negative instruction index.
    pub(crate) fn write_general(&mut self, reg: Reg, value: Value) -> VmResult<()> {
        match reg {
            Reg::Zf => match value {
                Value::Int(0) | Value::Int(1) => {
                    self.regs.set(reg, value);
                    Ok(())
                }
                other => Err(Fault::TypeMismatch {
                    expected: "comparison flag (int 0 or 1)",
                    found: other.kind(),
                }),
            },
            Reg::Pc => match value {
                Value::Int(n) if n >= 0 => {
                    self.regs.set(reg, value);
                    Ok(())
                }
                Value::Int(n) => Err(Fault::InvalidJumpTarget(n)),
                other => Err(Fault::TypeMismatch {
                    expected: "int program counter",
                    found: other.kind(),
                }),
            },
            _ => {
                self.regs.set(reg, value);
                Ok(())
            }
        }
    }

    /// Fetch, decode, execute one instruction
    pub(crate) fn step(&mut self) -> VmResult<Effect> {
        let pc = self.pc()?;
        let inst = self
            .program
            .fetch(pc)
            .ok_or(Fault::InvalidJumpTarget(pc as i64))?
            .clone();
        trace!(actor = %self.address, pc, op = inst.opcode().mnemonic(), "step");
        self.set_pc(pc + 1);

        match inst {
            Instruction::Int(reg, value) => {
                self.write_general(reg, Value::Int(value))?;
            }
            Instruction::Flo(reg, value) => {
                self.write_general(reg, Value::Float(value))?;
            }
            Instruction::Str(reg, bytes) => {
                let value = self.heap.alloc_str(bytes)?;
                self.write_general(reg, value)?;
            }
            Instruction::Atom(reg, name) => {
                self.write_general(reg, Value::Atom(name.as_str().into()))?;
            }

            Instruction::Move(dst, src) => {
                let value = self.regs.get(src).clone();
                self.write_general(dst, value)?;
            }
            Instruction::Store(reg, addr) => {
                let value = self.regs.get(reg).clone();
                self.memory.store(addr as usize, value)?;
            }
            Instruction::Load(reg, addr) => {
                let value = self.memory.load(addr as usize)?;
                self.write_general(reg, value)?;
            }

            Instruction::Add(d, a, b) => {
                let value = self.numeric_binop(
                    a,
                    b,
                    |x, y| Ok(x.wrapping_add(y)),
                    |x, y| Ok(x + y),
                )?;
                self.write_general(d, value)?;
            }
            Instruction::Sub(d, a, b) => {
                let value = self.numeric_binop(
                    a,
                    b,
                    |x, y| Ok(x.wrapping_sub(y)),
                    |x, y| Ok(x - y),
                )?;
                self.write_general(d, value)?;
            }
            Instruction::Mul(d, a, b) => {
                let value = self.numeric_binop(
                    a,
                    b,
                    |x, y| Ok(x.wrapping_mul(y)),
                    |x, y| Ok(x * y),
                )?;
                self.write_general(d, value)?;
            }
            Instruction::Div(d, a, b) => {
                let value = self.numeric_binop(
                    a,
                    b,
                    |x, y| {
                        if y == 0 {
                            Err(Fault::DivisionByZero)
                        } else {
                            Ok(x.wrapping_div(y))
                        }
                    },
                    |x, y| {
                        if y == 0.0 {
                            Err(Fault::DivisionByZero)
                        } else {
                            Ok(x / y)
                        }
                    },
                )?;
                self.write_general(d, value)?;
            }
            Instruction::Mod(d, a, b) => {
                let value = self.numeric_binop(
                    a,
                    b,
                    |x, y| {
                        if y == 0 {
                            Err(Fault::DivisionByZero)
                        } else {
                            Ok(x.wrapping_rem(y))
                        }
                    },
                    |x, y| {
                        if y == 0.0 {
                            Err(Fault::DivisionByZero)
                        } else {
                            Ok(x % y)
                        }
                    },
                )?;
                self.write_general(d, value)?;
            }

            Instruction::Eq(a, b) => self.compare(Cmp::Eq, a, b)?,
            Instruction::Ne(a, b) => self.compare(Cmp::Ne, a, b)?,
            Instruction::Gt(a, b) => self.compare(Cmp::Gt, a, b)?,
            Instruction::Lt(a, b) => self.compare(Cmp::Lt, a, b)?,
            Instruction::Gte(a, b) => self.compare(Cmp::Gte, a, b)?,
            Instruction::Lte(a, b) => self.compare(Cmp::Lte, a, b)?,

            Instruction::Jump(target) => {
                self.set_pc(target as usize);
            }
            Instruction::JumpIf(target) => match self.regs.get(Reg::Zf) {
                Value::Int(1) => self.set_pc(target as usize),
                Value::Int(_) => {}
                other => {
                    return Err(Fault::TypeMismatch {
                        expected: "comparison flag (int 0 or 1)",
                        found: other.kind(),
                    })
                }
            },
            Instruction::Push(reg) => {
                let value = self.regs.get(reg).clone();
                self.stack.push(value)?;
            }
            Instruction::Pop(reg) => {
                let value = self.stack.pop()?;
                self.write_general(reg, value)?;
            }

            Instruction::Tup(reg, n) => {
                let value = self.heap.alloc_tuple(n as usize)?;
                self.write_general(reg, value)?;
            }
            Instruction::List(reg, n) => {
                let value = self.heap.alloc_list(n as usize)?;
                self.write_general(reg, value)?;
            }
            Instruction::Map(reg) => {
                let value = self.heap.alloc_map()?;
                self.write_general(reg, value)?;
            }
            Instruction::Size(dst, src) => {
                let len = self.heap.size_of(self.regs.get(src))?;
                self.write_general(dst, Value::Int(len))?;
            }
            Instruction::SetC(target, index, value) => {
                let target = self.regs.get(target).clone();
                let index = self.regs.get(index).clone();
                let value = self.regs.get(value).clone();
                self.heap.set_index(&target, &index, value)?;
            }
            Instruction::MovC(target, index, out) => {
                let target = self.regs.get(target).clone();
                let index = self.regs.get(index).clone();
                let value = self.heap.get_index(&target, &index)?;
                self.write_general(out, value)?;
            }

            Instruction::Spawn(dest, entry) => {
                return Ok(Effect::Spawn { dest, entry });
            }
            Instruction::Send(src, addr) => {
                let target = match self.regs.get(addr) {
                    Value::Int(n) if *n >= 0 => ActorAddr(*n as u64),
                    other => {
                        return Err(Fault::TypeMismatch {
                            expected: "actor address (non-negative int)",
                            found: other.kind(),
                        })
                    }
                };
                let payload = serialize(self.regs.get(src), &self.heap)?;
                return Ok(Effect::Send { payload, target });
            }
            Instruction::Recv => match self.mailbox.try_take() {
                Some(raw) => {
                    let assembled = MessagePayload::decode(&raw)
                        .and_then(|payload| assemble_payload(&payload, &mut self.heap));
                    match assembled {
                        Ok(value) => self.regs.set(Reg::Rm, value),
                        Err(error) => {
                            // Invalid payload: drop the message, keep the
                            // actor; retry RECV for the next one
                            warn!(actor = %self.address, %error, "invalid message payload dropped");
                            self.set_pc(pc);
                        }
                    }
                }
                None => {
                    self.set_pc(pc);
                    return Ok(Effect::Block);
                }
            },

            Instruction::Hlt => return Ok(Effect::Halt),
        }
        Ok(Effect::None)
    }

    fn numeric_binop(
        &self,
        a: Reg,
        b: Reg,
        int_op: fn(i64, i64) -> VmResult<i64>,
        float_op: fn(f64, f64) -> VmResult<f64>,
    ) -> VmResult<Value> {
        match (self.regs.get(a), self.regs.get(b)) {
            (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y)?)),
            (Value::Float(x), Value::Float(y)) => Ok(Value::Float(float_op(*x, *y)?)),
            (lhs, rhs) => {
                let found = match lhs {
                    Value::Int(_) | Value::Float(_) => rhs.kind(),
                    other => other.kind(),
                };
                Err(Fault::TypeMismatch {
                    expected: "numeric operands of matching kind",
                    found,
                })
            }
        }
    }

    fn compare(&mut self, op: Cmp, a: Reg, b: Reg) -> VmResult<()> {
        let lhs = self.regs.get(a).clone();
        let rhs = self.regs.get(b).clone();
        if lhs.kind() != rhs.kind() {
            return Err(Fault::TypeMismatch {
                expected: "operands of matching kind",
                found: rhs.kind(),
            });
        }
        let truth = match op {
            Cmp::Eq => self.heap.structural_eq(&lhs, &rhs)?,
            Cmp::Ne => !self.heap.structural_eq(&lhs, &rhs)?,
            Cmp::Gt => self.heap.compare_order(&lhs, &rhs)?.is_gt(),
            Cmp::Lt => self.heap.compare_order(&lhs, &rhs)?.is_lt(),
            Cmp::Gte => self.heap.compare_order(&lhs, &rhs)?.is_ge(),
            Cmp::Lte => self.heap.compare_order(&lhs, &rhs)?.is_le(),
        };
        self.regs.set(Reg::Zf, Value::Int(truth as i64));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn actor_for(source: &str) -> Actor {
        let program = assemble(source).expect("assembly failed");
        Actor::new(ActorAddr(0), Arc::new(program), 0, &VmConfig::new())
    }

    /// Run until HLT, panicking on anything the test did not expect
    fn run(source: &str) -> Actor {
        let mut actor = actor_for(source);
        loop {
            match actor.step() {
                Ok(Effect::Halt) => return actor,
                Ok(Effect::None) => {}
                Ok(other) => panic!("unexpected effect: {other:?}"),
                Err(fault) => panic!("unexpected fault: {fault}"),
            }
        }
    }

    /// Run until a fault, panicking on clean termination
    fn run_to_fault(source: &str) -> Fault {
        let mut actor = actor_for(source);
        loop {
            match actor.step() {
                Ok(Effect::Halt) => panic!("halted without faulting"),
                Ok(_) => {}
                Err(fault) => return fault,
            }
        }
    }

    #[test]
    fn arithmetic_roundtrips_through_inverse() {
        let actor = run(
            "INT R0, 123\n\
             INT R1, 58\n\
             ADD R2, R0, R1\n\
             SUB R3, R2, R1\n\
             MUL R4, R0, R1\n\
             DIV R5, R4, R1\n\
             HLT\n",
        );
        assert_eq!(actor.register(Reg::R3), &Value::Int(123));
        assert_eq!(actor.register(Reg::R5), &Value::Int(123));
    }

    #[test]
    fn float_arithmetic() {
        let actor = run(
            "FLO R0, 1.5\n\
             FLO R1, 0.5\n\
             ADD R2, R0, R1\n\
             MOD R3, R0, R1\n\
             HLT\n",
        );
        assert_eq!(actor.register(Reg::R2), &Value::Float(2.0));
        assert_eq!(actor.register(Reg::R3), &Value::Float(0.0));
    }

    #[test]
    fn mixed_kind_arithmetic_faults() {
        let fault = run_to_fault("INT R0, 1\nFLO R1, 1.0\nADD R2, R0, R1\nHLT\n");
        assert!(matches!(fault, Fault::TypeMismatch { .. }));
    }

    #[test]
    fn division_by_zero_faults() {
        let fault = run_to_fault("INT R0, 1\nINT R1, 0\nDIV R2, R0, R1\nHLT\n");
        assert_eq!(fault, Fault::DivisionByZero);
        let fault = run_to_fault("INT R0, 5\nINT R1, 0\nMOD R2, R0, R1\nHLT\n");
        assert_eq!(fault, Fault::DivisionByZero);
    }

    #[test]
    fn eq_and_ne_are_complementary() {
        for (a, b) in [(1i64, 1i64), (1, 2)] {
            let source = format!(
                "INT R0, {a}\nINT R1, {b}\nEQ R0, R1\nMOVE R2, ZF\nNE R0, R1\nMOVE R3, ZF\nHLT\n"
            );
            let actor = run(&source);
            let eq = actor.register(Reg::R2).as_int().unwrap();
            let ne = actor.register(Reg::R3).as_int().unwrap();
            assert_eq!(eq + ne, 1, "EQ and NE must disagree exactly");
        }
    }

    #[test]
    fn cyclic_value_eq_faults_instead_of_recursing() {
        let fault = run_to_fault(
            "LIST R0, 1\n\
             INT R1, 0\n\
             SET_C R0, R1, R0\n\
             EQ R0, R0\n\
             HLT\n",
        );
        assert_eq!(fault, Fault::NestingTooDeep);
    }

    #[test]
    fn cyclic_value_send_faults_instead_of_recursing() {
        let fault = run_to_fault(
            "LIST R0, 1\n\
             INT R1, 0\n\
             SET_C R0, R1, R0\n\
             INT R2, 0\n\
             SEND R0, R2\n\
             HLT\n",
        );
        assert_eq!(fault, Fault::NestingTooDeep);
    }

    #[test]
    fn string_comparison_is_lexicographic() {
        let actor = run(
            "STR R0, \"abc\"\n\
             STR R1, \"abd\"\n\
             LT R0, R1\n\
             HLT\n",
        );
        assert_eq!(actor.register(Reg::Zf), &Value::Int(1));
    }

    #[test]
    fn ordering_composites_faults_unorderable() {
        let fault = run_to_fault("TUP R0, 1\nTUP R1, 1\nGT R0, R1\nHLT\n");
        assert!(matches!(fault, Fault::Unorderable(_)));
    }

    #[test]
    fn atom_equality_is_structural() {
        let actor = run(
            "ATOM R0, ok\n\
             ATOM R1, ok\n\
             EQ R0, R1\n\
             HLT\n",
        );
        assert_eq!(actor.register(Reg::Zf), &Value::Int(1));
    }

    #[test]
    fn jumpif_branches_only_on_one() {
        let taken = run(
            "INT R0, 5\nINT R1, 5\nEQ R0, R1\nJUMPIF skip\nINT R2, 99\nskip: HLT\n",
        );
        assert_eq!(taken.register(Reg::R2), &Value::Int(0));

        let fallthrough = run(
            "INT R0, 5\nINT R1, 6\nEQ R0, R1\nJUMPIF skip\nINT R2, 99\nskip: HLT\n",
        );
        assert_eq!(fallthrough.register(Reg::R2), &Value::Int(99));
    }

    #[test]
    fn push_pop_roundtrips_every_kind() {
        let actor = run(
            "INT R0, -5\n\
             FLO R1, 2.5\n\
             STR R2, \"s\"\n\
             ATOM R3, sym\n\
             TUP R4, 2\n\
             PUSH R0\nPUSH R1\nPUSH R2\nPUSH R3\nPUSH R4\n\
             POP R7\nMOVE R4, R7\n\
             POP R7\nMOVE R3, R7\n\
             POP R7\nMOVE R2, R7\n\
             POP R7\nMOVE R1, R7\n\
             POP R7\nMOVE R0, R7\n\
             HLT\n",
        );
        assert_eq!(actor.register(Reg::R0), &Value::Int(-5));
        assert_eq!(actor.register(Reg::R1), &Value::Float(2.5));
        assert!(matches!(actor.register(Reg::R2), Value::Str(_)));
        assert_eq!(actor.register(Reg::R3), &Value::Atom("sym".into()));
        assert!(matches!(actor.register(Reg::R4), Value::Tuple(_)));
    }

    #[test]
    fn pop_on_empty_stack_underflows() {
        let fault = run_to_fault("POP R0\nHLT\n");
        assert_eq!(fault, Fault::StackUnderflow);
    }

    #[test]
    fn list_size_and_element_roundtrip() {
        let actor = run(
            "LIST R0, 3\n\
             SIZE R1, R0\n\
             INT R2, 1\n\
             INT R3, 77\n\
             SET_C R0, R2, R3\n\
             MOV_C R0, R2, R4\n\
             HLT\n",
        );
        assert_eq!(actor.register(Reg::R1), &Value::Int(3));
        assert_eq!(actor.register(Reg::R4), &Value::Int(77));
    }

    #[test]
    fn tuple_index_out_of_bounds_faults() {
        let fault = run_to_fault(
            "TUP R0, 2\nINT R1, 2\nINT R2, 0\nSET_C R0, R1, R2\nHLT\n",
        );
        assert_eq!(fault, Fault::IndexOutOfBounds { index: 2, len: 2 });
    }

    #[test]
    fn map_insert_lookup_and_missing_key() {
        let actor = run(
            "MAP R0\n\
             ATOM R1, answer\n\
             INT R2, 42\n\
             SET_C R0, R1, R2\n\
             MOV_C R0, R1, R3\n\
             HLT\n",
        );
        assert_eq!(actor.register(Reg::R3), &Value::Int(42));

        let fault = run_to_fault("MAP R0\nATOM R1, missing\nMOV_C R0, R1, R2\nHLT\n");
        assert_eq!(fault, Fault::KeyNotFound);
    }

    #[test]
    fn size_of_scalar_faults() {
        let fault = run_to_fault("INT R0, 3\nSIZE R1, R0\nHLT\n");
        assert!(matches!(fault, Fault::TypeMismatch { .. }));
    }

    #[test]
    fn string_index_overrun_faults() {
        let fault = run_to_fault("STR R0, \"ab\"\nINT R1, 2\nMOV_C R0, R1, R2\nHLT\n");
        assert_eq!(fault, Fault::IndexOutOfBounds { index: 2, len: 2 });
    }

    #[test]
    fn store_load_through_memory() {
        let actor = run(
            "INT R0, 9\n\
             STORE R0, 17\n\
             LOAD R1, 17\n\
             HLT\n",
        );
        assert_eq!(actor.register(Reg::R1), &Value::Int(9));
    }

    #[test]
    fn call_return_via_link_register() {
        // Call convention: caller materializes the return address in LR,
        // callee returns with MOVE PC, LR
        let actor = run(
            "INT LR, 3\n\
             JUMP func\n\
             INT R2, 99\n\
             HLT\n\
             func: INT R0, 7\n\
             MOVE PC, LR\n",
        );
        assert_eq!(actor.register(Reg::R0), &Value::Int(7));
        assert_eq!(actor.register(Reg::R2), &Value::Int(0));
    }

    #[test]
    fn return_via_pop_pc() {
        let actor = run(
            "INT R0, 4\n\
             PUSH R0\n\
             JUMP func\n\
             INT R2, 99\n\
             HLT\n\
             func: INT R1, 11\n\
             POP PC\n",
        );
        assert_eq!(actor.register(Reg::R1), &Value::Int(11));
        assert_eq!(actor.register(Reg::R2), &Value::Int(0));
    }

    #[test]
    fn non_int_pc_write_faults() {
        let fault = run_to_fault("FLO R0, 1.0\nMOVE PC, R0\nHLT\n");
        assert!(matches!(fault, Fault::TypeMismatch { .. }));
    }

    #[test]
    fn non_flag_zf_write_faults() {
        let fault = run_to_fault("INT R0, 2\nMOVE ZF, R0\nHLT\n");
        assert!(matches!(fault, Fault::TypeMismatch { .. }));
    }

    #[test]
    fn running_off_program_end_faults() {
        let mut actor = actor_for("INT R0, 1\n");
        assert!(matches!(actor.step(), Ok(Effect::None)));
        assert_eq!(actor.step().unwrap_err(), Fault::InvalidJumpTarget(1));
    }

    #[test]
    fn recv_blocks_on_empty_mailbox() {
        let mut actor = actor_for("RECV\nHLT\n");
        assert_eq!(actor.step().unwrap(), Effect::Block);
        // PC reverted: the RECV retries
        assert_eq!(actor.register(Reg::Pc), &Value::Int(0));
    }

    #[test]
    fn recv_assembles_pending_message() {
        let mut actor = actor_for("RECV\nHLT\n");
        let heap = Heap::new(4);
        let payload = serialize(&Value::Int(42), &heap).unwrap();
        actor.mailbox().sender().send(payload.encode()).unwrap();

        assert_eq!(actor.step().unwrap(), Effect::None);
        assert_eq!(actor.register(Reg::Rm), &Value::Int(42));
        assert_eq!(actor.step().unwrap(), Effect::Halt);
    }

    #[test]
    fn hostile_payload_dropped_actor_survives() {
        let mut actor = actor_for("RECV\nHLT\n");
        // Hand-built payload embedding a SEND opcode
        let mut hostile = vec![1u8];
        hostile.extend(&1u16.to_be_bytes());
        hostile.push(crate::bytecode::OpCode::Send as u8);
        hostile.extend(&[0u8, 0u8]);
        actor.mailbox().sender().send(hostile).unwrap();

        // Bad message is dropped and RECV retries; mailbox now empty
        assert_eq!(actor.step().unwrap(), Effect::None);
        assert_eq!(actor.step().unwrap(), Effect::Block);

        // A good message afterwards still lands in RM
        let heap = Heap::new(4);
        let payload = serialize(&Value::Atom("ok".into()), &heap).unwrap();
        actor.mailbox().sender().send(payload.encode()).unwrap();
        assert_eq!(actor.step().unwrap(), Effect::None);
        assert_eq!(actor.register(Reg::Rm), &Value::Atom("ok".into()));
    }

    #[test]
    fn send_produces_transport_effect() {
        let mut actor = actor_for("INT R0, 42\nINT R1, 7\nSEND R0, R1\nHLT\n");
        actor.step().unwrap();
        actor.step().unwrap();
        match actor.step().unwrap() {
            Effect::Send { payload, target } => {
                assert_eq!(target, ActorAddr(7));
                assert!(!payload.ops.is_empty());
            }
            other => panic!("expected send effect, got {other:?}"),
        }
    }

    #[test]
    fn spawn_produces_scheduler_effect() {
        let mut actor = actor_for("SPAWN R0, child\nHLT\nchild: HLT\n");
        match actor.step().unwrap() {
            Effect::Spawn { dest, entry } => {
                assert_eq!(dest, Reg::R0);
                assert_eq!(entry, 2);
            }
            other => panic!("expected spawn effect, got {other:?}"),
        }
    }
}
