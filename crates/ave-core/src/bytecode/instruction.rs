//! Bytecode Instruction Representation
//!
//! Decoded instruction form consumed by the interpreter. Label operands
//! are already resolved to instruction indices; unresolved labels never
//! survive program load.

use super::opcode::OpCode;
use crate::vm::registers::Reg;

/// One decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Load an integer immediate
    Int(Reg, i64),
    /// Load a float immediate
    Flo(Reg, f64),
    /// Allocate a string from an immediate byte literal
    Str(Reg, Vec<u8>),
    /// Load an atom immediate
    Atom(Reg, String),

    /// Copy the typed value of the source register into the destination
    Move(Reg, Reg),
    /// Write a register's value to a memory address
    Store(Reg, u32),
    /// Read a memory address into a register
    Load(Reg, u32),

    Add(Reg, Reg, Reg),
    Sub(Reg, Reg, Reg),
    Mul(Reg, Reg, Reg),
    Div(Reg, Reg, Reg),
    Mod(Reg, Reg, Reg),

    Eq(Reg, Reg),
    Ne(Reg, Reg),
    Gt(Reg, Reg),
    Lt(Reg, Reg),
    Gte(Reg, Reg),
    Lte(Reg, Reg),

    /// Unconditional jump to a resolved instruction index
    Jump(u32),
    /// Jump iff ZF == 1
    JumpIf(u32),
    Push(Reg),
    Pop(Reg),

    /// Allocate a tuple of fixed arity
    Tup(Reg, u32),
    /// Allocate a list of the given length
    List(Reg, u32),
    /// Allocate an empty map
    Map(Reg),
    /// Element count of a composite into the destination register
    Size(Reg, Reg),
    /// `SET_C target, index, value`
    SetC(Reg, Reg, Reg),
    /// `MOV_C target, index, out`
    MovC(Reg, Reg, Reg),

    /// Create a sibling actor at the resolved entry index; its address is
    /// written into the destination register as an Int
    Spawn(Reg, u32),
    /// Serialize the source register and hand it to the transport,
    /// addressed by the second register
    Send(Reg, Reg),
    /// Reconstruct the mailbox head into RM, or suspend while empty
    Recv,

    Hlt,
}

impl Instruction {
    pub fn opcode(&self) -> OpCode {
        match self {
            Instruction::Int(..) => OpCode::Int,
            Instruction::Flo(..) => OpCode::Flo,
            Instruction::Str(..) => OpCode::Str,
            Instruction::Atom(..) => OpCode::Atom,
            Instruction::Move(..) => OpCode::Move,
            Instruction::Store(..) => OpCode::Store,
            Instruction::Load(..) => OpCode::Load,
            Instruction::Add(..) => OpCode::Add,
            Instruction::Sub(..) => OpCode::Sub,
            Instruction::Mul(..) => OpCode::Mul,
            Instruction::Div(..) => OpCode::Div,
            Instruction::Mod(..) => OpCode::Mod,
            Instruction::Eq(..) => OpCode::Eq,
            Instruction::Ne(..) => OpCode::Ne,
            Instruction::Gt(..) => OpCode::Gt,
            Instruction::Lt(..) => OpCode::Lt,
            Instruction::Gte(..) => OpCode::Gte,
            Instruction::Lte(..) => OpCode::Lte,
            Instruction::Jump(..) => OpCode::Jump,
            Instruction::JumpIf(..) => OpCode::JumpIf,
            Instruction::Push(..) => OpCode::Push,
            Instruction::Pop(..) => OpCode::Pop,
            Instruction::Tup(..) => OpCode::Tup,
            Instruction::List(..) => OpCode::List,
            Instruction::Map(..) => OpCode::Map,
            Instruction::Size(..) => OpCode::Size,
            Instruction::SetC(..) => OpCode::SetC,
            Instruction::MovC(..) => OpCode::MovC,
            Instruction::Spawn(..) => OpCode::Spawn,
            Instruction::Send(..) => OpCode::Send,
            Instruction::Recv => OpCode::Recv,
            Instruction::Hlt => OpCode::Hlt,
        }
    }
}
