//! Bytecode Opcode Definitions
//!
//! Raw opcode set for AVE programs. This file contains no execution
//! semantics. Opcode values are an eternal contract; the message
//! assembler whitelist (`is_message_safe`) is part of that contract.

/// Bytecode opcodes (v1)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    // Immediate loads
    Int = 0x01,
    Flo = 0x02,
    Str = 0x03,
    Atom = 0x04,

    // Data movement
    Move = 0x10,
    Store = 0x11,
    Load = 0x12,

    // Arithmetic
    Add = 0x20,
    Sub = 0x21,
    Mul = 0x22,
    Div = 0x23,
    Mod = 0x24,

    // Comparison
    Eq = 0x30,
    Ne = 0x31,
    Gt = 0x32,
    Lt = 0x33,
    Gte = 0x34,
    Lte = 0x35,

    // Control flow
    Jump = 0x40,
    JumpIf = 0x41,
    Push = 0x42,
    Pop = 0x43,

    // Composites
    Tup = 0x50,
    List = 0x51,
    Map = 0x52,
    Size = 0x53,
    SetC = 0x54,
    MovC = 0x55,

    // Actors
    Spawn = 0x60,
    Send = 0x61,
    Recv = 0x62,

    // System
    Hlt = 0xFF,
}

impl OpCode {
    /// Convert raw byte to opcode
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(OpCode::Int),
            0x02 => Some(OpCode::Flo),
            0x03 => Some(OpCode::Str),
            0x04 => Some(OpCode::Atom),

            0x10 => Some(OpCode::Move),
            0x11 => Some(OpCode::Store),
            0x12 => Some(OpCode::Load),

            0x20 => Some(OpCode::Add),
            0x21 => Some(OpCode::Sub),
            0x22 => Some(OpCode::Mul),
            0x23 => Some(OpCode::Div),
            0x24 => Some(OpCode::Mod),

            0x30 => Some(OpCode::Eq),
            0x31 => Some(OpCode::Ne),
            0x32 => Some(OpCode::Gt),
            0x33 => Some(OpCode::Lt),
            0x34 => Some(OpCode::Gte),
            0x35 => Some(OpCode::Lte),

            0x40 => Some(OpCode::Jump),
            0x41 => Some(OpCode::JumpIf),
            0x42 => Some(OpCode::Push),
            0x43 => Some(OpCode::Pop),

            0x50 => Some(OpCode::Tup),
            0x51 => Some(OpCode::List),
            0x52 => Some(OpCode::Map),
            0x53 => Some(OpCode::Size),
            0x54 => Some(OpCode::SetC),
            0x55 => Some(OpCode::MovC),

            0x60 => Some(OpCode::Spawn),
            0x61 => Some(OpCode::Send),
            0x62 => Some(OpCode::Recv),

            0xFF => Some(OpCode::Hlt),

            _ => None,
        }
    }

    /// Whether this opcode may appear inside a message payload.
    /// The subset is MOVE/STORE/LOAD/INT/STR/FLO only: no control flow,
    /// no composite construction, no SEND.
    pub fn is_message_safe(self) -> bool {
        matches!(
            self,
            OpCode::Move | OpCode::Store | OpCode::Load | OpCode::Int | OpCode::Str | OpCode::Flo
        )
    }

    /// Mnemonic as written in assembly source
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Int => "INT",
            OpCode::Flo => "FLO",
            OpCode::Str => "STR",
            OpCode::Atom => "ATOM",
            OpCode::Move => "MOVE",
            OpCode::Store => "STORE",
            OpCode::Load => "LOAD",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",
            OpCode::Eq => "EQ",
            OpCode::Ne => "NE",
            OpCode::Gt => "GT",
            OpCode::Lt => "LT",
            OpCode::Gte => "GTE",
            OpCode::Lte => "LTE",
            OpCode::Jump => "JUMP",
            OpCode::JumpIf => "JUMPIF",
            OpCode::Push => "PUSH",
            OpCode::Pop => "POP",
            OpCode::Tup => "TUP",
            OpCode::List => "LIST",
            OpCode::Map => "MAP",
            OpCode::Size => "SIZE",
            OpCode::SetC => "SET_C",
            OpCode::MovC => "MOV_C",
            OpCode::Spawn => "SPAWN",
            OpCode::Send => "SEND",
            OpCode::Recv => "RECV",
            OpCode::Hlt => "HLT",
        }
    }
}
