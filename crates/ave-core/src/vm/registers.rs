//! Register File
//!
//! Twelve typed slots per actor: R0-R7 general purpose, RM for the last
//! received message, PC, ZF, and LR. A slot holds exactly one typed
//! Value; writes replace value and tag together.

use std::fmt;

use super::value::Value;

pub const REGISTER_COUNT: usize = 12;

/// Register name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    /// Most recently received message
    Rm,
    /// Program counter (Int semantics)
    Pc,
    /// Comparison flag (Int 0/1)
    Zf,
    /// Link register for call/return conventions
    Lr,
}

impl Reg {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        const ALL: [Reg; 12] = [
            Reg::R0,
            Reg::R1,
            Reg::R2,
            Reg::R3,
            Reg::R4,
            Reg::R5,
            Reg::R6,
            Reg::R7,
            Reg::Rm,
            Reg::Pc,
            Reg::Zf,
            Reg::Lr,
        ];
        ALL.get(index as usize).copied()
    }

    /// Parse a register name as written in assembly source
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "R0" => Some(Reg::R0),
            "R1" => Some(Reg::R1),
            "R2" => Some(Reg::R2),
            "R3" => Some(Reg::R3),
            "R4" => Some(Reg::R4),
            "R5" => Some(Reg::R5),
            "R6" => Some(Reg::R6),
            "R7" => Some(Reg::R7),
            "RM" => Some(Reg::Rm),
            "PC" => Some(Reg::Pc),
            "ZF" => Some(Reg::Zf),
            "LR" => Some(Reg::Lr),
            _ => None,
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::R0 => "R0",
            Reg::R1 => "R1",
            Reg::R2 => "R2",
            Reg::R3 => "R3",
            Reg::R4 => "R4",
            Reg::R5 => "R5",
            Reg::R6 => "R6",
            Reg::R7 => "R7",
            Reg::Rm => "RM",
            Reg::Pc => "PC",
            Reg::Zf => "ZF",
            Reg::Lr => "LR",
        };
        f.write_str(name)
    }
}

/// Per-actor register file, zero-initialized
#[derive(Debug)]
pub struct RegisterFile {
    slots: [Value; REGISTER_COUNT],
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile {
            slots: std::array::from_fn(|_| Value::zero()),
        }
    }

    pub fn get(&self, reg: Reg) -> &Value {
        &self.slots[reg.index()]
    }

    pub fn set(&mut self, reg: Reg, value: Value) {
        self.slots[reg.index()] = value;
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
