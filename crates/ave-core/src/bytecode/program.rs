//! Loaded Program
//!
//! An immutable instruction sequence with its resolved label table.
//! Actors share one `Program` behind an `Arc`; nothing mutates it after
//! load.

use indexmap::IndexMap;

use super::instruction::Instruction;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: IndexMap<String, u32>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, labels: IndexMap<String, u32>) -> Self {
        Program {
            instructions,
            labels,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn fetch(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction index of a label, if defined
    pub fn label(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, u32)> {
        self.labels.iter().map(|(name, index)| (name.as_str(), *index))
    }
}
