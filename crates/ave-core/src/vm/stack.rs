//! Actor Stack
//!
//! Bounded LIFO of Values for `PUSH`/`POP` and call/return conventions.
//! No execution semantics.

use crate::error::{Fault, VmResult};

use super::value::Value;

#[derive(Debug)]
pub struct Stack {
    values: Vec<Value>,
    max_size: usize,
}

impl Stack {
    /// Create new stack with maximum depth
    pub fn new(max_size: usize) -> Self {
        Stack {
            values: Vec::new(),
            max_size,
        }
    }

    /// Push value onto stack
    pub fn push(&mut self, value: Value) -> VmResult<()> {
        if self.values.len() >= self.max_size {
            return Err(Fault::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop value from stack
    pub fn pop(&mut self) -> VmResult<Value> {
        self.values.pop().ok_or(Fault::StackUnderflow)
    }

    /// Peek at top of stack without removing
    pub fn peek(&self) -> VmResult<&Value> {
        self.values.last().ok_or(Fault::StackUnderflow)
    }

    /// Get current stack depth
    pub fn depth(&self) -> usize {
        self.values.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
