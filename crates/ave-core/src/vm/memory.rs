//! Actor Memory
//!
//! Fixed-size array of typed Value cells for `STORE`/`LOAD`. Addresses
//! are actor-local integers; nothing in the instruction set can name
//! another actor's memory.

use crate::error::{Fault, VmResult};

use super::value::Value;

#[derive(Debug)]
pub struct Memory {
    cells: Vec<Value>,
}

impl Memory {
    /// Create a zero-initialized memory region of `cells` addressable slots
    pub fn new(cells: usize) -> Self {
        Memory {
            cells: vec![Value::zero(); cells],
        }
    }

    pub fn load(&self, addr: usize) -> VmResult<Value> {
        self.cells.get(addr).cloned().ok_or(Fault::IndexOutOfBounds {
            index: addr as i64,
            len: self.cells.len(),
        })
    }

    pub fn store(&mut self, addr: usize, value: Value) -> VmResult<()> {
        let len = self.cells.len();
        let cell = self.cells.get_mut(addr).ok_or(Fault::IndexOutOfBounds {
            index: addr as i64,
            len,
        })?;
        *cell = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
