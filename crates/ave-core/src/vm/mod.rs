//! Per-actor machine state: values, registers, cell memory, the
//! composite heap, and the value stack.

pub mod heap;
pub mod memory;
pub mod registers;
pub mod stack;
pub mod value;

pub use heap::{Composite, Heap, MapKey};
pub use memory::Memory;
pub use registers::{Reg, RegisterFile, REGISTER_COUNT};
pub use stack::Stack;
pub use value::{HeapRef, Value, ValueKind};
