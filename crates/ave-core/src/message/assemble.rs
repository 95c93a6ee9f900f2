//! Message Assembler
//!
//! Receive side: replay a payload's restricted instruction program inside
//! a sandbox owned by the receiving actor, then fold the shape descriptor
//! into the actor's heap. Any irregularity rejects the message; the actor
//! itself is never at risk here.

use indexmap::IndexMap;

use crate::error::PayloadError;
use crate::vm::heap::Heap;
use crate::vm::value::Value;

use super::payload::{MessagePayload, MsgOp, Shape, MAX_PAYLOAD_CELLS, PAYLOAD_REGS};

/// A sandbox slot: scratch registers and cells share this representation.
/// Only the scalar leaves of the subset can ever appear.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Int(i64),
    Flo(f64),
    Str(Vec<u8>),
}

/// Scratch state for one payload execution, discarded afterwards
struct Sandbox {
    regs: [Cell; PAYLOAD_REGS],
    cells: Vec<Cell>,
}

impl Sandbox {
    fn new() -> Self {
        Sandbox {
            regs: std::array::from_fn(|_| Cell::Empty),
            cells: Vec::new(),
        }
    }

    fn run(&mut self, ops: &[MsgOp]) -> Result<(), PayloadError> {
        for op in ops {
            match op {
                MsgOp::Int(reg, value) => self.set_reg(*reg, Cell::Int(*value))?,
                MsgOp::Flo(reg, value) => self.set_reg(*reg, Cell::Flo(*value))?,
                MsgOp::Str(reg, bytes) => self.set_reg(*reg, Cell::Str(bytes.clone()))?,
                MsgOp::Move(dst, src) => {
                    let value = self.get_reg(*src)?.clone();
                    self.set_reg(*dst, value)?;
                }
                MsgOp::Store(reg, addr) => {
                    let value = self.get_reg(*reg)?.clone();
                    let at = self.check_cell(*addr)?;
                    if at >= self.cells.len() {
                        self.cells.resize(at + 1, Cell::Empty);
                    }
                    self.cells[at] = value;
                }
                MsgOp::Load(reg, addr) => {
                    let at = self.check_cell(*addr)?;
                    let value = self
                        .cells
                        .get(at)
                        .cloned()
                        .unwrap_or(Cell::Empty);
                    if value == Cell::Empty {
                        return Err(PayloadError::EmptyCell(*addr));
                    }
                    self.set_reg(*reg, value)?;
                }
            }
        }
        Ok(())
    }

    fn get_reg(&self, reg: u8) -> Result<&Cell, PayloadError> {
        self.regs
            .get(reg as usize)
            .ok_or(PayloadError::BadRegister(reg))
    }

    fn set_reg(&mut self, reg: u8, value: Cell) -> Result<(), PayloadError> {
        let slot = self
            .regs
            .get_mut(reg as usize)
            .ok_or(PayloadError::BadRegister(reg))?;
        *slot = value;
        Ok(())
    }

    fn check_cell(&self, addr: u16) -> Result<usize, PayloadError> {
        let at = addr as usize;
        if at >= MAX_PAYLOAD_CELLS {
            return Err(PayloadError::CellOutOfRange(addr));
        }
        Ok(at)
    }

    fn cell(&self, addr: u16) -> Result<&Cell, PayloadError> {
        match self.cells.get(addr as usize) {
            Some(Cell::Empty) | None => Err(PayloadError::EmptyCell(addr)),
            Some(cell) => Ok(cell),
        }
    }
}

/// Reconstruct a payload into a value in the receiving actor's heap
pub fn assemble_payload(
    payload: &MessagePayload,
    heap: &mut Heap,
) -> Result<Value, PayloadError> {
    let mut sandbox = Sandbox::new();
    sandbox.run(&payload.ops)?;
    fold(&payload.shape, &sandbox, heap)
}

fn fold(shape: &Shape, sandbox: &Sandbox, heap: &mut Heap) -> Result<Value, PayloadError> {
    match shape {
        Shape::Slot(addr) => match sandbox.cell(*addr)? {
            Cell::Int(n) => Ok(Value::Int(*n)),
            Cell::Flo(x) => Ok(Value::Float(*x)),
            Cell::Str(bytes) => heap
                .alloc_str(bytes.clone())
                .map_err(|_| PayloadError::SandboxExhausted),
            Cell::Empty => Err(PayloadError::EmptyCell(*addr)),
        },
        Shape::Atom(addr) => match sandbox.cell(*addr)? {
            Cell::Str(bytes) => {
                let name =
                    std::str::from_utf8(bytes).map_err(|_| PayloadError::BadAtomName)?;
                Ok(Value::Atom(name.into()))
            }
            _ => Err(PayloadError::MalformedShape),
        },
        Shape::Tuple(children) => {
            let mut elements = Vec::with_capacity(children.len());
            for child in children {
                elements.push(fold(child, sandbox, heap)?);
            }
            heap.alloc_tuple_from(elements)
                .map_err(|_| PayloadError::SandboxExhausted)
        }
        Shape::List(children) => {
            let mut elements = Vec::with_capacity(children.len());
            for child in children {
                elements.push(fold(child, sandbox, heap)?);
            }
            heap.alloc_list_from(elements)
                .map_err(|_| PayloadError::SandboxExhausted)
        }
        Shape::Map(entries) => {
            let mut folded = IndexMap::with_capacity(entries.len());
            for (key_shape, value_shape) in entries {
                let key_value = fold(key_shape, sandbox, heap)?;
                let key = heap
                    .map_key(&key_value)
                    .map_err(|_| PayloadError::MalformedShape)?;
                let value = fold(value_shape, sandbox, heap)?;
                folded.insert(key, value);
            }
            heap.alloc_map_from(folded)
                .map_err(|_| PayloadError::SandboxExhausted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::encode::serialize;
    use crate::vm::value::Value;

    /// Serialize in one heap, assemble into another, as `SEND`/`RECV` does
    fn roundtrip(value: &Value, sender: &Heap, receiver: &mut Heap) -> Value {
        let payload = serialize(value, sender).unwrap();
        let wire = payload.encode();
        let decoded = MessagePayload::decode(&wire).unwrap();
        assemble_payload(&decoded, receiver).unwrap()
    }

    #[test]
    fn int_roundtrips() {
        let sender = Heap::new(16);
        let mut receiver = Heap::new(16);
        let got = roundtrip(&Value::Int(42), &sender, &mut receiver);
        assert_eq!(got, Value::Int(42));
    }

    #[test]
    fn float_and_atom_roundtrip() {
        let sender = Heap::new(16);
        let mut receiver = Heap::new(16);
        assert_eq!(
            roundtrip(&Value::Float(-0.25), &sender, &mut receiver),
            Value::Float(-0.25)
        );
        assert_eq!(
            roundtrip(&Value::Atom("ready".into()), &sender, &mut receiver),
            Value::Atom("ready".into())
        );
    }

    #[test]
    fn nested_tuple_roundtrips_structurally() {
        let mut sender = Heap::new(16);
        let mut receiver = Heap::new(16);
        let s = sender.alloc_str(b"x".to_vec()).unwrap();
        let inner = sender.alloc_list_from(vec![Value::Float(1.5)]).unwrap();
        let t = sender
            .alloc_tuple_from(vec![Value::Int(1), s, inner])
            .unwrap();

        let got = roundtrip(&t, &sender, &mut receiver);

        // Compare against the same tuple rebuilt directly in the
        // receiver's heap
        let rebuilt_s = receiver.alloc_str(b"x".to_vec()).unwrap();
        let rebuilt_inner = receiver.alloc_list_from(vec![Value::Float(1.5)]).unwrap();
        let rebuilt = receiver
            .alloc_tuple_from(vec![Value::Int(1), rebuilt_s, rebuilt_inner])
            .unwrap();
        assert!(receiver.structural_eq(&got, &rebuilt).unwrap());
    }

    #[test]
    fn map_roundtrips() {
        let mut sender = Heap::new(16);
        let mut receiver = Heap::new(16);
        let m = sender.alloc_map().unwrap();
        sender
            .set_index(&m, &Value::Atom("count".into()), Value::Int(3))
            .unwrap();
        let got = roundtrip(&m, &sender, &mut receiver);
        assert_eq!(
            receiver.get_index(&got, &Value::Atom("count".into())).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn load_of_unwritten_cell_rejected() {
        let payload = MessagePayload {
            ops: vec![MsgOp::Load(0, 5)],
            shape: Shape::Slot(5),
        };
        let mut heap = Heap::new(16);
        assert_eq!(
            assemble_payload(&payload, &mut heap).unwrap_err(),
            PayloadError::EmptyCell(5)
        );
    }

    #[test]
    fn shape_referencing_empty_cell_rejected() {
        let payload = MessagePayload {
            ops: vec![MsgOp::Int(0, 1), MsgOp::Store(0, 0)],
            shape: Shape::Slot(7),
        };
        let mut heap = Heap::new(16);
        assert_eq!(
            assemble_payload(&payload, &mut heap).unwrap_err(),
            PayloadError::EmptyCell(7)
        );
    }

    #[test]
    fn atom_shape_over_numeric_cell_rejected() {
        let payload = MessagePayload {
            ops: vec![MsgOp::Int(0, 1), MsgOp::Store(0, 0)],
            shape: Shape::Atom(0),
        };
        let mut heap = Heap::new(16);
        assert_eq!(
            assemble_payload(&payload, &mut heap).unwrap_err(),
            PayloadError::MalformedShape
        );
    }
}
