//! Value Serialization
//!
//! Send side of the messaging protocol: walk a value leaf-first, emit an
//! immediate + `STORE` pair per leaf into consecutive sandbox cells, and
//! record the composite structure as a shape tree. The receiver replays
//! the ops and folds the shape into its own heap.

use crate::error::{Fault, VmResult};
use crate::vm::heap::{Composite, Heap, MapKey, MAX_VALUE_DEPTH};
use crate::vm::value::Value;

use super::payload::{MessagePayload, MsgOp, Shape, MAX_PAYLOAD_CELLS};

/// Serialize a value into a self-contained message payload
pub fn serialize(value: &Value, heap: &Heap) -> VmResult<MessagePayload> {
    let mut ops = Vec::new();
    let mut next_cell: usize = 0;
    let shape = emit(value, heap, &mut ops, &mut next_cell, 0)?;
    Ok(MessagePayload { ops, shape })
}

fn emit(
    value: &Value,
    heap: &Heap,
    ops: &mut Vec<MsgOp>,
    next_cell: &mut usize,
    depth: usize,
) -> VmResult<Shape> {
    // Self-referential composites would walk forever
    if depth > MAX_VALUE_DEPTH {
        return Err(Fault::NestingTooDeep);
    }
    match value {
        Value::Int(n) => Ok(emit_leaf(MsgOp::Int(0, *n), false, ops, next_cell)?),
        Value::Float(x) => Ok(emit_leaf(MsgOp::Flo(0, *x), false, ops, next_cell)?),
        Value::Atom(name) => Ok(emit_leaf(
            MsgOp::Str(0, name.as_bytes().to_vec()),
            true,
            ops,
            next_cell,
        )?),
        Value::Str(_) => {
            let bytes = heap.str_bytes(value)?.to_vec();
            Ok(emit_leaf(MsgOp::Str(0, bytes), false, ops, next_cell)?)
        }
        Value::Tuple(handle) | Value::List(handle) => {
            let elements = match heap.composite(*handle)? {
                Composite::Tuple(elements) | Composite::List(elements) => elements.clone(),
                _ => {
                    return Err(Fault::TypeMismatch {
                        expected: "tuple or list composite",
                        found: value.kind(),
                    })
                }
            };
            let mut children = Vec::with_capacity(elements.len());
            for element in &elements {
                children.push(emit(element, heap, ops, next_cell, depth + 1)?);
            }
            Ok(match value {
                Value::Tuple(_) => Shape::Tuple(children),
                _ => Shape::List(children),
            })
        }
        Value::Map(handle) => {
            let entries = match heap.composite(*handle)? {
                Composite::Map(entries) => entries.clone(),
                _ => {
                    return Err(Fault::TypeMismatch {
                        expected: "map composite",
                        found: value.kind(),
                    })
                }
            };
            let mut shaped = Vec::with_capacity(entries.len());
            for (key, entry_value) in &entries {
                let key_shape = emit_key(key, ops, next_cell)?;
                let value_shape = emit(entry_value, heap, ops, next_cell, depth + 1)?;
                shaped.push((key_shape, value_shape));
            }
            Ok(Shape::Map(shaped))
        }
    }
}

fn emit_key(key: &MapKey, ops: &mut Vec<MsgOp>, next_cell: &mut usize) -> VmResult<Shape> {
    match key {
        MapKey::Int(n) => emit_leaf(MsgOp::Int(0, *n), false, ops, next_cell),
        MapKey::Float(bits) => {
            emit_leaf(MsgOp::Flo(0, f64::from_bits(*bits)), false, ops, next_cell)
        }
        MapKey::Atom(name) => {
            emit_leaf(MsgOp::Str(0, name.as_bytes().to_vec()), true, ops, next_cell)
        }
        MapKey::Str(bytes) => emit_leaf(MsgOp::Str(0, bytes.clone()), false, ops, next_cell),
    }
}

fn emit_leaf(
    op: MsgOp,
    as_atom: bool,
    ops: &mut Vec<MsgOp>,
    next_cell: &mut usize,
) -> VmResult<Shape> {
    if *next_cell >= MAX_PAYLOAD_CELLS {
        // The value does not fit the payload sandbox
        return Err(Fault::OutOfMemory);
    }
    let cell = *next_cell as u16;
    *next_cell += 1;
    ops.push(op);
    ops.push(MsgOp::Store(0, cell));
    Ok(if as_atom {
        Shape::Atom(cell)
    } else {
        Shape::Slot(cell)
    })
}
