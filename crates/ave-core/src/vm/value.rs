//! Runtime Value Representation
//!
//! The seven value kinds an AVE register or memory cell can hold. Scalars
//! (Int, Float, Atom) live inline; composite contents (Str, Tuple, List,
//! Map) live in the actor-local heap and are reachable only through a
//! typed handle.

use std::fmt;
use std::sync::Arc;

/// Handle into an actor's composite heap. Actor-local by construction;
/// a handle never crosses an actor boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapRef(pub u32);

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer
    Int(i64),

    /// IEEE 754 double
    Float(f64),

    /// Interned symbolic constant; opaque and not indexable
    Atom(Arc<str>),

    /// Byte string stored in the composite heap
    Str(HeapRef),

    /// Fixed-size ordered sequence
    Tuple(HeapRef),

    /// Variable-length ordered sequence
    List(HeapRef),

    /// Key/value mapping with scalar keys
    Map(HeapRef),
}

impl Value {
    /// The zero value used for fresh registers and memory cells
    pub fn zero() -> Self {
        Value::Int(0)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Atom(_) => ValueKind::Atom,
            Value::Str(_) => ValueKind::Str,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

/// Discriminant of a [`Value`], used by type checks and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Atom,
    Str,
    Tuple,
    List,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Atom => "atom",
            ValueKind::Str => "string",
            ValueKind::Tuple => "tuple",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        };
        f.write_str(name)
    }
}
