//! Composite Heap
//!
//! Arena backing Str/Tuple/List/Map contents for one actor. Slots are
//! reached only through typed handles and the `SIZE`/`SET_C`/`MOV_C`
//! instructions; no raw addressing, no cross-actor references.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Fault, VmResult};

use super::value::{HeapRef, Value, ValueKind};

/// Nesting bound for recursive value walks. `SET_C` can make a composite
/// reach itself, so equality and serialization must not assume finite
/// depth; crossing this bound faults the walking actor only.
pub const MAX_VALUE_DEPTH: usize = 64;

/// One heap slot
#[derive(Debug, Clone)]
pub enum Composite {
    Str(Vec<u8>),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Map(IndexMap<MapKey, Value>),
}

/// Map keys are restricted to scalar kinds so key equality never needs a
/// heap walk. Floats key by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Int(i64),
    Float(u64),
    Atom(Arc<str>),
    Str(Vec<u8>),
}

/// Actor-local composite storage
#[derive(Debug)]
pub struct Heap {
    slots: Vec<Composite>,
    max_slots: usize,
}

impl Heap {
    pub fn new(max_slots: usize) -> Self {
        Heap {
            slots: Vec::new(),
            max_slots,
        }
    }

    fn alloc(&mut self, composite: Composite) -> VmResult<HeapRef> {
        if self.slots.len() >= self.max_slots {
            return Err(Fault::OutOfMemory);
        }
        let index = self.slots.len() as u32;
        self.slots.push(composite);
        Ok(HeapRef(index))
    }

    pub fn alloc_str(&mut self, bytes: Vec<u8>) -> VmResult<Value> {
        Ok(Value::Str(self.alloc(Composite::Str(bytes))?))
    }

    /// Allocate a fixed-size tuple of `len` zero elements
    pub fn alloc_tuple(&mut self, len: usize) -> VmResult<Value> {
        let slot = Composite::Tuple(vec![Value::zero(); len]);
        Ok(Value::Tuple(self.alloc(slot)?))
    }

    /// Allocate a list of `len` zero elements
    pub fn alloc_list(&mut self, len: usize) -> VmResult<Value> {
        let slot = Composite::List(vec![Value::zero(); len]);
        Ok(Value::List(self.alloc(slot)?))
    }

    pub fn alloc_map(&mut self) -> VmResult<Value> {
        Ok(Value::Map(self.alloc(Composite::Map(IndexMap::new()))?))
    }

    pub fn alloc_tuple_from(&mut self, elements: Vec<Value>) -> VmResult<Value> {
        Ok(Value::Tuple(self.alloc(Composite::Tuple(elements))?))
    }

    pub fn alloc_list_from(&mut self, elements: Vec<Value>) -> VmResult<Value> {
        Ok(Value::List(self.alloc(Composite::List(elements))?))
    }

    pub fn alloc_map_from(&mut self, entries: IndexMap<MapKey, Value>) -> VmResult<Value> {
        Ok(Value::Map(self.alloc(Composite::Map(entries))?))
    }

    pub fn composite(&self, handle: HeapRef) -> VmResult<&Composite> {
        self.slots.get(handle.0 as usize).ok_or(Fault::IndexOutOfBounds {
            index: handle.0 as i64,
            len: self.slots.len(),
        })
    }

    fn composite_mut(&mut self, handle: HeapRef) -> VmResult<&mut Composite> {
        let len = self.slots.len();
        self.slots.get_mut(handle.0 as usize).ok_or(Fault::IndexOutOfBounds {
            index: handle.0 as i64,
            len,
        })
    }

    pub fn str_bytes(&self, value: &Value) -> VmResult<&[u8]> {
        match value {
            Value::Str(handle) => match self.composite(*handle)? {
                Composite::Str(bytes) => Ok(bytes),
                _ => Err(Fault::TypeMismatch {
                    expected: "string",
                    found: value.kind(),
                }),
            },
            other => Err(Fault::TypeMismatch {
                expected: "string",
                found: other.kind(),
            }),
        }
    }

    /// Element count for `SIZE`: byte length of strings, arity of tuples,
    /// length of lists, entry count of maps. Scalar kinds fault.
    pub fn size_of(&self, value: &Value) -> VmResult<i64> {
        let handle = match value {
            Value::Str(h) | Value::Tuple(h) | Value::List(h) | Value::Map(h) => *h,
            other => {
                return Err(Fault::TypeMismatch {
                    expected: "sizeable value (string, tuple, list, map)",
                    found: other.kind(),
                })
            }
        };
        let len = match self.composite(handle)? {
            Composite::Str(bytes) => bytes.len(),
            Composite::Tuple(elements) => elements.len(),
            Composite::List(elements) => elements.len(),
            Composite::Map(entries) => entries.len(),
        };
        Ok(len as i64)
    }

    /// `MOV_C`: read the element at `index` inside `target`
    pub fn get_index(&self, target: &Value, index: &Value) -> VmResult<Value> {
        match target {
            Value::Str(handle) => {
                let bytes = match self.composite(*handle)? {
                    Composite::Str(bytes) => bytes,
                    _ => return Err(Fault::KeyNotFound),
                };
                let at = Self::check_bounds(index, bytes.len())?;
                Ok(Value::Int(bytes[at] as i64))
            }
            Value::Tuple(handle) | Value::List(handle) => {
                let elements = match self.composite(*handle)? {
                    Composite::Tuple(elements) | Composite::List(elements) => elements,
                    _ => return Err(Fault::KeyNotFound),
                };
                let at = Self::check_bounds(index, elements.len())?;
                Ok(elements[at].clone())
            }
            Value::Map(handle) => {
                let key = self.map_key(index)?;
                let entries = match self.composite(*handle)? {
                    Composite::Map(entries) => entries,
                    _ => return Err(Fault::KeyNotFound),
                };
                entries.get(&key).cloned().ok_or(Fault::KeyNotFound)
            }
            other => Err(Fault::TypeMismatch {
                expected: "indexable value (string, tuple, list, map)",
                found: other.kind(),
            }),
        }
    }

    /// `SET_C`: write `value` at `index` inside `target`
    pub fn set_index(&mut self, target: &Value, index: &Value, value: Value) -> VmResult<()> {
        match target {
            Value::Str(handle) => {
                let byte = match value {
                    Value::Int(n) if (0..=255).contains(&n) => n as u8,
                    other => {
                        return Err(Fault::TypeMismatch {
                            expected: "byte (int in 0..=255)",
                            found: other.kind(),
                        })
                    }
                };
                let handle = *handle;
                let at = match self.composite(handle)? {
                    Composite::Str(bytes) => Self::check_bounds(index, bytes.len())?,
                    _ => return Err(Fault::KeyNotFound),
                };
                if let Composite::Str(bytes) = self.composite_mut(handle)? {
                    bytes[at] = byte;
                }
                Ok(())
            }
            Value::Tuple(handle) | Value::List(handle) => {
                let handle = *handle;
                let at = match self.composite(handle)? {
                    Composite::Tuple(elements) | Composite::List(elements) => {
                        Self::check_bounds(index, elements.len())?
                    }
                    _ => return Err(Fault::KeyNotFound),
                };
                match self.composite_mut(handle)? {
                    Composite::Tuple(elements) | Composite::List(elements) => {
                        elements[at] = value;
                    }
                    _ => {}
                }
                Ok(())
            }
            Value::Map(handle) => {
                let key = self.map_key(index)?;
                let handle = *handle;
                if let Composite::Map(entries) = self.composite_mut(handle)? {
                    entries.insert(key, value);
                }
                Ok(())
            }
            other => Err(Fault::TypeMismatch {
                expected: "indexable value (string, tuple, list, map)",
                found: other.kind(),
            }),
        }
    }

    fn check_bounds(index: &Value, len: usize) -> VmResult<usize> {
        let raw = index.as_int().ok_or(Fault::TypeMismatch {
            expected: "int index",
            found: index.kind(),
        })?;
        if raw < 0 || raw as usize >= len {
            return Err(Fault::IndexOutOfBounds { index: raw, len });
        }
        Ok(raw as usize)
    }

    /// Convert a scalar value into a map key; composites fault
    pub fn map_key(&self, value: &Value) -> VmResult<MapKey> {
        match value {
            Value::Int(n) => Ok(MapKey::Int(*n)),
            Value::Float(x) => Ok(MapKey::Float(x.to_bits())),
            Value::Atom(name) => Ok(MapKey::Atom(name.clone())),
            Value::Str(_) => Ok(MapKey::Str(self.str_bytes(value)?.to_vec())),
            other => Err(Fault::TypeMismatch {
                expected: "scalar map key (int, float, atom, string)",
                found: other.kind(),
            }),
        }
    }

    /// Structural equality between two values of the same actor.
    /// Kind mismatches are handled by the caller; here they compare
    /// unequal. Faults `NestingTooDeep` on self-referential composites.
    pub fn structural_eq(&self, a: &Value, b: &Value) -> VmResult<bool> {
        self.eq_at(a, b, 0)
    }

    fn eq_at(&self, a: &Value, b: &Value, depth: usize) -> VmResult<bool> {
        if depth > MAX_VALUE_DEPTH {
            return Err(Fault::NestingTooDeep);
        }
        let equal = match (a, b) {
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Atom(x), Value::Atom(y)) => x == y,
            (Value::Str(ha), Value::Str(hb)) => {
                match (self.composite(*ha)?, self.composite(*hb)?) {
                    (Composite::Str(x), Composite::Str(y)) => x == y,
                    _ => false,
                }
            }
            (Value::Tuple(ha), Value::Tuple(hb)) | (Value::List(ha), Value::List(hb)) => {
                match (self.composite(*ha)?, self.composite(*hb)?) {
                    (
                        Composite::Tuple(xs) | Composite::List(xs),
                        Composite::Tuple(ys) | Composite::List(ys),
                    ) => {
                        if xs.len() != ys.len() {
                            return Ok(false);
                        }
                        for (x, y) in xs.iter().zip(ys) {
                            if !self.eq_at(x, y, depth + 1)? {
                                return Ok(false);
                            }
                        }
                        true
                    }
                    _ => false,
                }
            }
            (Value::Map(ha), Value::Map(hb)) => {
                match (self.composite(*ha)?, self.composite(*hb)?) {
                    (Composite::Map(xs), Composite::Map(ys)) => {
                        if xs.len() != ys.len() {
                            return Ok(false);
                        }
                        for (key, x) in xs {
                            match ys.get(key) {
                                Some(y) if self.eq_at(x, y, depth + 1)? => {}
                                _ => return Ok(false),
                            }
                        }
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        };
        Ok(equal)
    }

    /// Natural ordering for Int/Float, lexicographic for Str. Everything
    /// else is unorderable, as is a NaN operand.
    pub fn compare_order(&self, a: &Value, b: &Value) -> VmResult<Ordering> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
            (Value::Float(x), Value::Float(y)) => {
                x.partial_cmp(y).ok_or(Fault::Unorderable(ValueKind::Float))
            }
            (Value::Str(_), Value::Str(_)) => {
                Ok(self.str_bytes(a)?.cmp(self.str_bytes(b)?))
            }
            _ => Err(Fault::Unorderable(a.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap() -> Heap {
        Heap::new(64)
    }

    #[test]
    fn list_roundtrip_every_index() {
        let mut h = heap();
        let list = h.alloc_list(4).unwrap();
        assert_eq!(h.size_of(&list).unwrap(), 4);
        for i in 0..4 {
            h.set_index(&list, &Value::Int(i), Value::Int(i * 10)).unwrap();
            let got = h.get_index(&list, &Value::Int(i)).unwrap();
            assert_eq!(got, Value::Int(i * 10));
        }
    }

    #[test]
    fn out_of_range_index_faults() {
        let mut h = heap();
        let list = h.alloc_list(2).unwrap();
        let err = h.get_index(&list, &Value::Int(2)).unwrap_err();
        assert_eq!(err, Fault::IndexOutOfBounds { index: 2, len: 2 });
        let err = h.set_index(&list, &Value::Int(-1), Value::Int(0)).unwrap_err();
        assert_eq!(err, Fault::IndexOutOfBounds { index: -1, len: 2 });
    }

    #[test]
    fn missing_map_key_faults() {
        let mut h = heap();
        let map = h.alloc_map().unwrap();
        h.set_index(&map, &Value::Int(1), Value::Int(100)).unwrap();
        assert_eq!(h.get_index(&map, &Value::Int(1)).unwrap(), Value::Int(100));
        let err = h.get_index(&map, &Value::Int(2)).unwrap_err();
        assert_eq!(err, Fault::KeyNotFound);
    }

    #[test]
    fn composite_map_key_rejected() {
        let mut h = heap();
        let map = h.alloc_map().unwrap();
        let inner = h.alloc_list(1).unwrap();
        let err = h.set_index(&map, &inner, Value::Int(0)).unwrap_err();
        assert!(matches!(err, Fault::TypeMismatch { .. }));
    }

    #[test]
    fn string_indexes_as_bytes() {
        let mut h = heap();
        let s = h.alloc_str(b"abc".to_vec()).unwrap();
        assert_eq!(h.size_of(&s).unwrap(), 3);
        assert_eq!(h.get_index(&s, &Value::Int(1)).unwrap(), Value::Int(b'b' as i64));
        h.set_index(&s, &Value::Int(1), Value::Int(b'z' as i64)).unwrap();
        assert_eq!(h.str_bytes(&s).unwrap(), b"azc");
        let err = h.set_index(&s, &Value::Int(0), Value::Int(300)).unwrap_err();
        assert!(matches!(err, Fault::TypeMismatch { .. }));
    }

    #[test]
    fn size_of_scalar_faults() {
        let h = heap();
        let err = h.size_of(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, Fault::TypeMismatch { .. }));
    }

    #[test]
    fn structural_eq_nested() {
        let mut h = heap();
        let s1 = h.alloc_str(b"x".to_vec()).unwrap();
        let s2 = h.alloc_str(b"x".to_vec()).unwrap();
        let t1 = h.alloc_tuple_from(vec![Value::Int(1), s1]).unwrap();
        let t2 = h.alloc_tuple_from(vec![Value::Int(1), s2.clone()]).unwrap();
        assert!(h.structural_eq(&t1, &t2).unwrap());

        let t3 = h.alloc_tuple_from(vec![Value::Int(2), s2]).unwrap();
        assert!(!h.structural_eq(&t1, &t3).unwrap());
    }

    #[test]
    fn self_referential_eq_faults_instead_of_recursing() {
        let mut h = heap();
        let list = h.alloc_list(1).unwrap();
        h.set_index(&list, &Value::Int(0), list.clone()).unwrap();
        assert_eq!(
            h.structural_eq(&list, &list).unwrap_err(),
            Fault::NestingTooDeep
        );
    }

    #[test]
    fn ordering_on_composites_faults() {
        let mut h = heap();
        let t = h.alloc_tuple(1).unwrap();
        let err = h.compare_order(&t, &t).unwrap_err();
        assert!(matches!(err, Fault::Unorderable(_)));
    }

    #[test]
    fn string_ordering_is_lexicographic() {
        let mut h = heap();
        let a = h.alloc_str(b"abc".to_vec()).unwrap();
        let b = h.alloc_str(b"abd".to_vec()).unwrap();
        assert_eq!(h.compare_order(&a, &b).unwrap(), Ordering::Less);
    }

    #[test]
    fn heap_limit_enforced() {
        let mut h = Heap::new(1);
        h.alloc_map().unwrap();
        assert_eq!(h.alloc_map().unwrap_err(), Fault::OutOfMemory);
    }
}
