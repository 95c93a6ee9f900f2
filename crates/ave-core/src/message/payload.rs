//! Message Payload
//!
//! The unit exchanged by `SEND`/`RECV`: a program in the six-instruction
//! assembly subset plus the shape descriptor the receiver folds composites
//! with. The opcode whitelist is enforced structurally at decode time;
//! a payload cannot carry control flow, composite construction, or SEND.

use crate::bytecode::OpCode;
use crate::error::PayloadError;

/// Scratch registers available to payload programs
pub const PAYLOAD_REGS: usize = 8;

/// Upper bound on sandbox cells a payload may address
pub const MAX_PAYLOAD_CELLS: usize = 4096;

/// Payload wire version
const PAYLOAD_VERSION: u8 = 1;

/// One instruction of the message assembly subset
#[derive(Debug, Clone, PartialEq)]
pub enum MsgOp {
    /// Load an integer immediate into a scratch register
    Int(u8, i64),
    /// Load a float immediate
    Flo(u8, f64),
    /// Load a byte-string immediate
    Str(u8, Vec<u8>),
    /// Copy between scratch registers
    Move(u8, u8),
    /// Write a scratch register to a sandbox cell
    Store(u8, u16),
    /// Read a sandbox cell into a scratch register
    Load(u8, u16),
}

impl MsgOp {
    pub fn opcode(&self) -> OpCode {
        match self {
            MsgOp::Int(..) => OpCode::Int,
            MsgOp::Flo(..) => OpCode::Flo,
            MsgOp::Str(..) => OpCode::Str,
            MsgOp::Move(..) => OpCode::Move,
            MsgOp::Store(..) => OpCode::Store,
            MsgOp::Load(..) => OpCode::Load,
        }
    }
}

/// How the receiver reassembles a value from sandbox cells. Folding is
/// trusted VM code; the payload itself never constructs composites.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Scalar or string taken directly from a cell
    Slot(u16),
    /// Cell holds string bytes to be interned as an atom name
    Atom(u16),
    Tuple(Vec<Shape>),
    List(Vec<Shape>),
    Map(Vec<(Shape, Shape)>),
}

/// A self-contained message: assembly ops plus the shape of the value
/// they reconstruct
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePayload {
    pub ops: Vec<MsgOp>,
    pub shape: Shape,
}

impl MessagePayload {
    /// Encode to the wire form consumed by transports
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![PAYLOAD_VERSION];
        buf.extend(&(self.ops.len() as u16).to_be_bytes());
        for op in &self.ops {
            buf.push(op.opcode() as u8);
            match op {
                MsgOp::Int(reg, value) => {
                    buf.push(*reg);
                    buf.extend(&value.to_be_bytes());
                }
                MsgOp::Flo(reg, value) => {
                    buf.push(*reg);
                    buf.extend(&value.to_be_bytes());
                }
                MsgOp::Str(reg, bytes) => {
                    buf.push(*reg);
                    buf.extend(&(bytes.len() as u32).to_be_bytes());
                    buf.extend(bytes);
                }
                MsgOp::Move(dst, src) => {
                    buf.push(*dst);
                    buf.push(*src);
                }
                MsgOp::Store(reg, addr) | MsgOp::Load(reg, addr) => {
                    buf.push(*reg);
                    buf.extend(&addr.to_be_bytes());
                }
            }
        }
        Self::encode_shape(&mut buf, &self.shape);
        buf
    }

    fn encode_shape(buf: &mut Vec<u8>, shape: &Shape) {
        match shape {
            Shape::Slot(cell) => {
                buf.push(0x00);
                buf.extend(&cell.to_be_bytes());
            }
            Shape::Atom(cell) => {
                buf.push(0x01);
                buf.extend(&cell.to_be_bytes());
            }
            Shape::Tuple(children) => {
                buf.push(0x02);
                buf.extend(&(children.len() as u16).to_be_bytes());
                for child in children {
                    Self::encode_shape(buf, child);
                }
            }
            Shape::List(children) => {
                buf.push(0x03);
                buf.extend(&(children.len() as u16).to_be_bytes());
                for child in children {
                    Self::encode_shape(buf, child);
                }
            }
            Shape::Map(entries) => {
                buf.push(0x04);
                buf.extend(&(entries.len() as u16).to_be_bytes());
                for (key, value) in entries {
                    Self::encode_shape(buf, key);
                    Self::encode_shape(buf, value);
                }
            }
        }
    }

    /// Decode from wire form, rejecting anything outside the assembler
    /// subset. This is the only place payload bytes become instructions.
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        let mut cursor = 0;
        let version = read_u8(bytes, &mut cursor)?;
        if version != PAYLOAD_VERSION {
            return Err(PayloadError::UnsupportedVersion(version));
        }
        let op_count = read_u16(bytes, &mut cursor)? as usize;
        let mut ops = Vec::with_capacity(op_count);
        for _ in 0..op_count {
            ops.push(Self::decode_op(bytes, &mut cursor)?);
        }
        let shape = Self::decode_shape(bytes, &mut cursor, 0)?;
        Ok(MessagePayload { ops, shape })
    }

    fn decode_op(bytes: &[u8], cursor: &mut usize) -> Result<MsgOp, PayloadError> {
        let opcode = read_u8(bytes, cursor)?;
        let op = match OpCode::from_u8(opcode) {
            Some(op) if op.is_message_safe() => op,
            _ => return Err(PayloadError::ForbiddenOpcode(opcode)),
        };
        let reg = read_reg(bytes, cursor)?;
        let decoded = match op {
            OpCode::Int => MsgOp::Int(reg, i64::from_be_bytes(read_array(bytes, cursor)?)),
            OpCode::Flo => MsgOp::Flo(reg, f64::from_be_bytes(read_array(bytes, cursor)?)),
            OpCode::Str => {
                let len = u32::from_be_bytes(read_array(bytes, cursor)?) as usize;
                MsgOp::Str(reg, read_slice(bytes, cursor, len)?.to_vec())
            }
            OpCode::Move => MsgOp::Move(reg, read_reg(bytes, cursor)?),
            OpCode::Store => MsgOp::Store(reg, read_u16(bytes, cursor)?),
            OpCode::Load => MsgOp::Load(reg, read_u16(bytes, cursor)?),
            _ => return Err(PayloadError::ForbiddenOpcode(opcode)),
        };
        Ok(decoded)
    }

    fn decode_shape(
        bytes: &[u8],
        cursor: &mut usize,
        depth: usize,
    ) -> Result<Shape, PayloadError> {
        // Nesting bound keeps hostile shapes from exhausting the stack
        if depth > 64 {
            return Err(PayloadError::MalformedShape);
        }
        let tag = read_u8(bytes, cursor)?;
        let shape = match tag {
            0x00 => Shape::Slot(read_u16(bytes, cursor)?),
            0x01 => Shape::Atom(read_u16(bytes, cursor)?),
            0x02 | 0x03 => {
                let count = read_u16(bytes, cursor)? as usize;
                let mut children = Vec::with_capacity(count.min(256));
                for _ in 0..count {
                    children.push(Self::decode_shape(bytes, cursor, depth + 1)?);
                }
                if tag == 0x02 {
                    Shape::Tuple(children)
                } else {
                    Shape::List(children)
                }
            }
            0x04 => {
                let count = read_u16(bytes, cursor)? as usize;
                let mut entries = Vec::with_capacity(count.min(256));
                for _ in 0..count {
                    let key = Self::decode_shape(bytes, cursor, depth + 1)?;
                    let value = Self::decode_shape(bytes, cursor, depth + 1)?;
                    entries.push((key, value));
                }
                Shape::Map(entries)
            }
            _ => return Err(PayloadError::MalformedShape),
        };
        Ok(shape)
    }
}

fn read_u8(bytes: &[u8], cursor: &mut usize) -> Result<u8, PayloadError> {
    let v = *bytes.get(*cursor).ok_or(PayloadError::Truncated)?;
    *cursor += 1;
    Ok(v)
}

fn read_reg(bytes: &[u8], cursor: &mut usize) -> Result<u8, PayloadError> {
    let raw = read_u8(bytes, cursor)?;
    if raw as usize >= PAYLOAD_REGS {
        return Err(PayloadError::BadRegister(raw));
    }
    Ok(raw)
}

fn read_u16(bytes: &[u8], cursor: &mut usize) -> Result<u16, PayloadError> {
    Ok(u16::from_be_bytes(read_array(bytes, cursor)?))
}

fn read_array<const N: usize>(bytes: &[u8], cursor: &mut usize) -> Result<[u8; N], PayloadError> {
    let slice = read_slice(bytes, cursor, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}

fn read_slice<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
) -> Result<&'a [u8], PayloadError> {
    let end = cursor.checked_add(len).ok_or(PayloadError::Truncated)?;
    if end > bytes.len() {
        return Err(PayloadError::Truncated);
    }
    let slice = &bytes[*cursor..end];
    *cursor = end;
    Ok(slice)
}
