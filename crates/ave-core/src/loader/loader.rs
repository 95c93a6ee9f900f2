//! Program Codec
//!
//! Binary encoding of a loaded program and its structural validation.
//! Layout: magic, version, label table, instruction records. Integers are
//! big-endian; strings and byte literals are length-prefixed.

use indexmap::IndexMap;

use crate::bytecode::{Instruction, OpCode, Program};
use crate::error::{LoadError, LoadResult};
use crate::vm::registers::Reg;

/// Supported program version
const VERSION: u8 = 1;

/// Minimum header size: magic + version + reserved + two counts
const MIN_FILE_SIZE: usize = 16;

/// Binary program loader and encoder
pub struct ProgramLoader;

impl ProgramLoader {
    /// Program magic: "AVEB"
    pub const MAGIC: u32 = 0x4156_4542;

    /// Load a program from raw bytes, validating structure and targets
    pub fn load(bytes: &[u8]) -> LoadResult<Program> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(LoadError::TruncatedProgram);
        }

        let mut cursor = 0;

        let magic = Self::read_u32(bytes, &mut cursor)?;
        if magic != Self::MAGIC {
            return Err(LoadError::InvalidMagicNumber);
        }

        let version = Self::read_u8(bytes, &mut cursor)?;
        if version != VERSION {
            return Err(LoadError::InvalidVersion(version));
        }
        // Reserved
        Self::read_u8(bytes, &mut cursor)?;
        Self::read_u8(bytes, &mut cursor)?;
        Self::read_u8(bytes, &mut cursor)?;

        let label_count = Self::read_u32(bytes, &mut cursor)? as usize;
        let mut labels = IndexMap::with_capacity(label_count);
        for _ in 0..label_count {
            let name_len = Self::read_u16(bytes, &mut cursor)? as usize;
            let raw = Self::read_slice(bytes, &mut cursor, name_len)?;
            let name =
                String::from_utf8(raw.to_vec()).map_err(|_| LoadError::MalformedProgram)?;
            let index = Self::read_u32(bytes, &mut cursor)?;
            labels.insert(name, index);
        }

        let instruction_count = Self::read_u32(bytes, &mut cursor)? as usize;
        let mut instructions = Vec::with_capacity(instruction_count);
        for _ in 0..instruction_count {
            instructions.push(Self::read_instruction(bytes, &mut cursor)?);
        }

        // Resolved targets must land inside the program
        for inst in &instructions {
            let target = match inst {
                Instruction::Jump(t) | Instruction::JumpIf(t) | Instruction::Spawn(_, t) => {
                    Some(*t as usize)
                }
                _ => None,
            };
            if let Some(target) = target {
                if target >= instructions.len() {
                    return Err(LoadError::JumpOutOfRange {
                        target,
                        len: instructions.len(),
                    });
                }
            }
        }

        Ok(Program::new(instructions, labels))
    }

    /// Encode a program into the binary layout `load` accepts
    pub fn encode(program: &Program) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(&Self::MAGIC.to_be_bytes());
        buf.push(VERSION);
        buf.extend(&[0u8; 3]);

        let labels: Vec<(&str, u32)> = program.labels().collect();
        buf.extend(&(labels.len() as u32).to_be_bytes());
        for (name, index) in labels {
            buf.extend(&(name.len() as u16).to_be_bytes());
            buf.extend(name.as_bytes());
            buf.extend(&index.to_be_bytes());
        }

        buf.extend(&(program.len() as u32).to_be_bytes());
        for inst in program.instructions() {
            Self::write_instruction(&mut buf, inst);
        }
        buf
    }

    fn write_instruction(buf: &mut Vec<u8>, inst: &Instruction) {
        buf.push(inst.opcode() as u8);
        match inst {
            Instruction::Int(reg, value) => {
                buf.push(reg.index() as u8);
                buf.extend(&value.to_be_bytes());
            }
            Instruction::Flo(reg, value) => {
                buf.push(reg.index() as u8);
                buf.extend(&value.to_be_bytes());
            }
            Instruction::Str(reg, bytes) => {
                buf.push(reg.index() as u8);
                buf.extend(&(bytes.len() as u32).to_be_bytes());
                buf.extend(bytes);
            }
            Instruction::Atom(reg, name) => {
                buf.push(reg.index() as u8);
                buf.extend(&(name.len() as u32).to_be_bytes());
                buf.extend(name.as_bytes());
            }
            Instruction::Move(a, b)
            | Instruction::Eq(a, b)
            | Instruction::Ne(a, b)
            | Instruction::Gt(a, b)
            | Instruction::Lt(a, b)
            | Instruction::Gte(a, b)
            | Instruction::Lte(a, b)
            | Instruction::Size(a, b)
            | Instruction::Send(a, b) => {
                buf.push(a.index() as u8);
                buf.push(b.index() as u8);
            }
            Instruction::Store(reg, addr) | Instruction::Load(reg, addr) => {
                buf.push(reg.index() as u8);
                buf.extend(&addr.to_be_bytes());
            }
            Instruction::Add(d, a, b)
            | Instruction::Sub(d, a, b)
            | Instruction::Mul(d, a, b)
            | Instruction::Div(d, a, b)
            | Instruction::Mod(d, a, b)
            | Instruction::SetC(d, a, b)
            | Instruction::MovC(d, a, b) => {
                buf.push(d.index() as u8);
                buf.push(a.index() as u8);
                buf.push(b.index() as u8);
            }
            Instruction::Jump(target) | Instruction::JumpIf(target) => {
                buf.extend(&target.to_be_bytes());
            }
            Instruction::Push(reg) | Instruction::Pop(reg) | Instruction::Map(reg) => {
                buf.push(reg.index() as u8);
            }
            Instruction::Tup(reg, n) | Instruction::List(reg, n) => {
                buf.push(reg.index() as u8);
                buf.extend(&n.to_be_bytes());
            }
            Instruction::Spawn(reg, entry) => {
                buf.push(reg.index() as u8);
                buf.extend(&entry.to_be_bytes());
            }
            Instruction::Recv | Instruction::Hlt => {}
        }
    }

    fn read_instruction(bytes: &[u8], cursor: &mut usize) -> LoadResult<Instruction> {
        let opcode_byte = Self::read_u8(bytes, cursor)?;
        let opcode =
            OpCode::from_u8(opcode_byte).ok_or(LoadError::InvalidOpcode(opcode_byte))?;

        let inst = match opcode {
            OpCode::Int => {
                let reg = Self::read_reg(bytes, cursor)?;
                Instruction::Int(reg, i64::from_be_bytes(Self::read_array(bytes, cursor)?))
            }
            OpCode::Flo => {
                let reg = Self::read_reg(bytes, cursor)?;
                Instruction::Flo(reg, f64::from_be_bytes(Self::read_array(bytes, cursor)?))
            }
            OpCode::Str => {
                let reg = Self::read_reg(bytes, cursor)?;
                let len = Self::read_u32(bytes, cursor)? as usize;
                Instruction::Str(reg, Self::read_slice(bytes, cursor, len)?.to_vec())
            }
            OpCode::Atom => {
                let reg = Self::read_reg(bytes, cursor)?;
                let len = Self::read_u32(bytes, cursor)? as usize;
                let raw = Self::read_slice(bytes, cursor, len)?;
                let name =
                    String::from_utf8(raw.to_vec()).map_err(|_| LoadError::MalformedProgram)?;
                Instruction::Atom(reg, name)
            }
            OpCode::Move => {
                Instruction::Move(Self::read_reg(bytes, cursor)?, Self::read_reg(bytes, cursor)?)
            }
            OpCode::Store => {
                let reg = Self::read_reg(bytes, cursor)?;
                Instruction::Store(reg, Self::read_u32(bytes, cursor)?)
            }
            OpCode::Load => {
                let reg = Self::read_reg(bytes, cursor)?;
                Instruction::Load(reg, Self::read_u32(bytes, cursor)?)
            }
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod => {
                let d = Self::read_reg(bytes, cursor)?;
                let a = Self::read_reg(bytes, cursor)?;
                let b = Self::read_reg(bytes, cursor)?;
                match opcode {
                    OpCode::Add => Instruction::Add(d, a, b),
                    OpCode::Sub => Instruction::Sub(d, a, b),
                    OpCode::Mul => Instruction::Mul(d, a, b),
                    OpCode::Div => Instruction::Div(d, a, b),
                    _ => Instruction::Mod(d, a, b),
                }
            }
            OpCode::Eq | OpCode::Ne | OpCode::Gt | OpCode::Lt | OpCode::Gte | OpCode::Lte => {
                let a = Self::read_reg(bytes, cursor)?;
                let b = Self::read_reg(bytes, cursor)?;
                match opcode {
                    OpCode::Eq => Instruction::Eq(a, b),
                    OpCode::Ne => Instruction::Ne(a, b),
                    OpCode::Gt => Instruction::Gt(a, b),
                    OpCode::Lt => Instruction::Lt(a, b),
                    OpCode::Gte => Instruction::Gte(a, b),
                    _ => Instruction::Lte(a, b),
                }
            }
            OpCode::Jump => Instruction::Jump(Self::read_u32(bytes, cursor)?),
            OpCode::JumpIf => Instruction::JumpIf(Self::read_u32(bytes, cursor)?),
            OpCode::Push => Instruction::Push(Self::read_reg(bytes, cursor)?),
            OpCode::Pop => Instruction::Pop(Self::read_reg(bytes, cursor)?),
            OpCode::Tup => {
                let reg = Self::read_reg(bytes, cursor)?;
                Instruction::Tup(reg, Self::read_u32(bytes, cursor)?)
            }
            OpCode::List => {
                let reg = Self::read_reg(bytes, cursor)?;
                Instruction::List(reg, Self::read_u32(bytes, cursor)?)
            }
            OpCode::Map => Instruction::Map(Self::read_reg(bytes, cursor)?),
            OpCode::Size => {
                Instruction::Size(Self::read_reg(bytes, cursor)?, Self::read_reg(bytes, cursor)?)
            }
            OpCode::SetC => Instruction::SetC(
                Self::read_reg(bytes, cursor)?,
                Self::read_reg(bytes, cursor)?,
                Self::read_reg(bytes, cursor)?,
            ),
            OpCode::MovC => Instruction::MovC(
                Self::read_reg(bytes, cursor)?,
                Self::read_reg(bytes, cursor)?,
                Self::read_reg(bytes, cursor)?,
            ),
            OpCode::Spawn => {
                let reg = Self::read_reg(bytes, cursor)?;
                Instruction::Spawn(reg, Self::read_u32(bytes, cursor)?)
            }
            OpCode::Send => {
                Instruction::Send(Self::read_reg(bytes, cursor)?, Self::read_reg(bytes, cursor)?)
            }
            OpCode::Recv => Instruction::Recv,
            OpCode::Hlt => Instruction::Hlt,
        };
        Ok(inst)
    }

    fn read_reg(bytes: &[u8], cursor: &mut usize) -> LoadResult<Reg> {
        let raw = Self::read_u8(bytes, cursor)?;
        Reg::from_index(raw).ok_or(LoadError::InvalidRegister(raw))
    }

    fn read_u8(bytes: &[u8], cursor: &mut usize) -> LoadResult<u8> {
        if *cursor >= bytes.len() {
            return Err(LoadError::TruncatedProgram);
        }
        let v = bytes[*cursor];
        *cursor += 1;
        Ok(v)
    }

    fn read_u16(bytes: &[u8], cursor: &mut usize) -> LoadResult<u16> {
        Ok(u16::from_be_bytes(Self::read_array(bytes, cursor)?))
    }

    fn read_u32(bytes: &[u8], cursor: &mut usize) -> LoadResult<u32> {
        Ok(u32::from_be_bytes(Self::read_array(bytes, cursor)?))
    }

    fn read_array<const N: usize>(bytes: &[u8], cursor: &mut usize) -> LoadResult<[u8; N]> {
        let slice = Self::read_slice(bytes, cursor, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn read_slice<'a>(
        bytes: &'a [u8],
        cursor: &mut usize,
        len: usize,
    ) -> LoadResult<&'a [u8]> {
        let end = cursor.checked_add(len).ok_or(LoadError::TruncatedProgram)?;
        if end > bytes.len() {
            return Err(LoadError::TruncatedProgram);
        }
        let slice = &bytes[*cursor..end];
        *cursor = end;
        Ok(slice)
    }
}
