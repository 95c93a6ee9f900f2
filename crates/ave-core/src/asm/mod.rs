//! Textual Assembly
//!
//! Parser for the `OPCODE operand, operand` syntax with `;` comments and
//! `label:` markers. Labels resolve here, at load time; a jump or spawn
//! naming an unknown label fails the whole load with `UnknownLabel`.

use indexmap::IndexMap;

use crate::bytecode::{Instruction, Program};
use crate::error::{LoadError, LoadResult};
use crate::vm::registers::Reg;

/// Assemble a source listing into a loaded program
pub fn assemble(source: &str) -> LoadResult<Program> {
    // Pass 1: label table
    let mut labels: IndexMap<String, u32> = IndexMap::new();
    let mut index: u32 = 0;
    for (line_no, raw) in source.lines().enumerate() {
        let line = strip_comment(raw);
        let (line_labels, rest) = split_labels(line, line_no + 1)?;
        for label in line_labels {
            if labels.insert(label.clone(), index).is_some() {
                return Err(LoadError::Parse {
                    line: line_no + 1,
                    message: format!("duplicate label `{label}`"),
                });
            }
        }
        if !rest.trim().is_empty() {
            index += 1;
        }
    }

    // Pass 2: instructions
    let mut instructions = Vec::with_capacity(index as usize);
    for (line_no, raw) in source.lines().enumerate() {
        let line = strip_comment(raw);
        let (_, rest) = split_labels(line, line_no + 1)?;
        let rest = rest.trim();
        if rest.is_empty() {
            continue;
        }
        instructions.push(parse_instruction(rest, line_no + 1, &labels)?);
    }

    // A trailing label resolves past the last instruction; reject it here so
    // the text and binary paths agree on what is loadable
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

/// Drop a `;` comment, respecting string literals
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (at, ch) in line.char_indices() {
        match ch {
            '\\' if in_string => escaped = !escaped,
            '"' if !escaped => in_string = !in_string,
            ';' if !in_string => return &line[..at],
            _ => escaped = false,
        }
    }
    line
}

/// Peel `name:` prefixes off a line, returning the labels and the remainder
fn split_labels(line: &str, line_no: usize) -> LoadResult<(Vec<String>, &str)> {
    let mut rest = line.trim_start();
    let mut found = Vec::new();
    loop {
        let Some(colon) = rest.find(':') else { break };
        let candidate = &rest[..colon];
        if candidate.is_empty() || !is_identifier(candidate) {
            break;
        }
        // A colon inside an operand list is not a label marker
        if rest[..colon].contains(char::is_whitespace) {
            break;
        }
        if candidate.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Err(LoadError::Parse {
                line: line_no,
                message: format!("label `{candidate}` may not start with a digit"),
            });
        }
        found.push(candidate.to_string());
        rest = rest[colon + 1..].trim_start();
    }
    Ok((found, rest))
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// An operand as written, before opcode-specific checking
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Reg(Reg),
    Int(i64),
    Float(f64),
    Str(Vec<u8>),
    Ident(String),
}

fn parse_instruction(
    text: &str,
    line: usize,
    labels: &IndexMap<String, u32>,
) -> LoadResult<Instruction> {
    let (mnemonic, operand_text) = match text.find(char::is_whitespace) {
        Some(at) => (&text[..at], text[at..].trim()),
        None => (text, ""),
    };
    let mnemonic = mnemonic.to_ascii_uppercase();
    let operands = parse_operands(operand_text, line)?;

    let err = |message: String| LoadError::Parse { line, message };

    let reg = |op: &Operand| -> LoadResult<Reg> {
        match op {
            Operand::Reg(r) => Ok(*r),
            other => Err(err(format!("expected register, found {other:?}"))),
        }
    };
    let uint = |op: &Operand| -> LoadResult<u32> {
        match op {
            Operand::Int(n) if *n >= 0 && *n <= u32::MAX as i64 => Ok(*n as u32),
            other => Err(err(format!("expected unsigned integer, found {other:?}"))),
        }
    };
    let target = |op: &Operand| -> LoadResult<u32> {
        match op {
            Operand::Ident(name) => labels
                .get(name)
                .copied()
                .ok_or_else(|| LoadError::UnknownLabel(name.clone())),
            other => Err(err(format!("expected label, found {other:?}"))),
        }
    };

    let expect = |n: usize| -> LoadResult<()> {
        if operands.len() == n {
            Ok(())
        } else {
            Err(err(format!(
                "{mnemonic} takes {n} operand(s), found {}",
                operands.len()
            )))
        }
    };

    let inst = match mnemonic.as_str() {
        "INT" => {
            expect(2)?;
            let value = match &operands[1] {
                Operand::Int(n) => *n,
                other => return Err(err(format!("expected integer, found {other:?}"))),
            };
            Instruction::Int(reg(&operands[0])?, value)
        }
        "FLO" => {
            expect(2)?;
            let value = match &operands[1] {
                Operand::Float(x) => *x,
                Operand::Int(n) => *n as f64,
                other => return Err(err(format!("expected float, found {other:?}"))),
            };
            Instruction::Flo(reg(&operands[0])?, value)
        }
        "STR" => {
            expect(2)?;
            let bytes = match &operands[1] {
                Operand::Str(bytes) => bytes.clone(),
                other => return Err(err(format!("expected string literal, found {other:?}"))),
            };
            Instruction::Str(reg(&operands[0])?, bytes)
        }
        "ATOM" => {
            expect(2)?;
            let name = match &operands[1] {
                Operand::Ident(name) => name.clone(),
                other => return Err(err(format!("expected atom name, found {other:?}"))),
            };
            Instruction::Atom(reg(&operands[0])?, name)
        }
        "MOVE" => {
            expect(2)?;
            Instruction::Move(reg(&operands[0])?, reg(&operands[1])?)
        }
        "STORE" => {
            expect(2)?;
            Instruction::Store(reg(&operands[0])?, uint(&operands[1])?)
        }
        "LOAD" => {
            expect(2)?;
            Instruction::Load(reg(&operands[0])?, uint(&operands[1])?)
        }
        "ADD" | "SUB" | "MUL" | "DIV" | "MOD" => {
            expect(3)?;
            let d = reg(&operands[0])?;
            let a = reg(&operands[1])?;
            let b = reg(&operands[2])?;
            match mnemonic.as_str() {
                "ADD" => Instruction::Add(d, a, b),
                "SUB" => Instruction::Sub(d, a, b),
                "MUL" => Instruction::Mul(d, a, b),
                "DIV" => Instruction::Div(d, a, b),
                _ => Instruction::Mod(d, a, b),
            }
        }
        "EQ" | "NE" | "GT" | "LT" | "GTE" | "LTE" => {
            expect(2)?;
            let a = reg(&operands[0])?;
            let b = reg(&operands[1])?;
            match mnemonic.as_str() {
                "EQ" => Instruction::Eq(a, b),
                "NE" => Instruction::Ne(a, b),
                "GT" => Instruction::Gt(a, b),
                "LT" => Instruction::Lt(a, b),
                "GTE" => Instruction::Gte(a, b),
                _ => Instruction::Lte(a, b),
            }
        }
        "JUMP" => {
            expect(1)?;
            Instruction::Jump(target(&operands[0])?)
        }
        "JUMPIF" => {
            expect(1)?;
            Instruction::JumpIf(target(&operands[0])?)
        }
        "PUSH" => {
            expect(1)?;
            Instruction::Push(reg(&operands[0])?)
        }
        "POP" => {
            expect(1)?;
            Instruction::Pop(reg(&operands[0])?)
        }
        "TUP" => {
            expect(2)?;
            Instruction::Tup(reg(&operands[0])?, uint(&operands[1])?)
        }
        "LIST" => {
            expect(2)?;
            Instruction::List(reg(&operands[0])?, uint(&operands[1])?)
        }
        "MAP" => {
            expect(1)?;
            Instruction::Map(reg(&operands[0])?)
        }
        "SIZE" => {
            expect(2)?;
            Instruction::Size(reg(&operands[0])?, reg(&operands[1])?)
        }
        "SET_C" => {
            expect(3)?;
            Instruction::SetC(reg(&operands[0])?, reg(&operands[1])?, reg(&operands[2])?)
        }
        "MOV_C" => {
            expect(3)?;
            Instruction::MovC(reg(&operands[0])?, reg(&operands[1])?, reg(&operands[2])?)
        }
        "SPAWN" => {
            expect(2)?;
            Instruction::Spawn(reg(&operands[0])?, target(&operands[1])?)
        }
        "SEND" => {
            expect(2)?;
            Instruction::Send(reg(&operands[0])?, reg(&operands[1])?)
        }
        "RECV" => {
            expect(0)?;
            Instruction::Recv
        }
        "HLT" => {
            expect(0)?;
            Instruction::Hlt
        }
        other => {
            return Err(LoadError::Parse {
                line,
                message: format!("unknown mnemonic `{other}`"),
            })
        }
    };
    Ok(inst)
}

fn parse_operands(text: &str, line: usize) -> LoadResult<Vec<Operand>> {
    let mut operands = Vec::new();
    for piece in split_operands(text) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        operands.push(parse_operand(piece, line)?);
    }
    Ok(operands)
}

/// Split on commas outside string literals
fn split_operands(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        match ch {
            '\\' if in_string && !escaped => {
                escaped = true;
                current.push(ch);
            }
            '"' if !escaped => {
                in_string = !in_string;
                current.push(ch);
            }
            ',' if !in_string => {
                pieces.push(std::mem::take(&mut current));
            }
            _ => {
                escaped = false;
                current.push(ch);
            }
        }
    }
    if !current.trim().is_empty() {
        pieces.push(current);
    }
    pieces
}

fn parse_operand(text: &str, line: usize) -> LoadResult<Operand> {
    if let Some(reg) = Reg::parse(text) {
        return Ok(Operand::Reg(reg));
    }
    if text.starts_with('"') {
        return Ok(Operand::Str(parse_string_literal(text, line)?));
    }
    let numeric = text.starts_with(|c: char| c.is_ascii_digit())
        || (text.len() > 1 && (text.starts_with('-') || text.starts_with('+')));
    if numeric {
        if text.contains('.') || text.contains('e') || text.contains('E') {
            return text
                .parse::<f64>()
                .map(Operand::Float)
                .map_err(|_| LoadError::Parse {
                    line,
                    message: format!("invalid float literal `{text}`"),
                });
        }
        return text
            .parse::<i64>()
            .map(Operand::Int)
            .map_err(|_| LoadError::Parse {
                line,
                message: format!("invalid integer literal `{text}`"),
            });
    }
    if is_identifier(text) {
        return Ok(Operand::Ident(text.to_string()));
    }
    Err(LoadError::Parse {
        line,
        message: format!("unrecognized operand `{text}`"),
    })
}

fn parse_string_literal(text: &str, line: usize) -> LoadResult<Vec<u8>> {
    let err = |message: &str| LoadError::Parse {
        line,
        message: message.to_string(),
    };
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| err("unterminated string literal"))?;
    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('r') => bytes.push(b'\r'),
            Some('0') => bytes.push(0),
            Some('\\') => bytes.push(b'\\'),
            Some('"') => bytes.push(b'"'),
            other => {
                return Err(err(&format!("invalid escape `\\{}`", other.unwrap_or(' '))))
            }
        }
    }
    Ok(bytes)
}
