//! AVE Error Types
//!
//! Fault taxonomy for the Actor Virtual Engine. A `Fault` terminates the
//! faulting actor only, never the hosting runtime; `LoadError` rejects a
//! program before any actor runs; `PayloadError` is contained to the
//! `RECV` that tripped it and costs the receiver nothing but the message.

use thiserror::Error;

use crate::vm::value::ValueKind;

/// Runtime faults. Each one is terminal for the actor that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: ValueKind,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("map key not found")]
    KeyNotFound,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack overflow")]
    StackOverflow,

    #[error("composite heap exhausted")]
    OutOfMemory,

    #[error("ordering comparison on unorderable kind {0}")]
    Unorderable(ValueKind),

    #[error("composite nesting exceeds depth limit")]
    NestingTooDeep,

    #[error("program counter {0} outside program")]
    InvalidJumpTarget(i64),

    #[error("receive timed out")]
    ReceiveTimeout,
}

/// Program load and decode failures. These fail the load, not a running
/// actor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("invalid program magic number")]
    InvalidMagicNumber,

    #[error("incompatible program version {0}")]
    InvalidVersion(u8),

    #[error("program is truncated")]
    TruncatedProgram,

    #[error("invalid opcode: 0x{0:02X}")]
    InvalidOpcode(u8),

    #[error("invalid register index {0}")]
    InvalidRegister(u8),

    #[error("unresolved label `{0}`")]
    UnknownLabel(String),

    #[error("jump target {target} outside program of length {len}")]
    JumpOutOfRange { target: usize, len: usize },

    #[error("malformed program")]
    MalformedProgram,

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Reasons a message payload is rejected as invalid.
///
/// The message is discarded and the receiving actor keeps running; hostile
/// payloads from another tenant must never kill the receiver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("opcode 0x{0:02X} not allowed in a message payload")]
    ForbiddenOpcode(u8),

    #[error("invalid payload register {0}")]
    BadRegister(u8),

    #[error("payload cell {0} out of range")]
    CellOutOfRange(u16),

    #[error("payload reads cell {0} before writing it")]
    EmptyCell(u16),

    #[error("payload is truncated")]
    Truncated,

    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u8),

    #[error("payload shape does not match assembled cells")]
    MalformedShape,

    #[error("atom name is not valid utf-8")]
    BadAtomName,

    #[error("payload exceeds sandbox limits")]
    SandboxExhausted,
}

pub type VmResult<T> = Result<T, Fault>;
pub type LoadResult<T> = Result<T, LoadError>;
