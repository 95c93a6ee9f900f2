pub mod assemble;
pub mod encode;
pub mod payload;

pub use assemble::assemble_payload;
pub use encode::serialize;
pub use payload::{MessagePayload, MsgOp, Shape};
