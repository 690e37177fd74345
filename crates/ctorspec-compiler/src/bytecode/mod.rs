//! Bytecode for constructor-call sequences.
//!
//! - [`OpCode`] - the instruction set the emitter targets
//! - [`BytecodeChunk`] - the encoded sequence for one call site
//! - [`Constant`] and [`ConstantPool`] - unit-level constant storage

mod chunk;
mod constant;
mod opcode;

pub use chunk::BytecodeChunk;
pub use constant::{Constant, ConstantPool};
pub use opcode::OpCode;

/// Narrow a count or index to a 16-bit operand.
///
/// # Panics
///
/// Panics if `value` does not fit in 16 bits.
pub(crate) fn u16_operand(value: usize, what: &str) -> u16 {
    u16::try_from(value).unwrap_or_else(|_| panic!("{what} {value} exceeds {}", u16::MAX))
}
