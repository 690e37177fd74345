//! Bytecode chunk for one constructor-call expression.
//!
//! A chunk is the lowered form of a single [`SpecializationPlan`]: a flat byte
//! sequence of opcodes with inline big-endian `u16` operands. Source lines are
//! kept as a run-length table, since a whole constructor sequence usually maps
//! to one or two lines.
//!
//! [`SpecializationPlan`]: crate::planner::SpecializationPlan

use std::fmt;

use super::{OpCode, u16_operand};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BytecodeChunk {
    code: Vec<u8>,
    /// `(first_offset, line)` runs, ordered by offset.
    lines: Vec<(usize, u32)>,
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub offset: usize,
    pub op: OpCode,
    operands: &'a [u8],
}

impl Instruction<'_> {
    /// The `index`-th 16-bit operand.
    pub fn operand(&self, index: usize) -> Option<u16> {
        let bytes = self.operands.get(index * 2..index * 2 + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len() / 2
    }

    /// Offset of the next instruction.
    pub fn end(&self) -> usize {
        self.offset + 1 + self.operands.len()
    }
}

impl BytecodeChunk {
    pub fn new() -> Self {
        Self::default()
    }

    fn mark_line(&mut self, line: u32) {
        if self.lines.last().map(|&(_, last)| last) != Some(line) {
            self.lines.push((self.code.len(), line));
        }
    }

    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op as u8, line);
    }

    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.mark_line(line);
        self.code.push(byte);
    }

    pub fn write_u16(&mut self, value: u16, line: u32) {
        self.mark_line(line);
        self.code.extend_from_slice(&value.to_be_bytes());
    }

    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Reserve a forward distance operand; returns where to patch it.
    pub fn write_jump_placeholder(&mut self, line: u32) -> usize {
        let offset = self.code.len();
        self.write_u16(u16::MAX, line);
        offset
    }

    /// Point the distance at `offset` to the end of the chunk. The distance is
    /// counted from the byte after the operand.
    ///
    /// # Panics
    ///
    /// Panics if the distance does not fit in a `u16`.
    pub fn patch_jump(&mut self, offset: usize) {
        let distance = u16_operand(self.code.len() - (offset + 2), "forward distance");
        self.code[offset..offset + 2].copy_from_slice(&distance.to_be_bytes());
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Source line of the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        if offset >= self.code.len() {
            return None;
        }
        let run = self.lines.partition_point(|&(start, _)| start <= offset);
        self.lines.get(run.checked_sub(1)?).map(|&(_, line)| line)
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.read_byte(offset).and_then(OpCode::from_u8)
    }

    /// Decode the instruction starting at `offset`. `None` for an unknown
    /// opcode or truncated operands.
    pub fn instruction_at(&self, offset: usize) -> Option<Instruction<'_>> {
        let op = self.read_op(offset)?;
        let start = offset + 1;
        let operands = self.code.get(start..start + op.operand_size())?;
        Some(Instruction {
            offset,
            op,
            operands,
        })
    }

    /// Decoded instructions in order, stopping at the first malformed one.
    pub fn instructions(&self) -> impl Iterator<Item = Instruction<'_>> + '_ {
        let mut next = Some(0);
        std::iter::from_fn(move || {
            let offset = next.filter(|&offset| offset < self.code.len())?;
            let instruction = self.instruction_at(offset);
            next = instruction.map(|i| i.end());
            instruction
        })
    }

    pub fn opcodes(&self) -> Vec<OpCode> {
        self.instructions().map(|i| i.op).collect()
    }

    pub fn contains_op(&self, op: OpCode) -> bool {
        self.instructions().any(|i| i.op == op)
    }

    /// Assert the chunk's opcodes are exactly `expected`.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(actual, expected, "opcode sequence differs\n{self}");
    }

    /// Assert `expected` occurs as a subsequence of the chunk's opcodes.
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let mut actual = self.instructions().map(|i| i.op);
        let missing: Vec<_> = expected
            .iter()
            .skip_while(|op| actual.any(|found| found == **op))
            .map(|op| op.name())
            .collect();
        assert!(
            missing.is_empty(),
            "opcodes not found in order: {missing:?}\n{self}"
        );
    }
}

impl fmt::Display for BytecodeChunk {
    /// One instruction per line: offset, mnemonic, operands.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut end = 0;
        for instruction in self.instructions() {
            write!(f, "{:04} {}", instruction.offset, instruction.op.name())?;
            for index in 0..instruction.operand_count() {
                if let Some(value) = instruction.operand(index) {
                    write!(f, " {value}")?;
                }
            }
            writeln!(f)?;
            end = instruction.end();
        }
        if end < self.code.len() {
            writeln!(f, "{end:04} <malformed>")?;
        }
        Ok(())
    }
}
