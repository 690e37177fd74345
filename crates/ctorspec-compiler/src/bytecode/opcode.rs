//! Bytecode operation codes.
//!
//! Each opcode is a single byte, with 16-bit operands following inline
//! (big-endian).

/// Constructor-sequence instruction set.
///
/// The VM is a stack machine. On entry the stack holds the call-site argument
/// values (positional, then keyword, in source order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Arguments
    // =========================================================================
    /// Pop the call-site arguments into temporaries `0..count`, preserving
    /// source order. Each argument is evaluated exactly once.
    /// Operand: u16 count
    SpillArgs = 0,
    /// Push a spilled argument.
    /// Operand: u16 temp index
    LoadTemp,
    /// Push the default value of a parameter.
    /// Operands: u16 function constant, u16 parameter index
    LoadDefault,

    // =========================================================================
    // Stack
    // =========================================================================
    /// Push a class token.
    /// Operand: u16 class constant
    LoadClass,
    /// Duplicate top of stack.
    Dup,
    /// Pop top of stack.
    Pop,

    // =========================================================================
    // Construction
    // =========================================================================
    /// Allocate a bare instance of a class (token-only, no arguments) with
    /// its declared fields laid out.
    /// Operands: u16 class constant, u16 field names constant
    Alloc,
    /// Statically bound call. Pops receiver, one value per declared
    /// parameter, extra positionals and extra keyword values; pushes the result.
    /// Operands: u16 function constant, u16 param count, u16 extra positional
    /// count, u16 extra keyword names constant
    InvokeFunction,
    /// Look up a method on the receiver's runtime class and call it with
    /// generic binding. Pushes the result.
    /// Operands: u16 method name constant, u16 positional count, u16 keyword
    /// names constant
    CallMethod,
    /// Fully dynamic call of the value below the arguments.
    /// Operands: u16 positional count, u16 keyword names constant
    CallFunction,

    // =========================================================================
    // Checks
    // =========================================================================
    /// If the top of stack is not an instance of the class, jump forward.
    /// Does not pop.
    /// Operands: u16 class constant, u16 forward distance
    GuardInstance,
    /// Fail with a type error unless the top of stack is an instance of the
    /// class. Does not pop.
    /// Operand: u16 class constant
    CheckType,
    /// If the runtime class of the top of stack is not exactly the class
    /// (a subclass does not match), jump forward. Does not pop.
    /// Operands: u16 class constant, u16 forward distance
    GuardExact,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Unconditional forward jump.
    /// Operand: u16 forward distance
    Jump,
}

impl OpCode {
    const ALL: [OpCode; 14] = [
        OpCode::SpillArgs,
        OpCode::LoadTemp,
        OpCode::LoadDefault,
        OpCode::LoadClass,
        OpCode::Dup,
        OpCode::Pop,
        OpCode::Alloc,
        OpCode::InvokeFunction,
        OpCode::CallMethod,
        OpCode::CallFunction,
        OpCode::GuardInstance,
        OpCode::CheckType,
        OpCode::GuardExact,
        OpCode::Jump,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Size of the operands in bytes, not counting the opcode itself.
    pub fn operand_size(&self) -> usize {
        match self {
            OpCode::Dup | OpCode::Pop => 0,
            OpCode::SpillArgs
            | OpCode::LoadTemp
            | OpCode::LoadClass
            | OpCode::CheckType
            | OpCode::Jump => 2,
            OpCode::LoadDefault
            | OpCode::Alloc
            | OpCode::CallFunction
            | OpCode::GuardInstance
            | OpCode::GuardExact => 4,
            OpCode::CallMethod => 6,
            OpCode::InvokeFunction => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OpCode::SpillArgs => "SPILL_ARGS",
            OpCode::LoadTemp => "LOAD_TEMP",
            OpCode::LoadDefault => "LOAD_DEFAULT",
            OpCode::LoadClass => "LOAD_CLASS",
            OpCode::Dup => "DUP",
            OpCode::Pop => "POP",
            OpCode::Alloc => "TP_ALLOC",
            OpCode::InvokeFunction => "INVOKE_FUNCTION",
            OpCode::CallMethod => "CALL_METHOD",
            OpCode::CallFunction => "CALL_FUNCTION",
            OpCode::GuardInstance => "GUARD_INSTANCE",
            OpCode::CheckType => "CHECK_TYPE",
            OpCode::GuardExact => "GUARD_EXACT",
            OpCode::Jump => "JUMP_FORWARD",
        }
    }
}
