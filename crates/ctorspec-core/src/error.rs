//! Error types.
//!
//! ```text
//! RegistrationError  - building the symbol table (class/function definitions)
//! CompilationError   - constructor-call checking, attached to the call span
//! RuntimeError       - raised by the reference VM while executing emitted code
//! ```
//!
//! Compilation errors are fatal for the enclosing call expression only; a unit
//! keeps compiling its remaining call sites after one fails.

use std::fmt;

use thiserror::Error;

use crate::Span;

// ============================================================================
// Compilation Errors
// ============================================================================

/// How an argument was passed at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Positional,
    Keyword,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Positional => write!(f, "positional"),
            ArgKind::Keyword => write!(f, "keyword"),
        }
    }
}

/// Static diagnostics for a constructor-call expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    /// The callee does not name a class reachable from the unit.
    #[error("at {span}: unresolved symbol '{name}'")]
    UnresolvedSymbol { name: String, span: Span },

    /// Wrong number of arguments. Both counts include the implicit receiver.
    #[error(
        "at {span}: Mismatched number of args for function {callee}. Expected {expected}, got {actual}"
    )]
    ArityMismatch {
        expected: usize,
        actual: usize,
        callee: String,
        span: Span,
    },

    /// Arguments supplied to a class whose allocation and initialization are
    /// both the builtin defaults.
    #[error("at {span}: {class}() takes no arguments")]
    NoArguments { class: String, span: Span },

    /// A bound argument is not assignable to its parameter.
    #[error(
        "at {span}: type mismatch: {actual} received for {kind} arg '{param}', expected {expected}"
    )]
    TypeMismatch {
        param: String,
        kind: ArgKind,
        expected: String,
        actual: String,
        span: Span,
    },

    /// The constructed value does not fit the call site's expected type.
    #[error("at {span}: return type must be {expected}, not {actual}")]
    ReturnTypeMismatch {
        expected: String,
        actual: String,
        span: Span,
    },
}

impl CompilationError {
    pub fn span(&self) -> Span {
        match self {
            CompilationError::UnresolvedSymbol { span, .. } => *span,
            CompilationError::ArityMismatch { span, .. } => *span,
            CompilationError::NoArguments { span, .. } => *span,
            CompilationError::TypeMismatch { span, .. } => *span,
            CompilationError::ReturnTypeMismatch { span, .. } => *span,
        }
    }

    /// Whether this is a wrong-argument-count failure (including "takes no
    /// arguments").
    pub fn is_arity_mismatch(&self) -> bool {
        matches!(
            self,
            CompilationError::ArityMismatch { .. } | CompilationError::NoArguments { .. }
        )
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while populating the symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("class '{name}' is already defined")]
    DuplicateType { name: String },

    #[error("function '{name}' is already defined")]
    DuplicateFunction { name: String },

    #[error("class '{name}' is not defined")]
    UnknownClass { name: String },

    #[error("base class of '{class}' is not defined: {base}")]
    UnknownBase { class: String, base: String },

    #[error("circular inheritance for '{name}'")]
    CircularInheritance { name: String },

    #[error("duplicate parameter '{param}' in {function}")]
    DuplicateParameter { function: String, param: String },

    #[error("parameter '{param}' without a default follows a defaulted parameter in {function}")]
    DefaultBeforeRequired { function: String, param: String },

    #[error("class '{name}' is frozen and cannot be redefined")]
    FrozenClass { name: String },
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised by the reference VM.
///
/// None of these originate from the specialization decision itself; the
/// generic path raises them the same way the dynamic object model would.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A function body raised.
    #[error("{message}")]
    Raised { message: String },

    #[error("{class}() takes no arguments")]
    TakesNoArguments { class: String },

    #[error("{callee}() missing required argument '{param}'")]
    MissingArgument { callee: String, param: String },

    #[error("{callee}() takes {expected} positional arguments but {got} were given")]
    TooManyArguments {
        callee: String,
        expected: usize,
        got: usize,
    },

    #[error("{callee}() got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { callee: String, name: String },

    #[error("{callee}() got multiple values for argument '{name}'")]
    DuplicateArgument { callee: String, name: String },

    #[error("'{type_name}' object has no attribute '{attr}'")]
    NoAttribute { type_name: String, attr: String },

    #[error("'{type_name}' object is not callable")]
    NotCallable { type_name: String },

    #[error("expected {expected}, got {actual}")]
    TypeCheck { expected: String, actual: String },

    #[error("function {callee} has no body")]
    NoImplementation { callee: String },

    #[error("unknown class or function {0}")]
    UnknownSymbol(crate::TypeHash),

    #[error("invalid object handle")]
    InvalidHandle,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("malformed bytecode at offset {offset}")]
    InvalidBytecode { offset: usize },
}

impl RuntimeError {
    /// Convenience constructor for an error raised by a function body.
    pub fn raised(message: impl Into<String>) -> Self {
        RuntimeError::Raised {
            message: message.into(),
        }
    }
}
