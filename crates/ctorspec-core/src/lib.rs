//! Core types for constructor-call specialization.
//!
//! This crate holds everything the registry, the compiler and the reference VM
//! share:
//!
//! - [`TypeHash`] / [`QualifiedName`]: deterministic identity for classes and functions
//! - [`DataType`]: the static type of an expression or parameter
//! - [`Signature`] / [`Param`]: declared call signatures of `__new__` / `__init__`
//! - [`ClassEntry`] / [`FunctionEntry`]: symbol-table entries
//! - [`CompilationError`] / [`RegistrationError`] / [`RuntimeError`]
//! - [`oracle`]: the collaborator traits the compiler consumes
//! - [`runtime`]: values, object heap and native call context

mod data_type;
mod entries;
mod error;
pub mod oracle;
mod qualified_name;
pub mod runtime;
mod signature;
mod span;
mod type_hash;

pub use data_type::DataType;
pub use entries::{
    ClassEntry, ClassFlags, ClassSource, FieldEntry, FunctionDef, FunctionEntry, FunctionImpl,
    INIT, NEW,
};
pub use error::{ArgKind, CompilationError, RegistrationError, RuntimeError};
pub use oracle::{ClassTable, FreezeOracle, SymbolTable};
pub use qualified_name::QualifiedName;
pub use signature::{Param, Signature};
pub use span::Span;
pub use type_hash::{TypeHash, builtins, hash_constants};
