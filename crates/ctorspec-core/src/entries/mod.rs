//! Symbol-table entries.
//!
//! - [`ClassEntry`]: a class with its base, declared fields and methods
//! - [`FunctionEntry`]: a method definition (signature plus implementation)

mod class;
mod function;

pub use class::{ClassEntry, ClassFlags, ClassSource, FieldEntry};
pub use function::{FunctionDef, FunctionEntry, FunctionImpl};

/// Name of the allocation slot.
pub const NEW: &str = "__new__";

/// Name of the initialization slot.
pub const INIT: &str = "__init__";
