//! Symbol registry for constructor-call compilation.
//!
//! [`SymbolRegistry`] is the in-workspace implementation of the collaborator
//! traits in [`ctorspec_core::oracle`]: class storage, the inheritance graph
//! behind `is_assignable`, and the write-once freeze set.

mod builtins;
mod hierarchy;
mod registry;

pub use builtins::builtin_classes;
pub use hierarchy::InheritanceGraph;
pub use registry::SymbolRegistry;
