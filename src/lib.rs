//! # ctorspec
//!
//! Constructor-call specialization for an ahead-of-time compiler of a dynamic
//! object-oriented language.
//!
//! For every expression `C(args...)` that statically names a class, the
//! compiler decides whether the `__new__` / `__init__` sequence can be
//! resolved and lowered to direct calls, or must fall back to the generic
//! call protocol. Specialized sequences behave identically to the generic
//! path; the [`vm`] module runs both so this can be checked.
//!
//! ## Quick Start
//!
//! ```
//! use ctorspec::{CallSite, ClassEntry, DataType, FunctionImpl, Param, Signature, Unit, builtins};
//!
//! let mut unit = Unit::new();
//! unit.add_class(ClassEntry::compiled("<module>", "C").with_init(
//!     Signature::new(vec![Param::new("a", DataType::simple(builtins::INT))]),
//!     FunctionImpl::Declared,
//! ))
//! .unwrap();
//!
//! let site = unit.add_call_site(
//!     CallSite::new(ctorspec::QualifiedName::in_module("<module>", "C"))
//!         .arg(DataType::simple(builtins::INT)),
//! );
//! unit.build().unwrap();
//! assert_eq!(unit.plan(site).unwrap().name(), "AllocateAndInit");
//! ```
//!
//! ## Crates
//!
//! - `ctorspec-core`: identities, types, signatures, entries, errors, runtime values
//! - `ctorspec-registry`: the symbol registry with builtins and freeze state
//! - `ctorspec-compiler`: resolver, checker, reconciler, planner, emitter

mod unit;
pub mod vm;

pub use unit::{BuildError, SiteError, Unit, UnitError};

pub use ctorspec_compiler::bytecode::{BytecodeChunk, ConstantPool, OpCode};
pub use ctorspec_compiler::{
    CallSite, CallSiteCompiler, ClassDescriptor, CompiledCall, CompilerOptions, CompilerProperty,
    Dispatch, InitDisposition, SlotBinding, SpecializationPlan,
};
pub use ctorspec_core::runtime::{
    CallContext, NativeFn, ObjectHandle, ObjectHeap, ScriptObject, Value,
};
pub use ctorspec_core::{
    ArgKind, ClassEntry, ClassFlags, ClassSource, ClassTable, CompilationError, DataType,
    FreezeOracle, FunctionDef, FunctionEntry, FunctionImpl, Param, QualifiedName, RegistrationError,
    RuntimeError, Signature, Span, SymbolTable, TypeHash, builtins,
};
pub use ctorspec_registry::SymbolRegistry;
