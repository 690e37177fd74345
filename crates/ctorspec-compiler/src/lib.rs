//! Constructor-call specialization compiler.
//!
//! Lowers `C(args...)` call expressions, where `C` statically names a class,
//! to the cheapest instruction sequence that is still observably equivalent
//! to the generic call protocol.
//!
//! ## Architecture
//!
//! ```text
//! CallSite ─► DescriptorResolver ─► check ─► reconcile ─► plan ─► ConstructorEmitter
//!              (cached per unit)                                     (BytecodeChunk)
//! ```
//!
//! ## Modules
//!
//! - [`bytecode`]: Bytecode types (OpCode, BytecodeChunk, ConstantPool)
//! - [`descriptor`]: Resolved `__new__` / `__init__` bindings per class
//! - [`checker`]: Argument binding and static type checks
//! - [`reconcile`]: Result type and whether `__init__` runs
//! - [`planner`]: Choice of specialization
//! - [`emit`]: Lowering of plans to bytecode
//! - [`pipeline`]: One call site, end to end

pub mod bytecode;
pub mod call_site;
pub mod checker;
pub mod descriptor;
pub mod emit;
pub mod options;
pub mod pipeline;
pub mod planner;
pub mod reconcile;

pub use call_site::CallSite;
pub use checker::{ArgSource, Binding, BoundArguments, SlotArguments, check};
pub use descriptor::{ClassDescriptor, DescriptorResolver, SlotBinding, UserSlot};
pub use emit::ConstructorEmitter;
pub use options::{CompilerOptions, CompilerProperty};
pub use pipeline::{CallSiteCompiler, CompiledCall};
pub use planner::{ArgLayout, Dispatch, Operand, SlotCall, SpecializationPlan, plan};
pub use reconcile::{InitDisposition, ResultShape, init_disposition, reconcile};

// Re-export CompilationError from core for convenience
pub use ctorspec_core::CompilationError;

pub type Result<T> = std::result::Result<T, CompilationError>;
