//! Runtime values and native call support.
//!
//! The compiler never executes code; these types exist so the reference VM
//! and native function bodies share one representation.
//!
//! ## Key Types
//!
//! - [`Value`]: a runtime value (primitives, objects, class tokens)
//! - [`ObjectHeap`]: arena of instances, addressed by [`ObjectHandle`]
//! - [`NativeFn`]: type-erased function body
//! - [`CallContext`]: what a native body sees when called

mod call_context;
mod native_fn;
mod object_heap;
mod value;

pub use call_context::CallContext;
pub use native_fn::NativeFn;
pub use object_heap::{ObjectHandle, ObjectHeap, ScriptObject};
pub use value::Value;
