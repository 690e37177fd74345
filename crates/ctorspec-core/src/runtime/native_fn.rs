use std::fmt;
use std::sync::Arc;

use crate::RuntimeError;

use super::{CallContext, Value};

type NativeBody = dyn Fn(&mut CallContext<'_>) -> Result<Value, RuntimeError> + Send + Sync;

/// A type-erased native function body.
///
/// Cloning is cheap; all clones share the same closure.
#[derive(Clone)]
pub struct NativeFn(Arc<NativeBody>);

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<Value, RuntimeError> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFn(..)")
    }
}
