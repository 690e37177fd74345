//! Call context bridging the VM and native function bodies.

use crate::{RuntimeError, TypeHash};

use super::{ObjectHeap, Value};

/// What a native body sees when it is called.
///
/// Arguments arrive already bound to the declared parameters: `args` holds one
/// value per declared parameter (defaults filled in), `rest` the extra
/// positional arguments accepted by `*args`, and `keywords` the extra keyword
/// arguments accepted by `**kwargs`.
///
/// ```ignore
/// let init = NativeFn::new(|ctx| {
///     let a = ctx.arg(0)?.clone();
///     ctx.set_attr(&ctx.receiver(), "value", a)?;
///     Ok(Value::None)
/// });
/// ```
pub struct CallContext<'vm> {
    callee: &'vm str,
    receiver: Value,
    args: &'vm [Value],
    rest: &'vm [Value],
    keywords: &'vm [(String, Value)],
    heap: &'vm mut ObjectHeap,
}

impl<'vm> CallContext<'vm> {
    pub fn new(
        callee: &'vm str,
        receiver: Value,
        args: &'vm [Value],
        rest: &'vm [Value],
        keywords: &'vm [(String, Value)],
        heap: &'vm mut ObjectHeap,
    ) -> Self {
        Self {
            callee,
            receiver,
            args,
            rest,
            keywords,
            heap,
        }
    }

    /// The implicit first argument (`cls` or `self`).
    pub fn receiver(&self) -> Value {
        self.receiver.clone()
    }

    pub fn arg(&self, index: usize) -> Result<&Value, RuntimeError> {
        self.args
            .get(index)
            .ok_or_else(|| RuntimeError::MissingArgument {
                callee: self.callee.to_string(),
                param: format!("#{index}"),
            })
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    pub fn rest(&self) -> &[Value] {
        self.rest
    }

    pub fn keywords(&self) -> &[(String, Value)] {
        self.keywords
    }

    pub fn heap(&self) -> &ObjectHeap {
        self.heap
    }

    /// Allocate a bare instance of `class` (the builtin `object.__new__`).
    pub fn allocate(&mut self, class: TypeHash) -> Value {
        Value::Object(self.heap.allocate(class))
    }

    pub fn set_attr(
        &mut self,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let handle = target.as_object().ok_or_else(|| RuntimeError::NoAttribute {
            type_name: format!("{target:?}"),
            attr: name.to_string(),
        })?;
        self.heap.get_mut(handle)?.set(name, value);
        Ok(())
    }

    pub fn get_attr(&self, target: &Value, name: &str) -> Result<Value, RuntimeError> {
        let missing = || RuntimeError::NoAttribute {
            type_name: format!("{target:?}"),
            attr: name.to_string(),
        };
        let handle = target.as_object().ok_or_else(missing)?;
        self.heap.get(handle)?.get(name).cloned().ok_or_else(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::NativeFn;

    #[test]
    fn native_body_sets_field_on_receiver() {
        let mut heap = ObjectHeap::new();
        let class = TypeHash::from_name("<module>.C");
        let obj = Value::Object(heap.allocate(class));
        let args = [Value::Int(42)];

        let init = NativeFn::new(|ctx| {
            let a = ctx.arg(0)?.clone();
            let receiver = ctx.receiver();
            ctx.set_attr(&receiver, "value", a)?;
            Ok(Value::None)
        });

        let mut ctx = CallContext::new(
            "<module>.C.__init__",
            obj.clone(),
            &args,
            &[],
            &[],
            &mut heap,
        );
        assert_eq!(init.call(&mut ctx), Ok(Value::None));
        assert_eq!(ctx.get_attr(&obj, "value"), Ok(Value::Int(42)));
    }

    #[test]
    fn missing_argument_reports_callee() {
        let mut heap = ObjectHeap::new();
        let ctx = CallContext::new("f", Value::None, &[], &[], &[], &mut heap);
        assert!(matches!(
            ctx.arg(0),
            Err(RuntimeError::MissingArgument { callee, .. }) if callee == "f"
        ));
    }

    #[test]
    fn attributes_require_objects() {
        let mut heap = ObjectHeap::new();
        let mut ctx = CallContext::new("f", Value::None, &[], &[], &[], &mut heap);
        assert!(ctx.set_attr(&Value::Int(1), "x", Value::None).is_err());
        let obj = ctx.allocate(TypeHash(5));
        assert!(ctx.get_attr(&obj, "x").is_err());
    }
}
