//! Shared fixtures for integration tests.

#![allow(dead_code)]

use ctorspec::{
    CallContext, ClassEntry, DataType, FunctionImpl, NativeFn, QualifiedName, RuntimeError,
    Signature, Unit, Value, builtins,
};

pub const MODULE: &str = "<module>";

pub fn name(class: &str) -> QualifiedName {
    QualifiedName::in_module(MODULE, class)
}

pub fn class_type(class: &str) -> DataType {
    DataType::simple(name(class).to_type_hash())
}

pub fn int() -> DataType {
    DataType::simple(builtins::INT)
}

pub fn int64() -> DataType {
    DataType::simple(builtins::INT64)
}

pub fn str_type() -> DataType {
    DataType::simple(builtins::STR)
}

/// `__init__` body storing each declared parameter into the field of the
/// same name, in declaration order.
pub fn storing_init(params: &[&str]) -> FunctionImpl {
    let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    FunctionImpl::Native(NativeFn::new(move |ctx: &mut CallContext<'_>| {
        let receiver = ctx.receiver();
        for (index, param) in params.iter().enumerate() {
            let value = ctx.arg(index)?.clone();
            ctx.set_attr(&receiver, param, value)?;
        }
        let extra = (ctx.rest().len() + ctx.keywords().len()) as i64;
        if extra > 0 {
            ctx.set_attr(&receiver, "extra", Value::Int(extra))?;
        }
        Ok(Value::None)
    }))
}

/// `__new__` body allocating an instance of `cls`.
pub fn allocating_new() -> FunctionImpl {
    FunctionImpl::Native(NativeFn::new(|ctx| {
        let class = ctx
            .receiver()
            .as_class()
            .ok_or_else(|| RuntimeError::raised("cls is not a class"))?;
        Ok(ctx.allocate(class))
    }))
}

/// A body returning a fixed value.
pub fn returning(value: Value) -> FunctionImpl {
    FunctionImpl::Native(NativeFn::new(move |_| Ok(value.clone())))
}

/// A body that always raises.
pub fn raising(message: &'static str) -> FunctionImpl {
    FunctionImpl::Native(NativeFn::new(move |_| Err(RuntimeError::raised(message))))
}

pub fn unit_with(classes: Vec<ClassEntry>) -> Unit {
    let mut unit = Unit::new();
    for class in classes {
        unit.add_class(class).expect("class registers");
    }
    unit
}

pub fn compiled(module: &str, class: &str) -> ClassEntry {
    ClassEntry::compiled(module, class)
}

pub fn varargs() -> Signature {
    Signature::default().with_varargs()
}

/// Comparable shape of a runtime value: primitives as-is, objects as class
/// plus fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Value(Value),
    Object {
        class: ctorspec::TypeHash,
        fields: Vec<(String, Value)>,
    },
}

pub fn observe(unit: &Unit, value: &Value) -> Observed {
    match unit.object(value) {
        Some(object) => Observed::Object {
            class: object.class,
            fields: object.fields().to_vec(),
        },
        None => Observed::Value(value.clone()),
    }
}

pub fn field(unit: &Unit, value: &Value, field: &str) -> Option<Value> {
    unit.object(value)?.get(field).cloned()
}
