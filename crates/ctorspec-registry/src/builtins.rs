//! The builtin namespace every registry starts with.
//!
//! `object` carries the default allocation and initialization slots. The
//! scalar types (`int`, `int64`, `str`, `bool`) define a typed converting
//! `__new__` and inherit `__init__` from `object`. `type` is a class factory,
//! so the compiler never looks inside it.

use ctorspec_core::runtime::{NativeFn, Value};
use ctorspec_core::{
    ClassEntry, ClassFlags, DataType, FunctionDef, FunctionEntry, FunctionImpl, NEW, Param,
    RuntimeError, Signature, TypeHash, builtins,
};

/// All builtin classes, bases before subclasses.
pub fn builtin_classes() -> Vec<ClassEntry> {
    vec![
        object(),
        class_factory(),
        converter("int", builtins::INT, Value::Int(0), to_int),
        converter("int64", builtins::INT64, Value::Int(0), to_int),
        converter("str", builtins::STR, Value::str(""), to_str),
        converter("bool", builtins::BOOL, Value::Bool(false), |v| {
            Ok(Value::Bool(v.truthy()))
        })
        .with_base(builtins::INT),
        ClassEntry::builtin("None"),
        ClassEntry::builtin("dynamic"),
    ]
}

fn variadic() -> Signature {
    Signature::default().with_varargs().with_kwargs()
}

fn object() -> ClassEntry {
    // Extra-argument rejection depends on which slots the constructed class
    // overrides, so the VM enforces it; the bodies accept anything.
    ClassEntry::builtin("object")
        .with_new(
            variadic(),
            DataType::object(),
            FunctionImpl::Native(NativeFn::new(|ctx| {
                let class = ctx
                    .receiver()
                    .as_class()
                    .ok_or_else(|| RuntimeError::raised("object.__new__(X): X is not a class"))?;
                Ok(ctx.allocate(class))
            })),
        )
        .with_init(
            variadic(),
            FunctionImpl::Native(NativeFn::new(|_| Ok(Value::None))),
        )
}

fn class_factory() -> ClassEntry {
    ClassEntry::builtin("type")
        .with_flags(ClassFlags::CLASS_FACTORY)
        .with_new(
            Signature::default().with_varargs(),
            DataType::simple(builtins::TYPE),
            FunctionImpl::Native(NativeFn::new(|ctx| {
                let class = ctx
                    .receiver()
                    .as_class()
                    .ok_or_else(|| RuntimeError::raised("type.__new__(X): X is not a class"))?;
                Ok(ctx.allocate(class))
            })),
        )
}

fn converter(
    name: &str,
    hash: TypeHash,
    default: Value,
    convert: fn(&Value) -> Result<Value, RuntimeError>,
) -> ClassEntry {
    let class = ClassEntry::builtin(name);
    let def = FunctionDef::method(
        &class.name,
        class.type_hash,
        NEW,
        Signature::new(vec![Param::with_default("x", DataType::dynamic())]),
        DataType::simple(hash),
    );
    let body = NativeFn::new(move |ctx| convert(ctx.arg(0)?));
    class.with_method(
        FunctionEntry::new(def, FunctionImpl::Native(body)).with_default("x", default),
    )
}

fn to_int(value: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            RuntimeError::raised(format!("invalid literal for int() with base 10: '{s}'"))
        }),
        other => Err(RuntimeError::raised(format!(
            "int() argument must be a string or a number, not {other:?}"
        ))),
    }
}

fn to_str(value: &Value) -> Result<Value, RuntimeError> {
    let text = match value {
        Value::None => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Str(s) => return Ok(Value::Str(s.clone())),
        Value::Object(handle) => format!("<object #{}>", handle.0),
        Value::Class(hash) => format!("<class {hash}>"),
    };
    Ok(Value::str(&text))
}
