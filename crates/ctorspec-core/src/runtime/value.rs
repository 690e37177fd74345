use std::sync::Arc;

use crate::TypeHash;

use super::ObjectHandle;

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    /// An instance living in the VM's object heap.
    Object(ObjectHandle),
    /// A class token (the `cls` receiver of `__new__`).
    Class(TypeHash),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Value::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<TypeHash> {
        match self {
            Value::Class(hash) => Some(*hash),
            _ => None,
        }
    }

    /// Builtin truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Str(s) => !s.is_empty(),
            Value::Object(_) | Value::Class(_) => true,
        }
    }
}
