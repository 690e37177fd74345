//! Function entries.

use crate::runtime::{NativeFn, Value};
use crate::{DataType, QualifiedName, Signature, TypeHash};

/// Declared shape of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionDef {
    /// Qualified name, used verbatim as the callee description in diagnostics.
    pub name: QualifiedName,
    pub func_hash: TypeHash,
    /// Class that defines the method.
    pub owner: TypeHash,
    pub signature: Signature,
    pub return_type: DataType,
}

impl FunctionDef {
    /// Define a method `member` on the class `owner_name`.
    pub fn method(
        owner_name: &QualifiedName,
        owner: TypeHash,
        member: &str,
        signature: Signature,
        return_type: DataType,
    ) -> Self {
        Self {
            name: owner_name.member(member),
            func_hash: TypeHash::from_method(owner, member),
            owner,
            signature,
            return_type,
        }
    }
}

/// How a function body is provided.
#[derive(Debug, Clone)]
pub enum FunctionImpl {
    /// A native body run by the VM.
    Native(NativeFn),
    /// Declaration only; calling it at run time fails.
    Declared,
}

/// Registry entry for a function.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub def: FunctionDef,
    pub implementation: FunctionImpl,
    /// Default values for parameters declared with `has_default`.
    pub defaults: Vec<(String, Value)>,
}

impl FunctionEntry {
    pub fn new(def: FunctionDef, implementation: FunctionImpl) -> Self {
        Self {
            def,
            implementation,
            defaults: Vec::new(),
        }
    }

    pub fn with_default(mut self, param: impl Into<String>, value: Value) -> Self {
        self.defaults.push((param.into(), value));
        self
    }

    pub fn default_for(&self, param: &str) -> Option<&Value> {
        self.defaults
            .iter()
            .find(|(name, _)| name == param)
            .map(|(_, value)| value)
    }

    pub fn native_fn(&self) -> Option<&NativeFn> {
        match &self.implementation {
            FunctionImpl::Native(f) => Some(f),
            FunctionImpl::Declared => None,
        }
    }
}

impl PartialEq for FunctionEntry {
    fn eq(&self, other: &Self) -> bool {
        // NativeFn has no equality; compare the declared shape only.
        self.def == other.def && self.defaults == other.defaults
    }
}
