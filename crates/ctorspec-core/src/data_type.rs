//! DataType - the static type of a value.
//!
//! The surrounding type-inference engine resolves every argument expression to
//! a `DataType` before a constructor call reaches this subsystem. Only nominal
//! class identity matters here; assignability between two types is answered by
//! the [`ClassTable`](crate::ClassTable) collaborator.

use crate::{TypeHash, builtins};

/// A static type, identified by the hash of its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataType {
    pub type_hash: TypeHash,
}

impl DataType {
    #[inline]
    pub const fn simple(type_hash: TypeHash) -> Self {
        Self { type_hash }
    }

    /// The statically unknown type.
    #[inline]
    pub const fn dynamic() -> Self {
        Self::simple(builtins::DYNAMIC)
    }

    #[inline]
    pub const fn none() -> Self {
        Self::simple(builtins::NONE)
    }

    #[inline]
    pub const fn object() -> Self {
        Self::simple(builtins::OBJECT)
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.type_hash == builtins::DYNAMIC
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.type_hash == builtins::NONE
    }
}

impl From<TypeHash> for DataType {
    fn from(type_hash: TypeHash) -> Self {
        Self::simple(type_hash)
    }
}
