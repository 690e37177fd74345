//! Collaborator interfaces consumed by the compiler.
//!
//! The symbol/type tables and the freeze oracle are owned by the surrounding
//! compiler; the constructor pipeline only ever reads them through these
//! traits.

use crate::{ClassEntry, DataType, FunctionEntry, QualifiedName, TypeHash};

/// Read access to the unit's class symbols and the type lattice.
pub trait ClassTable {
    /// Look up a class by name.
    fn lookup_class(&self, name: &QualifiedName) -> Option<&ClassEntry>;

    /// Look up a class by hash.
    fn get_class(&self, hash: TypeHash) -> Option<&ClassEntry>;

    /// Look up a method by its function hash.
    fn get_function(&self, hash: TypeHash) -> Option<&FunctionEntry>;

    /// Whether a value of type `from` may be used where `to` is expected.
    fn is_assignable(&self, from: DataType, to: DataType) -> bool;

    /// User-facing name of a type, as it appears in diagnostics.
    fn type_name(&self, ty: DataType) -> String;
}

/// Whether a class has been closed to further mutation.
///
/// The flag is write-once: once a class reports frozen it stays frozen for the
/// rest of the process.
pub trait FreezeOracle {
    fn is_frozen(&self, class: TypeHash) -> bool;
}

/// Everything the constructor pipeline needs from its environment.
pub trait SymbolTable: ClassTable + FreezeOracle {}

impl<T: ClassTable + FreezeOracle + ?Sized> SymbolTable for T {}
