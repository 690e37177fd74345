//! Deterministic hash-based identity for classes and functions.
//!
//! A [`TypeHash`] is computed from a qualified name, so a class or function can
//! be referred to before it is registered and the same name always maps to the
//! same identity. Function hashes mix the owning class with the member name so
//! `C.__init__` and `D.__init__` never collide.

use std::fmt;

use xxhash_rust::const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
pub mod hash_constants {
    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for method hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Separator between owner and member.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;
}

/// A deterministic 64-bit identity of a class or function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash a qualified type name.
    ///
    /// ```
    /// use ctorspec_core::{TypeHash, builtins};
    ///
    /// assert_eq!(TypeHash::from_name("object"), builtins::OBJECT);
    /// assert_ne!(TypeHash::from_name("int"), TypeHash::from_name("int64"));
    /// ```
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        let hash = const_xxh64::xxh64(name.as_bytes(), 0);
        TypeHash(hash_constants::TYPE ^ hash)
    }

    /// Hash a method by owning class and member name.
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str) -> Self {
        let member = xxh64(name.as_bytes(), 0);
        TypeHash(
            hash_constants::METHOD
                ^ owner.0.wrapping_mul(hash_constants::SEP).rotate_left(17)
                ^ member,
        )
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Hashes of the builtin types every registry starts with.
pub mod builtins {
    use super::TypeHash;

    /// The universal base class.
    pub const OBJECT: TypeHash = TypeHash::from_name("object");
    /// The class factory (metaclass of every class).
    pub const TYPE: TypeHash = TypeHash::from_name("type");
    pub const INT: TypeHash = TypeHash::from_name("int");
    /// Primitive 64-bit integer.
    pub const INT64: TypeHash = TypeHash::from_name("int64");
    pub const STR: TypeHash = TypeHash::from_name("str");
    pub const BOOL: TypeHash = TypeHash::from_name("bool");
    /// The none-type (`None`).
    pub const NONE: TypeHash = TypeHash::from_name("None");
    /// The statically unknown type, assignable to and from everything.
    pub const DYNAMIC: TypeHash = TypeHash::from_name("dynamic");
}
