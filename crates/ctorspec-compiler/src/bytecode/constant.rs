//! Constant pool shared by every call site of a unit.

use ctorspec_core::TypeHash;
use rustc_hash::FxHashMap;

use super::u16_operand;

/// Values referenced by instruction operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// A class or function identity.
    TypeHash(TypeHash),
    /// A method name for dynamic lookup.
    Name(String),
    /// Keyword argument names, in the order their values are pushed.
    Names(Vec<String>),
}

/// Deduplicating constant pool.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    index: FxHashMap<Constant, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get existing constant, returns its index.
    ///
    /// # Panics
    ///
    /// Panics if the pool outgrows 16-bit indices.
    pub fn add(&mut self, constant: Constant) -> u16 {
        if let Some(&idx) = self.index.get(&constant) {
            return idx;
        }
        let idx = u16_operand(self.constants.len(), "constant index");
        self.constants.push(constant.clone());
        self.index.insert(constant, idx);
        idx
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    pub fn type_hash(&self, index: u16) -> Option<TypeHash> {
        match self.get(index)? {
            Constant::TypeHash(hash) => Some(*hash),
            _ => None,
        }
    }

    pub fn name(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn names(&self, index: u16) -> Option<&[String]> {
        match self.get(index)? {
            Constant::Names(names) => Some(names),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates() {
        let mut pool = ConstantPool::new();
        let a = pool.add(Constant::TypeHash(TypeHash(1)));
        let b = pool.add(Constant::Name("__init__".to_string()));
        let c = pool.add(Constant::TypeHash(TypeHash(1)));

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn typed_accessors() {
        let mut pool = ConstantPool::new();
        let hash = pool.add(Constant::TypeHash(TypeHash(7)));
        let names = pool.add(Constant::Names(vec!["x".to_string()]));

        assert_eq!(pool.type_hash(hash), Some(TypeHash(7)));
        assert_eq!(pool.type_hash(names), None);
        assert_eq!(pool.names(names), Some(&["x".to_string()][..]));
        assert_eq!(pool.name(hash), None);
        assert!(pool.get(99).is_none());
    }
}
