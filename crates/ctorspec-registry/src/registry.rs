//! SymbolRegistry - class and method storage for one compilation unit.
//!
//! # Storage Model
//!
//! - **Classes**: stored by `TypeHash`, with a name index for `lookup_class`
//! - **Functions**: methods live inside their owning `ClassEntry`; a reverse
//!   index maps each function hash to its owner
//! - **Hierarchy**: base links mirrored into an [`InheritanceGraph`] so
//!   assignability is a reachability query
//! - **Frozen set**: classes closed to redefinition; write-once
//!
//! # Thread Safety
//!
//! `SymbolRegistry` is not shared between units. Each unit builds its own
//! registry single-threaded and then only reads it while compiling, so
//! independent units may compile on separate threads without locking.
//!
//! # Example
//!
//! ```
//! use ctorspec_core::{ClassEntry, ClassTable, DataType, builtins};
//! use ctorspec_registry::SymbolRegistry;
//!
//! let mut registry = SymbolRegistry::with_builtins();
//! let class = ClassEntry::compiled("<module>", "C");
//! let hash = class.type_hash;
//! registry.register_class(class).unwrap();
//!
//! assert!(registry.is_assignable(DataType::simple(hash), DataType::object()));
//! assert!(!registry.is_assignable(DataType::simple(builtins::INT), DataType::simple(hash)));
//! ```

use rustc_hash::{FxHashMap, FxHashSet};

use ctorspec_core::{
    ClassEntry, ClassTable, DataType, FreezeOracle, FunctionEntry, QualifiedName,
    RegistrationError, TypeHash, builtins,
};

use crate::builtins::builtin_classes;
use crate::hierarchy::InheritanceGraph;

#[derive(Debug, Default, Clone)]
pub struct SymbolRegistry {
    /// Classes by hash (primary storage).
    classes: FxHashMap<TypeHash, ClassEntry>,

    /// Name index for `lookup_class`.
    class_by_name: FxHashMap<QualifiedName, TypeHash>,

    /// Reverse index: function hash -> owning class.
    function_owner: FxHashMap<TypeHash, TypeHash>,

    hierarchy: InheritanceGraph,

    frozen: FxHashSet<TypeHash>,
}

impl SymbolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the builtin namespace pre-registered and frozen.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for class in builtin_classes() {
            let hash = class.type_hash;
            registry.insert(class);
            registry.frozen.insert(hash);
        }
        registry
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a new class together with its methods.
    ///
    /// The base class must already be registered.
    pub fn register_class(&mut self, class: ClassEntry) -> Result<(), RegistrationError> {
        if self.class_by_name.contains_key(&class.name)
            || self.classes.contains_key(&class.type_hash)
        {
            return Err(RegistrationError::DuplicateType {
                name: class.name.to_string(),
            });
        }
        self.validate(&class)?;
        self.insert(class);
        Ok(())
    }

    /// Replace the definition of an existing, not yet frozen class.
    ///
    /// Callers holding cached descriptors must invalidate them for this class.
    pub fn redefine_class(&mut self, class: ClassEntry) -> Result<(), RegistrationError> {
        let hash = class.type_hash;
        if !self.classes.contains_key(&hash) {
            return Err(RegistrationError::UnknownClass {
                name: class.name.to_string(),
            });
        }
        if self.frozen.contains(&hash) {
            return Err(RegistrationError::FrozenClass {
                name: class.name.to_string(),
            });
        }
        self.validate(&class)?;

        if let Some(old) = self.classes.remove(&hash) {
            for method in &old.methods {
                self.function_owner.remove(&method.def.func_hash);
            }
        }
        self.insert(class);
        Ok(())
    }

    /// Mark a class as closed to further redefinition. Freezing twice is a no-op.
    pub fn freeze(&mut self, name: &QualifiedName) -> Result<(), RegistrationError> {
        let hash = self
            .class_by_name
            .get(name)
            .copied()
            .ok_or_else(|| RegistrationError::UnknownClass {
                name: name.to_string(),
            })?;
        self.frozen.insert(hash);
        Ok(())
    }

    fn validate(&self, class: &ClassEntry) -> Result<(), RegistrationError> {
        if let Some(base) = class.base {
            if !self.classes.contains_key(&base) {
                return Err(RegistrationError::UnknownBase {
                    class: class.name.to_string(),
                    base: self.hash_name(base),
                });
            }
            if self.hierarchy.would_cycle(class.type_hash, base) {
                return Err(RegistrationError::CircularInheritance {
                    name: class.name.to_string(),
                });
            }
        }

        for (i, method) in class.methods.iter().enumerate() {
            let name = method.def.name.to_string();
            method.def.signature.validate(&name)?;
            if class.methods[..i]
                .iter()
                .any(|m| m.def.func_hash == method.def.func_hash)
            {
                return Err(RegistrationError::DuplicateFunction { name });
            }
        }
        Ok(())
    }

    fn insert(&mut self, class: ClassEntry) {
        let hash = class.type_hash;
        self.hierarchy.set_base(hash, class.base);
        for method in &class.methods {
            self.function_owner.insert(method.def.func_hash, hash);
        }
        self.class_by_name.insert(class.name.clone(), hash);
        self.classes.insert(hash, class);
    }

    fn hash_name(&self, hash: TypeHash) -> String {
        self.classes
            .get(&hash)
            .map(|c| c.name.to_string())
            .unwrap_or_else(|| hash.to_string())
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.values()
    }

    /// Whether `sub` is `sup` or one of its subclasses.
    pub fn is_subclass(&self, sub: TypeHash, sup: TypeHash) -> bool {
        self.hierarchy.is_subclass(sub, sup)
    }

    /// Declared field names of `class` and its ancestors, base classes first.
    pub fn field_layout(&self, class: TypeHash) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = Some(class);
        while let Some(hash) = current {
            let Some(entry) = self.classes.get(&hash) else {
                break;
            };
            chain.push(entry);
            current = self.hierarchy.base_of(hash);
        }
        chain
            .iter()
            .rev()
            .flat_map(|entry| entry.fields.iter().map(|f| f.name.as_str()))
            .collect()
    }
}

impl ClassTable for SymbolRegistry {
    fn lookup_class(&self, name: &QualifiedName) -> Option<&ClassEntry> {
        self.class_by_name
            .get(name)
            .and_then(|hash| self.classes.get(hash))
    }

    fn get_class(&self, hash: TypeHash) -> Option<&ClassEntry> {
        self.classes.get(&hash)
    }

    fn get_function(&self, hash: TypeHash) -> Option<&FunctionEntry> {
        let owner = self.function_owner.get(&hash)?;
        self.classes
            .get(owner)?
            .methods
            .iter()
            .find(|m| m.def.func_hash == hash)
    }

    fn is_assignable(&self, from: DataType, to: DataType) -> bool {
        if from == to || from.is_dynamic() || to.is_dynamic() {
            return true;
        }
        if !self.classes.contains_key(&from.type_hash) {
            return false;
        }
        to.type_hash == builtins::OBJECT || self.hierarchy.is_subclass(from.type_hash, to.type_hash)
    }

    fn type_name(&self, ty: DataType) -> String {
        self.hash_name(ty.type_hash)
    }
}

impl FreezeOracle for SymbolRegistry {
    fn is_frozen(&self, class: TypeHash) -> bool {
        self.frozen.contains(&class)
    }
}
