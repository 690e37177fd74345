//! Class entries.

use bitflags::bitflags;

use crate::{DataType, QualifiedName, Signature, TypeHash, builtins};

use super::{FunctionDef, FunctionEntry, FunctionImpl, INIT, NEW};

bitflags! {
    /// Facts about a class that affect how far its construction can be specialized.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u8 {
        /// Slots may be redefined at run time until the class is frozen.
        const OPEN = 1 << 0;
        /// Instances are themselves classes (a metaclass such as `type`).
        const CLASS_FACTORY = 1 << 1;
    }
}

/// Where a class definition comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassSource {
    /// Defined in a module compiled by this compiler.
    Compiled,
    /// Provided by the builtin namespace with statically known slots.
    Builtin,
    /// Defined outside the compiler; its members are opaque.
    External,
}

/// A declared instance field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldEntry {
    pub name: String,
    pub data_type: DataType,
}

/// Registry entry for a class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntry {
    pub name: QualifiedName,
    pub type_hash: TypeHash,
    pub source: ClassSource,
    pub flags: ClassFlags,
    /// Single base class; `None` only for `object` and detached classes.
    pub base: Option<TypeHash>,
    pub fields: Vec<FieldEntry>,
    pub methods: Vec<FunctionEntry>,
}

impl ClassEntry {
    pub fn new(name: QualifiedName, source: ClassSource) -> Self {
        let type_hash = name.to_type_hash();
        let base = (type_hash != builtins::OBJECT).then_some(builtins::OBJECT);
        Self {
            name,
            type_hash,
            source,
            flags: ClassFlags::empty(),
            base,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// A class defined in a compiled module, deriving from `object`.
    pub fn compiled(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(
            QualifiedName::in_module(module, name),
            ClassSource::Compiled,
        )
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new(QualifiedName::builtin(name), ClassSource::Builtin)
    }

    /// A class defined outside the compiler.
    pub fn external(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(
            QualifiedName::in_module(module, name),
            ClassSource::External,
        )
    }

    // === Builder Methods ===

    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.base = Some(base);
        self
    }

    /// Remove the implicit `object` base.
    pub fn detached(mut self) -> Self {
        self.base = None;
        self
    }

    pub fn with_flags(mut self, flags: ClassFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.fields.push(FieldEntry {
            name: name.into(),
            data_type,
        });
        self
    }

    pub fn with_method(mut self, method: FunctionEntry) -> Self {
        self.methods.push(method);
        self
    }

    /// Define `__new__` with the given explicit parameters and declared return type.
    pub fn with_new(
        self,
        signature: Signature,
        return_type: DataType,
        implementation: FunctionImpl,
    ) -> Self {
        let def = FunctionDef::method(&self.name, self.type_hash, NEW, signature, return_type);
        self.with_method(FunctionEntry::new(def, implementation))
    }

    /// Define `__init__`; its return type is always the none-type.
    pub fn with_init(self, signature: Signature, implementation: FunctionImpl) -> Self {
        let def = FunctionDef::method(
            &self.name,
            self.type_hash,
            INIT,
            signature,
            DataType::none(),
        );
        self.with_method(FunctionEntry::new(def, implementation))
    }

    // === Query Methods ===

    /// Find a method defined directly on this class.
    pub fn find_method(&self, name: &str) -> Option<&FunctionEntry> {
        self.methods.iter().find(|m| m.def.name.simple_name() == name)
    }

    pub fn find_method_mut(&mut self, name: &str) -> Option<&mut FunctionEntry> {
        self.methods
            .iter_mut()
            .find(|m| m.def.name.simple_name() == name)
    }

    /// Whether the compiler may not look inside this class.
    pub fn is_opaque(&self) -> bool {
        self.source == ClassSource::External || self.flags.contains(ClassFlags::CLASS_FACTORY)
    }

    pub fn is_open(&self) -> bool {
        self.flags.contains(ClassFlags::OPEN)
    }

    pub fn data_type(&self) -> DataType {
        DataType::simple(self.type_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Param;

    #[test]
    fn compiled_class_derives_from_object() {
        let class = ClassEntry::compiled("<module>", "C");
        assert_eq!(class.base, Some(builtins::OBJECT));
        assert_eq!(class.type_hash, TypeHash::from_name("<module>.C"));
        assert!(!class.is_opaque());
    }

    #[test]
    fn object_has_no_base() {
        assert_eq!(ClassEntry::builtin("object").base, None);
        assert_eq!(ClassEntry::compiled("m", "D").detached().base, None);
    }

    #[test]
    fn external_and_factory_classes_are_opaque() {
        assert!(ClassEntry::external("re", "Scanner").is_opaque());
        assert!(
            ClassEntry::builtin("type")
                .with_flags(ClassFlags::CLASS_FACTORY)
                .is_opaque()
        );
    }

    #[test]
    fn slot_builders_name_methods() {
        let class = ClassEntry::compiled("<module>", "C")
            .with_init(
                Signature::new(vec![Param::new("a", DataType::simple(builtins::INT))]),
                FunctionImpl::Declared,
            )
            .with_field("value", DataType::simple(builtins::INT));

        let init = class.find_method(INIT).expect("init defined");
        assert_eq!(init.def.name.to_string(), "<module>.C.__init__");
        assert_eq!(init.def.owner, class.type_hash);
        assert!(init.def.return_type.is_none());
        assert!(class.find_method(NEW).is_none());
        assert_eq!(class.fields.len(), 1);
    }
}
