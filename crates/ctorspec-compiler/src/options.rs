//! Compiler options.

/// Tunable behaviour of the constructor pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilerProperty {
    /// Emit specialized plans. When off, every call site goes generic after
    /// type checking.
    SpecializeConstructors,
    /// Treat compiled classes not flagged `OPEN` as closed. When off, only
    /// frozen classes are closed.
    TrustFinalClasses,
    /// Base chains deeper than this are treated as opaque.
    MaxHierarchyDepth,
}

impl CompilerProperty {
    pub fn default_value(&self) -> usize {
        match self {
            CompilerProperty::SpecializeConstructors => 1,
            CompilerProperty::TrustFinalClasses => 1,
            CompilerProperty::MaxHierarchyDepth => 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompilerOptions {
    pub specialize_constructors: bool,
    pub trust_final_classes: bool,
    pub max_hierarchy_depth: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            specialize_constructors: CompilerProperty::SpecializeConstructors.default_value() != 0,
            trust_final_classes: CompilerProperty::TrustFinalClasses.default_value() != 0,
            max_hierarchy_depth: CompilerProperty::MaxHierarchyDepth.default_value(),
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_property(&mut self, property: CompilerProperty, value: usize) {
        match property {
            CompilerProperty::SpecializeConstructors => self.specialize_constructors = value != 0,
            CompilerProperty::TrustFinalClasses => self.trust_final_classes = value != 0,
            CompilerProperty::MaxHierarchyDepth => self.max_hierarchy_depth = value,
        }
    }

    pub fn get_property(&self, property: CompilerProperty) -> usize {
        match property {
            CompilerProperty::SpecializeConstructors => usize::from(self.specialize_constructors),
            CompilerProperty::TrustFinalClasses => usize::from(self.trust_final_classes),
            CompilerProperty::MaxHierarchyDepth => self.max_hierarchy_depth,
        }
    }
}
