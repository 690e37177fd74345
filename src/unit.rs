//! Compilation unit API.
//!
//! A [`Unit`] owns one symbol registry, one descriptor cache and the
//! constructor call sites of one compilation unit. Users register classes,
//! add call sites, build, and then execute the emitted sequences.
//!
//! # Example
//!
//! ```ignore
//! let mut unit = Unit::new();
//! unit.add_class(point_class)?;
//! let site = unit.add_call_site(CallSite::new(point).arg(int).arg(int));
//! unit.build()?;
//! let point = unit.run(site, &[Value::Int(1), Value::Int(2)], &[])?;
//! ```
//!
//! A call site that fails to compile does not stop the others: [`Unit::build`]
//! compiles every site and reports all failures together.

use std::fmt;

use ctorspec_compiler::bytecode::ConstantPool;
use ctorspec_compiler::{
    CallSite, CallSiteCompiler, CompiledCall, CompilerOptions, SpecializationPlan,
};
use ctorspec_core::runtime::{ObjectHeap, ScriptObject, Value};
use ctorspec_core::{
    ClassEntry, ClassTable, CompilationError, QualifiedName, RegistrationError, RuntimeError,
};
use ctorspec_registry::SymbolRegistry;
use thiserror::Error;

use crate::vm::Vm;

/// Errors from unit-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("unit has not been built")]
    NotBuilt,

    #[error("no call site with index {0}")]
    UnknownSite(usize),
}

/// A compilation failure attached to the call site it was raised for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteError {
    pub site: usize,
    pub error: CompilationError,
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call site {}: {}", self.site, self.error)
    }
}

/// Every call site that failed during [`Unit::build`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} call site(s) failed to compile", .errors.len())]
pub struct BuildError {
    pub errors: Vec<SiteError>,
}

impl BuildError {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The failure of one call site, if it failed.
    pub fn for_site(&self, site: usize) -> Option<&CompilationError> {
        self.errors
            .iter()
            .find(|e| e.site == site)
            .map(|e| &e.error)
    }
}

/// A compilation unit ready for execution.
pub struct Unit {
    registry: SymbolRegistry,
    compiler: CallSiteCompiler,
    /// Shared by every chunk of this unit.
    constants: ConstantPool,
    heap: ObjectHeap,
    sites: Vec<CallSite>,
    /// Parallel to `sites`.
    compiled: Vec<Result<CompiledCall, CompilationError>>,
    is_built: bool,
}

impl Default for Unit {
    fn default() -> Self {
        Self::new()
    }
}

impl Unit {
    /// Create a unit with the builtin namespace and default options.
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            registry: SymbolRegistry::with_builtins(),
            compiler: CallSiteCompiler::new(options),
            constants: ConstantPool::new(),
            heap: ObjectHeap::new(),
            sites: Vec::new(),
            compiled: Vec::new(),
            is_built: false,
        }
    }

    // ==========================================================================
    // Symbols
    // ==========================================================================

    pub fn add_class(&mut self, class: ClassEntry) -> Result<(), UnitError> {
        self.registry.register_class(class)?;
        self.is_built = false;
        Ok(())
    }

    /// Replace a class definition. Refused once the class is frozen.
    pub fn redefine_class(&mut self, class: ClassEntry) -> Result<(), UnitError> {
        let hash = class.type_hash;
        self.registry.redefine_class(class)?;
        self.compiler.invalidate(hash);
        self.is_built = false;
        tracing::debug!(class = %hash, "class redefined");
        Ok(())
    }

    /// Close a class to further redefinition. Sites compiled afterwards may
    /// specialize more aggressively.
    pub fn freeze(&mut self, class: &QualifiedName) -> Result<(), UnitError> {
        self.registry.freeze(class)?;
        self.is_built = false;
        Ok(())
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn options(&self) -> &CompilerOptions {
        self.compiler.options()
    }

    // ==========================================================================
    // Compilation
    // ==========================================================================

    /// Add a constructor call site and return its index.
    pub fn add_call_site(&mut self, site: CallSite) -> usize {
        self.sites.push(site);
        self.is_built = false;
        self.sites.len() - 1
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Compile a single call site against the current symbols.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&mut self, site: &CallSite) -> Result<CompiledCall, CompilationError> {
        self.compiler
            .compile(&self.registry, site, &mut self.constants)
    }

    /// Compile every call site. Sites that fail are reported together; the
    /// rest remain runnable.
    pub fn build(&mut self) -> Result<(), BuildError> {
        let mut errors = Vec::new();
        self.compiled.clear();

        for (index, site) in self.sites.iter().enumerate() {
            match self
                .compiler
                .compile(&self.registry, site, &mut self.constants)
            {
                Ok(call) => self.compiled.push(Ok(call)),
                Err(error) => {
                    tracing::debug!(site = index, %error, "call site failed to compile");
                    self.compiled.push(Err(error.clone()));
                    errors.push(SiteError { site: index, error });
                }
            }
        }

        self.is_built = true;
        tracing::debug!(
            sites = self.sites.len(),
            failed = errors.len(),
            constants = self.constants.len(),
            "unit built"
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BuildError { errors })
        }
    }

    pub fn is_built(&self) -> bool {
        self.is_built
    }

    pub fn compiled(&self, site: usize) -> Option<&CompiledCall> {
        self.compiled.get(site).and_then(|call| call.as_ref().ok())
    }

    pub fn plan(&self, site: usize) -> Option<&SpecializationPlan> {
        self.compiled(site).map(|call| &call.plan)
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    // ==========================================================================
    // Execution
    // ==========================================================================

    /// Execute a compiled call site.
    ///
    /// `keywords` holds the values of the site's keyword arguments, in the
    /// order the site declares them.
    pub fn run(
        &mut self,
        site: usize,
        positional: &[Value],
        keywords: &[Value],
    ) -> Result<Value, UnitError> {
        if !self.is_built {
            return Err(UnitError::NotBuilt);
        }
        let call = match self.compiled.get(site) {
            Some(Ok(call)) => call,
            Some(Err(error)) => return Err(UnitError::Compilation(error.clone())),
            None => return Err(UnitError::UnknownSite(site)),
        };

        let mut vm = Vm::new(&self.registry, &self.constants, &mut self.heap);
        Ok(vm.execute(&call.chunk, positional, keywords)?)
    }

    /// Instantiate a class through the generic call protocol, bypassing any
    /// specialization.
    pub fn construct(
        &mut self,
        class: &QualifiedName,
        positional: Vec<Value>,
        keywords: Vec<(String, Value)>,
    ) -> Result<Value, UnitError> {
        let class = self
            .registry
            .lookup_class(class)
            .ok_or_else(|| RegistrationError::UnknownClass {
                name: class.to_string(),
            })?
            .type_hash;
        let mut vm = Vm::new(&self.registry, &self.constants, &mut self.heap);
        Ok(vm.construct(class, positional, keywords)?)
    }

    /// The instance behind an object value.
    pub fn object(&self, value: &Value) -> Option<&ScriptObject> {
        value.as_object().and_then(|handle| self.heap.get(handle).ok())
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctorspec_core::{DataType, FunctionImpl, Param, Signature, builtins};

    fn c() -> QualifiedName {
        QualifiedName::in_module("<module>", "C")
    }

    #[test]
    fn run_before_build_fails() {
        let mut unit = Unit::new();
        unit.add_class(ClassEntry::compiled("<module>", "C")).unwrap();
        let site = unit.add_call_site(CallSite::new(c()));
        assert_eq!(unit.run(site, &[], &[]), Err(UnitError::NotBuilt));
    }

    #[test]
    fn unknown_site() {
        let mut unit = Unit::new();
        unit.build().unwrap();
        assert_eq!(unit.run(3, &[], &[]), Err(UnitError::UnknownSite(3)));
    }

    #[test]
    fn token_only_class_runs() {
        let mut unit = Unit::new();
        unit.add_class(ClassEntry::compiled("<module>", "C")).unwrap();
        let site = unit.add_call_site(CallSite::new(c()));
        unit.build().unwrap();

        let value = unit.run(site, &[], &[]).unwrap();
        let object = unit.object(&value).unwrap();
        assert_eq!(object.class, c().to_type_hash());
        assert!(object.fields().is_empty());
    }

    #[test]
    fn duplicate_class_is_a_registration_error() {
        let mut unit = Unit::new();
        unit.add_class(ClassEntry::compiled("<module>", "C")).unwrap();
        let err = unit.add_class(ClassEntry::compiled("<module>", "C")).unwrap_err();
        assert!(matches!(
            err,
            UnitError::Registration(RegistrationError::DuplicateType { .. })
        ));
    }

    #[test]
    fn build_error_display() {
        let mut unit = Unit::new();
        unit.add_class(ClassEntry::compiled("<module>", "C").with_init(
            Signature::new(vec![Param::new("a", DataType::simple(builtins::INT))]),
            FunctionImpl::Declared,
        ))
        .unwrap();
        unit.add_call_site(CallSite::new(c()));
        let err = unit.build().unwrap_err();
        assert_eq!(err.to_string(), "1 call site(s) failed to compile");
        assert!(err.for_site(0).unwrap().is_arity_mismatch());
        assert!(err.errors[0].to_string().starts_with("call site 0: "));
    }
}
