//! Per-call-site compilation: resolve, check, reconcile, plan, emit.

use ctorspec_core::{DataType, SymbolTable, TypeHash};

use crate::Result;
use crate::bytecode::{BytecodeChunk, ConstantPool};
use crate::call_site::CallSite;
use crate::checker::check;
use crate::descriptor::DescriptorResolver;
use crate::emit::ConstructorEmitter;
use crate::options::CompilerOptions;
use crate::planner::{SpecializationPlan, plan};
use crate::reconcile::reconcile;

/// A compiled constructor-call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCall {
    pub plan: SpecializationPlan,
    pub chunk: BytecodeChunk,
    /// Static type of the expression.
    pub result_type: DataType,
}

/// Compiles constructor calls for one unit, sharing a descriptor cache.
pub struct CallSiteCompiler {
    options: CompilerOptions,
    resolver: DescriptorResolver,
}

impl CallSiteCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            resolver: DescriptorResolver::new(options),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile one call site. Errors are fatal for this expression only.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(skip(self, table, site, constants), fields(class = %site.class))]
    pub fn compile(
        &mut self,
        table: &dyn SymbolTable,
        site: &CallSite,
        constants: &mut ConstantPool,
    ) -> Result<CompiledCall> {
        let descriptor = self.resolver.resolve(table, &site.class, site.span)?;
        let bound = check(table, &descriptor, site)?;
        let shape = reconcile(table, &descriptor, site.expected, site.span)?;
        let plan = plan(&self.options, &descriptor, &bound, &shape);

        let mut emitter = ConstructorEmitter::new(constants);
        emitter.set_line(site.span.line);
        let chunk = emitter.emit_plan(&plan);

        Ok(CompiledCall {
            plan,
            chunk,
            result_type: shape.result_type,
        })
    }

    /// Forget cached descriptors that depend on `class`.
    pub fn invalidate(&mut self, class: TypeHash) {
        self.resolver.invalidate(class);
    }

    pub fn cached_descriptors(&self) -> usize {
        self.resolver.cached_count()
    }
}

impl Default for CallSiteCompiler {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;
    use ctorspec_core::{
        ClassEntry, CompilationError, FunctionImpl, Param, QualifiedName, Signature, Span,
        builtins,
    };
    use ctorspec_registry::SymbolRegistry;

    fn int() -> DataType {
        DataType::simple(builtins::INT)
    }

    fn registry_with(class: ClassEntry) -> SymbolRegistry {
        let mut registry = SymbolRegistry::with_builtins();
        registry.register_class(class).unwrap();
        registry
    }

    fn c() -> QualifiedName {
        QualifiedName::in_module("<module>", "C")
    }

    #[test]
    fn compiles_init_call() {
        let registry = registry_with(ClassEntry::compiled("<module>", "C").with_init(
            Signature::new(vec![Param::new("a", int())]),
            FunctionImpl::Declared,
        ));
        let mut compiler = CallSiteCompiler::default();
        let mut constants = ConstantPool::new();
        let call = compiler
            .compile(&registry, &CallSite::new(c()).arg(int()), &mut constants)
            .unwrap();
        assert_eq!(call.plan.name(), "AllocateAndInit");
        assert_eq!(call.result_type, DataType::simple(c().to_type_hash()));
        call.chunk.assert_opcodes(&[
            OpCode::SpillArgs,
            OpCode::Alloc,
            OpCode::Dup,
            OpCode::LoadTemp,
            OpCode::InvokeFunction,
            OpCode::Pop,
        ]);
    }

    #[test]
    fn unresolved_class() {
        let registry = SymbolRegistry::with_builtins();
        let mut compiler = CallSiteCompiler::default();
        let err = compiler
            .compile(
                &registry,
                &CallSite::new(c()).at(Span::point(2, 4)),
                &mut ConstantPool::new(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            CompilationError::UnresolvedSymbol {
                name: "<module>.C".to_string(),
                span: Span::point(2, 4),
            }
        );
    }

    #[test]
    fn arity_error_comes_before_return_type_error() {
        let class = ClassEntry::compiled("<module>", "C").with_new(
            Signature::default(),
            DataType::object(),
            FunctionImpl::Declared,
        );
        let registry = registry_with(class);
        let site = CallSite::new(c())
            .arg(int())
            .expecting(DataType::simple(c().to_type_hash()));
        let err = CallSiteCompiler::default()
            .compile(&registry, &site, &mut ConstantPool::new())
            .unwrap_err();
        assert!(err.is_arity_mismatch());
    }

    #[test]
    fn constants_are_shared_across_sites() {
        let registry = registry_with(ClassEntry::compiled("<module>", "C"));
        let mut compiler = CallSiteCompiler::default();
        let mut constants = ConstantPool::new();
        let a = compiler
            .compile(&registry, &CallSite::new(c()), &mut constants)
            .unwrap();
        let b = compiler
            .compile(&registry, &CallSite::new(c()), &mut constants)
            .unwrap();
        assert_eq!(a.chunk, b.chunk);
        assert_eq!(constants.len(), 1);
        assert_eq!(compiler.cached_descriptors(), 1);
    }

    #[test]
    fn invalidate_drops_cached_descriptor() {
        let registry = registry_with(ClassEntry::compiled("<module>", "C"));
        let mut compiler = CallSiteCompiler::default();
        compiler
            .compile(&registry, &CallSite::new(c()), &mut ConstantPool::new())
            .unwrap();
        compiler.invalidate(c().to_type_hash());
        assert_eq!(compiler.cached_descriptors(), 0);
    }
}
