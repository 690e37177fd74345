//! Constructor-call expressions as seen by the pipeline.

use ctorspec_core::{DataType, QualifiedName, Span};

/// One constructor-call expression, with argument types already inferred.
///
/// At run time the caller pushes positional argument values followed by
/// keyword argument values, in source order, before the emitted sequence runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub class: QualifiedName,
    pub positional: Vec<DataType>,
    /// Keyword arguments in source order.
    pub keywords: Vec<(String, DataType)>,
    /// Static type the surrounding context expects; dynamic when unconstrained.
    pub expected: DataType,
    pub span: Span,
}

impl CallSite {
    pub fn new(class: QualifiedName) -> Self {
        Self {
            class,
            positional: Vec::new(),
            keywords: Vec::new(),
            expected: DataType::dynamic(),
            span: Span::default(),
        }
    }

    pub fn arg(mut self, ty: DataType) -> Self {
        self.positional.push(ty);
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, ty: DataType) -> Self {
        self.keywords.push((name.into(), ty));
        self
    }

    pub fn expecting(mut self, ty: DataType) -> Self {
        self.expected = ty;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Number of argument values supplied (positional plus keyword).
    pub fn arg_count(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    pub fn keyword_names(&self) -> Vec<String> {
        self.keywords.iter().map(|(name, _)| name.clone()).collect()
    }
}
