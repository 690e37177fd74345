use std::fmt;

/// Dotted name of a class or function, relative to its defining module.
///
/// Builtin names have no module and display bare (`int`, `object`); names
/// defined in a compiled module display with the module prefix, matching the
/// callee descriptions used in diagnostics.
///
/// # Examples
///
/// ```
/// use ctorspec_core::QualifiedName;
///
/// let class = QualifiedName::in_module("<module>", "C");
/// assert_eq!(class.to_string(), "<module>.C");
/// assert_eq!(class.member("__init__").to_string(), "<module>.C.__init__");
///
/// assert_eq!(QualifiedName::builtin("int").to_string(), "int");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Defining module (`None` for builtins).
    pub module: Option<String>,
    /// Path inside the module (e.g. `["C", "__init__"]`).
    pub path: Vec<String>,
}

impl QualifiedName {
    pub fn new(module: Option<String>, path: Vec<String>) -> Self {
        Self { module, path }
    }

    /// A top-level name inside a compiled module.
    pub fn in_module(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            path: vec![name.into()],
        }
    }

    /// A name in the builtin namespace.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            module: None,
            path: vec![name.into()],
        }
    }

    /// Name of a member defined inside this one (`C` + `__new__` = `C.__new__`).
    pub fn member(&self, name: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(name.into());
        Self {
            module: self.module.clone(),
            path,
        }
    }

    /// The last path segment.
    pub fn simple_name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_builtin(&self) -> bool {
        self.module.is_none()
    }

    /// Compute the [`TypeHash`](crate::TypeHash) identifying this name.
    pub fn to_type_hash(&self) -> crate::TypeHash {
        crate::TypeHash::from_name(&self.to_string())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{}.", module)?;
        }
        write!(f, "{}", self.path.join("."))
    }
}
