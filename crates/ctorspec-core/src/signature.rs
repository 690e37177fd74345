//! Declared call signatures.
//!
//! A [`Signature`] lists the explicit parameters of a `__new__` or `__init__`
//! definition. The implicit receiver (`cls` / `self`) is not stored, but it is
//! counted by [`Signature::total_slots`] so arity diagnostics match the
//! user-facing definition.

use crate::{DataType, RegistrationError};

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub data_type: DataType,
    pub has_default: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            has_default: false,
        }
    }

    pub fn with_default(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            has_default: true,
        }
    }
}

/// Parameters plus variadic acceptance flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    /// Accepts extra positional arguments (`*args`).
    pub accepts_varargs: bool,
    /// Accepts extra keyword arguments (`**kwargs`).
    pub accepts_kwargs: bool,
}

impl Signature {
    pub fn new(params: Vec<Param>) -> Self {
        Self {
            params,
            accepts_varargs: false,
            accepts_kwargs: false,
        }
    }

    pub fn with_varargs(mut self) -> Self {
        self.accepts_varargs = true;
        self
    }

    pub fn with_kwargs(mut self) -> Self {
        self.accepts_kwargs = true;
        self
    }

    /// Parameter count including the implicit receiver.
    pub fn total_slots(&self) -> usize {
        self.params.len() + 1
    }

    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.has_default).count()
    }

    pub fn find_param(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Check parameter-name uniqueness and default ordering.
    pub fn validate(&self, function: &str) -> Result<(), RegistrationError> {
        let mut seen_default = false;
        for (i, param) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|p| p.name == param.name) {
                return Err(RegistrationError::DuplicateParameter {
                    function: function.to_string(),
                    param: param.name.clone(),
                });
            }
            if param.has_default {
                seen_default = true;
            } else if seen_default {
                return Err(RegistrationError::DefaultBeforeRequired {
                    function: function.to_string(),
                    param: param.name.clone(),
                });
            }
        }
        Ok(())
    }
}
