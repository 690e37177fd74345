//! The generic call protocol and runtime argument binding.

use ctorspec_core::runtime::{CallContext, Value};
use ctorspec_core::{ClassTable, FunctionEntry, INIT, NEW, RuntimeError, TypeHash, builtins};
use ctorspec_registry::SymbolRegistry;

use super::{Result, Vm};

/// Arguments bound to a function's declared parameters at run time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundCall {
    /// One value per declared parameter, defaults filled in.
    pub args: Vec<Value>,
    pub rest: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

/// Bind call arguments with ordinary call-binding rules.
pub fn bind_arguments(
    func: &FunctionEntry,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
) -> Result<BoundCall> {
    let signature = &func.def.signature;
    let callee = || func.def.name.to_string();
    let mut slots: Vec<Option<Value>> = vec![None; signature.params.len()];
    let mut bound = BoundCall::default();

    let given = positional.len();
    for (index, value) in positional.into_iter().enumerate() {
        match slots.get_mut(index) {
            Some(slot) => *slot = Some(value),
            None if signature.accepts_varargs => bound.rest.push(value),
            None => {
                return Err(RuntimeError::TooManyArguments {
                    callee: callee(),
                    expected: signature.params.len(),
                    got: given,
                });
            }
        }
    }

    for (name, value) in keywords {
        match signature.find_param(&name) {
            Some(index) if slots[index].is_some() => {
                return Err(RuntimeError::DuplicateArgument {
                    callee: callee(),
                    name,
                });
            }
            Some(index) => slots[index] = Some(value),
            None if signature.accepts_kwargs => bound.keywords.push((name, value)),
            None => {
                return Err(RuntimeError::UnexpectedKeyword {
                    callee: callee(),
                    name,
                });
            }
        }
    }

    for (slot, param) in slots.into_iter().zip(&signature.params) {
        let value = match slot {
            Some(value) => value,
            None => func
                .default_for(&param.name)
                .cloned()
                .ok_or_else(|| RuntimeError::MissingArgument {
                    callee: callee(),
                    param: param.name.clone(),
                })?,
        };
        bound.args.push(value);
    }

    Ok(bound)
}

impl<'a> Vm<'a> {
    /// Instantiate `class` the way the dynamic object model does: `__new__`,
    /// then `__init__` if the result is an instance of the class.
    pub fn construct(
        &mut self,
        class: TypeHash,
        positional: Vec<Value>,
        keywords: Vec<(String, Value)>,
    ) -> Result<Value> {
        let new = self.find_method(class, NEW);
        let has_args = !positional.is_empty() || !keywords.is_empty();

        let result = match new.filter(|f| !is_default(f)) {
            Some(new) => self.call_bound(
                new,
                Value::Class(class),
                positional.clone(),
                keywords.clone(),
            )?,
            None => {
                let init = self.find_method(class, INIT);
                if has_args && init.is_none_or(is_default) {
                    return Err(RuntimeError::TakesNoArguments {
                        class: self.type_name(class),
                    });
                }
                let registry: &'a SymbolRegistry = self.registry;
                let fields = registry.field_layout(class);
                Value::Object(self.heap.allocate_laid_out(class, fields))
            }
        };

        if self.is_instance(&result, class)? {
            self.initialize(result.clone(), positional, keywords)?;
        }
        Ok(result)
    }

    /// Run `__init__` of the receiver's runtime class.
    pub fn initialize(
        &mut self,
        instance: Value,
        positional: Vec<Value>,
        keywords: Vec<(String, Value)>,
    ) -> Result<()> {
        let class = self.class_of(&instance)?;
        match self.find_method(class, INIT).filter(|f| !is_default(f)) {
            Some(init) => {
                self.call_bound(init, instance, positional, keywords)?;
            }
            None => {
                let has_args = !positional.is_empty() || !keywords.is_empty();
                let new_is_default = self.find_method(class, NEW).is_none_or(is_default);
                if has_args && new_is_default {
                    return Err(RuntimeError::TakesNoArguments {
                        class: self.type_name(class),
                    });
                }
            }
        }
        Ok(())
    }

    pub(super) fn call_method(
        &mut self,
        receiver: Value,
        name: &str,
        positional: Vec<Value>,
        keywords: Vec<(String, Value)>,
    ) -> Result<Value> {
        if name == INIT {
            self.initialize(receiver, positional, keywords)?;
            return Ok(Value::None);
        }
        let class = self.class_of(&receiver)?;
        let method = self
            .find_method(class, name)
            .ok_or_else(|| RuntimeError::NoAttribute {
                type_name: self.type_name(class),
                attr: name.to_string(),
            })?;
        self.call_bound(method, receiver, positional, keywords)
    }

    pub(super) fn call_value(
        &mut self,
        callee: Value,
        positional: Vec<Value>,
        keywords: Vec<(String, Value)>,
    ) -> Result<Value> {
        match callee {
            Value::Class(class) => self.construct(class, positional, keywords),
            other => {
                let class = self.class_of(&other)?;
                Err(RuntimeError::NotCallable {
                    type_name: self.type_name(class),
                })
            }
        }
    }

    fn call_bound(
        &mut self,
        func: &FunctionEntry,
        receiver: Value,
        positional: Vec<Value>,
        keywords: Vec<(String, Value)>,
    ) -> Result<Value> {
        let bound = bind_arguments(func, positional, keywords)?;
        self.invoke(func, receiver, &bound.args, &bound.rest, &bound.keywords)
    }

    /// Call a function body with already bound arguments.
    pub(super) fn invoke(
        &mut self,
        func: &FunctionEntry,
        receiver: Value,
        args: &[Value],
        rest: &[Value],
        keywords: &[(String, Value)],
    ) -> Result<Value> {
        let callee = func.def.name.to_string();
        let body = func
            .native_fn()
            .ok_or_else(|| RuntimeError::NoImplementation {
                callee: callee.clone(),
            })?;
        tracing::trace!(callee = %callee, args = args.len(), "invoke");
        let mut ctx = CallContext::new(&callee, receiver, args, rest, keywords, &mut *self.heap);
        body.call(&mut ctx)
    }

    /// Look a method up along the full base chain, opaque ancestors included.
    pub(super) fn find_method(&self, class: TypeHash, name: &str) -> Option<&'a FunctionEntry> {
        let registry: &'a SymbolRegistry = self.registry;
        let mut current = registry.get_class(class);
        while let Some(entry) = current {
            if let Some(method) = entry.find_method(name) {
                return Some(method);
            }
            current = entry.base.and_then(|base| registry.get_class(base));
        }
        None
    }
}

fn is_default(func: &FunctionEntry) -> bool {
    func.def.owner == builtins::OBJECT
}
