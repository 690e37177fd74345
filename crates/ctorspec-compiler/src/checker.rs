//! Constructor signature checking.
//!
//! Binds call-site arguments against the `__new__` and `__init__` signatures
//! the descriptor resolved, with ordinary call-binding rules, then checks
//! each bound argument's static type. All arity checks run before any type
//! check, and `__new__` is checked before `__init__`.

use ctorspec_core::{ArgKind, CompilationError, DataType, SymbolTable};

use crate::Result;
use crate::call_site::CallSite;
use crate::descriptor::{ClassDescriptor, UserSlot};
use crate::reconcile::init_disposition;

/// Where the value for a declared parameter comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgSource {
    /// Index into the call's positional arguments.
    Positional(usize),
    /// Index into the call's keyword arguments.
    Keyword(usize),
    /// The parameter's declared default.
    Default(usize),
}

/// Arguments bound to one slot's signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SlotArguments {
    /// One entry per declared parameter.
    pub params: Vec<ArgSource>,
    /// Positional arguments collected by `*args`.
    pub rest: Vec<usize>,
    /// Keyword arguments collected by `**kwargs`.
    pub rest_keywords: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    /// The class is not fully resolved; arguments pass through unchecked.
    Unchecked,
    /// `None` for a slot that is not user-defined or that never runs.
    Checked {
        new: Option<SlotArguments>,
        init: Option<SlotArguments>,
    },
}

/// Result of checking a constructor call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundArguments {
    pub positional_count: usize,
    /// Keyword names in source order.
    pub keywords: Vec<String>,
    pub binding: Binding,
}

impl BoundArguments {
    pub fn arg_count(&self) -> usize {
        self.positional_count + self.keywords.len()
    }
}

/// Check a call site against the constructor signatures of its class.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn check(
    table: &dyn SymbolTable,
    descriptor: &ClassDescriptor,
    site: &CallSite,
) -> Result<BoundArguments> {
    let bound = |binding| BoundArguments {
        positional_count: site.positional.len(),
        keywords: site.keyword_names(),
        binding,
    };

    if descriptor.is_opaque() {
        tracing::trace!(class = %descriptor.name, "unknown ancestry, arguments unchecked");
        return Ok(bound(Binding::Unchecked));
    }

    let new_slot = descriptor.new_slot.user();
    let init_slot = descriptor
        .init_slot
        .user()
        .filter(|_| init_disposition(table, descriptor).may_run());

    if new_slot.is_none() && init_slot.is_none() {
        if site.arg_count() > 0 {
            return Err(CompilationError::NoArguments {
                class: descriptor.name.to_string(),
                span: site.span,
            });
        }
        return Ok(bound(Binding::Checked {
            new: None,
            init: None,
        }));
    }

    let new = new_slot.map(|slot| bind(slot, site)).transpose()?;
    let init = init_slot.map(|slot| bind(slot, site)).transpose()?;

    if let (Some(slot), Some(args)) = (new_slot, &new) {
        check_types(table, slot, args, site)?;
    }
    if let (Some(slot), Some(args)) = (init_slot, &init) {
        check_types(table, slot, args, site)?;
    }

    Ok(bound(Binding::Checked { new, init }))
}

/// Bind arguments to parameters. Fails only on arity.
pub fn bind(slot: &UserSlot, site: &CallSite) -> Result<SlotArguments> {
    let signature = &slot.signature;
    let arity_error = || CompilationError::ArityMismatch {
        expected: signature.total_slots(),
        actual: site.arg_count() + 1,
        callee: slot.name.to_string(),
        span: site.span,
    };

    let mut filled: Vec<Option<ArgSource>> = vec![None; signature.params.len()];
    let mut rest = Vec::new();
    let mut rest_keywords = Vec::new();

    for i in 0..site.positional.len() {
        if i < filled.len() {
            filled[i] = Some(ArgSource::Positional(i));
        } else if signature.accepts_varargs {
            rest.push(i);
        } else {
            return Err(arity_error());
        }
    }

    for (k, (name, _)) in site.keywords.iter().enumerate() {
        match signature.find_param(name) {
            Some(p) if filled[p].is_none() => filled[p] = Some(ArgSource::Keyword(k)),
            Some(_) => return Err(arity_error()),
            None if signature.accepts_kwargs => rest_keywords.push(k),
            None => return Err(arity_error()),
        }
    }

    let params = filled
        .into_iter()
        .zip(&signature.params)
        .enumerate()
        .map(|(p, (source, param))| match source {
            Some(source) => Ok(source),
            None if param.has_default => Ok(ArgSource::Default(p)),
            None => Err(arity_error()),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SlotArguments {
        params,
        rest,
        rest_keywords,
    })
}

/// First argument (in parameter order) not assignable to its parameter.
fn check_types(
    table: &dyn SymbolTable,
    slot: &UserSlot,
    args: &SlotArguments,
    site: &CallSite,
) -> Result<()> {
    for (param, source) in slot.signature.params.iter().zip(&args.params) {
        let (actual, kind): (DataType, ArgKind) = match *source {
            ArgSource::Positional(i) => (site.positional[i], ArgKind::Positional),
            ArgSource::Keyword(k) => (site.keywords[k].1, ArgKind::Keyword),
            ArgSource::Default(_) => continue,
        };
        if !table.is_assignable(actual, param.data_type) {
            return Err(CompilationError::TypeMismatch {
                param: param.name.clone(),
                kind,
                expected: table.type_name(param.data_type),
                actual: table.type_name(actual),
                span: site.span,
            });
        }
    }
    Ok(())
}
