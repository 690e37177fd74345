//! Specialization planning.
//!
//! Chooses how a constructor call is lowered. The first matching row wins:
//!
//! ```text
//! unknown ancestry / either slot FromUnknownBase   -> GenericInvoke
//! __new__ not closed                               -> GenericInvoke
//! __new__ default, __init__ user-defined           -> AllocateAndInit
//! __new__ user-defined, __init__ runs and defined  -> UserNewDynamicInit
//! __new__ user-defined, __init__ never runs        -> AllocateOnly
//! neither slot user-defined                        -> AllocateOnly (token-only)
//! ```
//!
//! An `__init__` that is not closed keeps its place in the plan but is
//! dispatched by runtime method lookup instead of a direct call. After a
//! user-defined `__new__`, a direct `__init__` only applies when the result's
//! class is exactly the constructed class; a subclass instance gets its own
//! `__init__` through lookup.

use ctorspec_core::{INIT, QualifiedName, TypeHash};

use crate::bytecode::u16_operand;
use crate::checker::{ArgSource, Binding, BoundArguments, SlotArguments};
use crate::descriptor::{ClassDescriptor, SlotBinding, UserSlot};
use crate::options::CompilerOptions;
use crate::reconcile::{InitDisposition, ResultShape};

/// How the call-site arguments are laid out in temporaries.
///
/// Positional argument `i` is spilled to temp `i`, keyword argument `k` to
/// temp `positional + k`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgLayout {
    pub positional: usize,
    pub keywords: Vec<String>,
}

impl ArgLayout {
    pub fn count(&self) -> usize {
        self.positional + self.keywords.len()
    }

    fn temp(&self, source: ArgSource) -> Operand {
        match source {
            ArgSource::Positional(i) => Operand::Temp(temp_index(i)),
            ArgSource::Keyword(k) => Operand::Temp(temp_index(self.positional + k)),
            ArgSource::Default(p) => Operand::Default(u16_operand(p, "parameter index")),
        }
    }

    fn keyword_temps(&self, indices: impl IntoIterator<Item = usize>) -> Vec<(String, u16)> {
        indices
            .into_iter()
            .map(|k| (self.keywords[k].clone(), temp_index(self.positional + k)))
            .collect()
    }
}

fn temp_index(index: usize) -> u16 {
    u16_operand(index, "temp index")
}

/// A value passed for a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// A spilled call-site argument.
    Temp(u16),
    /// The callee's default for the parameter at this index.
    Default(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// Statically bound call.
    Direct { func: TypeHash },
    /// Method lookup on the runtime class of the receiver, with generic binding.
    MethodLookup { name: String },
}

/// One `__new__` or `__init__` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotCall {
    pub callee: QualifiedName,
    pub dispatch: Dispatch,
    /// Direct: one per declared parameter. Lookup: the positional arguments.
    pub args: Vec<Operand>,
    /// Extra positional temps collected by `*args` (direct only).
    pub rest: Vec<u16>,
    /// Direct: extras collected by `**kwargs`. Lookup: every keyword argument.
    pub keywords: Vec<(String, u16)>,
}

impl SlotCall {
    fn direct(slot: &UserSlot, bound: &SlotArguments, layout: &ArgLayout) -> Self {
        Self {
            callee: slot.name.clone(),
            dispatch: Dispatch::Direct {
                func: slot.func_hash,
            },
            args: bound.params.iter().map(|&s| layout.temp(s)).collect(),
            rest: bound.rest.iter().map(|&i| temp_index(i)).collect(),
            keywords: layout.keyword_temps(bound.rest_keywords.iter().copied()),
        }
    }

    fn lookup(callee: QualifiedName, layout: &ArgLayout) -> Self {
        let name = callee.simple_name().to_string();
        Self {
            callee,
            dispatch: Dispatch::MethodLookup { name },
            args: (0..layout.positional)
                .map(|i| Operand::Temp(temp_index(i)))
                .collect(),
            rest: Vec::new(),
            keywords: layout.keyword_temps(0..layout.keywords.len()),
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.dispatch, Dispatch::Direct { .. })
    }
}

/// How a constructor call is lowered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpecializationPlan {
    /// Call the class like any value of unknown shape.
    GenericInvoke {
        class: TypeHash,
        args: ArgLayout,
        /// Check the result against this class at run time.
        narrow_to: Option<TypeHash>,
    },
    /// Token-only allocation, then `__init__` on the new instance.
    AllocateAndInit {
        class: TypeHash,
        args: ArgLayout,
        /// Declared fields, base classes first, laid out on allocation.
        fields: Vec<String>,
        init: SlotCall,
    },
    /// Only allocation; `__init__` is never referenced. `new: None` is the
    /// token-only default allocation, which lays out `fields`.
    AllocateOnly {
        class: TypeHash,
        args: ArgLayout,
        fields: Vec<String>,
        new: Option<SlotCall>,
    },
    /// Direct `__new__`, then `__init__` on its result.
    UserNewDynamicInit {
        class: TypeHash,
        args: ArgLayout,
        new: SlotCall,
        init: SlotCall,
        /// Run `__init__` only if the result is an instance of the class.
        guard_init: bool,
        /// Looked-up `__init__` for results whose class is a proper subclass.
        /// Present whenever `init` is direct.
        subclass_init: Option<SlotCall>,
    },
}

impl SpecializationPlan {
    pub fn name(&self) -> &'static str {
        match self {
            SpecializationPlan::GenericInvoke { .. } => "GenericInvoke",
            SpecializationPlan::AllocateAndInit { .. } => "AllocateAndInit",
            SpecializationPlan::AllocateOnly { .. } => "AllocateOnly",
            SpecializationPlan::UserNewDynamicInit { .. } => "UserNewDynamicInit",
        }
    }

    pub fn class(&self) -> TypeHash {
        match self {
            SpecializationPlan::GenericInvoke { class, .. }
            | SpecializationPlan::AllocateAndInit { class, .. }
            | SpecializationPlan::AllocateOnly { class, .. }
            | SpecializationPlan::UserNewDynamicInit { class, .. } => *class,
        }
    }

    pub fn args(&self) -> &ArgLayout {
        match self {
            SpecializationPlan::GenericInvoke { args, .. }
            | SpecializationPlan::AllocateAndInit { args, .. }
            | SpecializationPlan::AllocateOnly { args, .. }
            | SpecializationPlan::UserNewDynamicInit { args, .. } => args,
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, SpecializationPlan::GenericInvoke { .. })
    }
}

/// Choose a plan for a checked and reconciled call.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn plan(
    options: &CompilerOptions,
    descriptor: &ClassDescriptor,
    bound: &BoundArguments,
    shape: &ResultShape,
) -> SpecializationPlan {
    let class = descriptor.type_hash;
    let args = ArgLayout {
        positional: bound.positional_count,
        keywords: bound.keywords.clone(),
    };
    let generic = |args: ArgLayout, narrow_to: Option<TypeHash>, reason: &str| {
        tracing::debug!(class = %descriptor.name, reason, "planning generic invoke");
        SpecializationPlan::GenericInvoke {
            class,
            args,
            narrow_to,
        }
    };
    let narrowing = shape.needs_narrowing.then_some(class);

    if !options.specialize_constructors {
        return generic(args, narrowing, "specialization disabled");
    }
    let Binding::Checked { new, init } = &bound.binding else {
        return generic(args, narrowing, "arguments unchecked");
    };
    if descriptor.is_opaque() {
        return generic(args, narrowing, "unknown ancestry");
    }
    if !descriptor.new_closed {
        // Whatever `__new__` becomes, the declared result type must still hold.
        let declared = (!shape.result_type.is_dynamic()).then_some(shape.result_type.type_hash);
        return generic(args, declared, "__new__ not closed");
    }

    let init_call = init_call(descriptor, init.as_ref(), &args);
    let fields: Vec<String> = descriptor
        .declared_fields
        .iter()
        .map(|field| field.name.clone())
        .collect();
    let plan = match (&descriptor.new_slot, new) {
        (SlotBinding::UserDefined(slot), Some(new_args)) => {
            let new = SlotCall::direct(slot, new_args, &args);
            match (shape.init, init_call) {
                (InitDisposition::Never, _) | (_, None) => SpecializationPlan::AllocateOnly {
                    class,
                    args,
                    fields,
                    new: Some(new),
                },
                (disposition, Some(init)) => {
                    let subclass_init = init
                        .is_direct()
                        .then(|| SlotCall::lookup(init.callee.clone(), &args));
                    SpecializationPlan::UserNewDynamicInit {
                        class,
                        args,
                        new,
                        init,
                        guard_init: disposition == InitDisposition::Guarded,
                        subclass_init,
                    }
                }
            }
        }
        (binding, _) if binding.is_default() => match init_call {
            Some(init) => SpecializationPlan::AllocateAndInit {
                class,
                args,
                fields,
                init,
            },
            None => SpecializationPlan::AllocateOnly {
                class,
                args,
                fields,
                new: None,
            },
        },
        _ => return generic(args, narrowing, "__new__ binding without arguments"),
    };

    tracing::debug!(class = %descriptor.name, plan = plan.name(), "planned constructor call");
    plan
}

/// The `__init__` invocation, if one is needed at all.
fn init_call(
    descriptor: &ClassDescriptor,
    bound: Option<&SlotArguments>,
    layout: &ArgLayout,
) -> Option<SlotCall> {
    match (descriptor.init_slot.user(), bound) {
        (Some(slot), Some(bound)) if descriptor.init_closed => {
            Some(SlotCall::direct(slot, bound, layout))
        }
        (Some(slot), _) => Some(SlotCall::lookup(slot.name.clone(), layout)),
        (None, _) if !descriptor.init_closed => {
            Some(SlotCall::lookup(descriptor.name.member(INIT), layout))
        }
        (None, _) => None,
    }
}
