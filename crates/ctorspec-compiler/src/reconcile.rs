//! Return-type reconciliation.
//!
//! Decides the static type of a constructor expression and whether
//! `__init__` runs on the value `__new__` produced. The dynamic object model
//! only initializes a freshly allocated value when it is an instance of the
//! class being constructed, so a `__new__` declared to return an unrelated
//! type means `__init__` never runs at all.

use ctorspec_core::{CompilationError, DataType, Span, SymbolTable};

use crate::Result;
use crate::descriptor::{ClassDescriptor, SlotBinding};

/// Whether `__init__` runs on the value `__new__` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitDisposition {
    /// Every value of the result type is an instance of the class.
    Always,
    /// Only some values of the result type are instances; a runtime
    /// instance guard decides.
    Guarded,
    /// No value of the result type is an instance of the class.
    Never,
}

impl InitDisposition {
    pub fn may_run(self) -> bool {
        self != InitDisposition::Never
    }
}

/// Static outcome of a constructor expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultShape {
    pub result_type: DataType,
    pub init: InitDisposition,
    /// The result type is asserted rather than proven; the emitted sequence
    /// must check it at run time.
    pub needs_narrowing: bool,
}

/// How `__init__` relates to the declared return type of `__new__`.
pub fn init_disposition(table: &dyn SymbolTable, descriptor: &ClassDescriptor) -> InitDisposition {
    let SlotBinding::UserDefined(new) = &descriptor.new_slot else {
        return InitDisposition::Always;
    };
    let declared = new.return_type;
    let class = descriptor.data_type();

    if declared.is_dynamic() {
        InitDisposition::Guarded
    } else if table.is_assignable(declared, class) {
        InitDisposition::Always
    } else if table.is_assignable(class, declared) {
        InitDisposition::Guarded
    } else {
        InitDisposition::Never
    }
}

/// Compute the result shape and check it against the call site's expected type.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn reconcile(
    table: &dyn SymbolTable,
    descriptor: &ClassDescriptor,
    expected: DataType,
    span: Span,
) -> Result<ResultShape> {
    let init = init_disposition(table, descriptor);
    let (result_type, needs_narrowing) = match &descriptor.new_slot {
        SlotBinding::UserDefined(new) => (new.return_type, false),
        // The default allocation's effective return type is the class itself.
        SlotBinding::Absent | SlotBinding::FromObject => (descriptor.data_type(), false),
        SlotBinding::FromUnknownBase => (descriptor.data_type(), true),
    };

    if !table.is_assignable(result_type, expected) {
        return Err(CompilationError::ReturnTypeMismatch {
            expected: table.type_name(expected),
            actual: table.type_name(result_type),
            span,
        });
    }

    Ok(ResultShape {
        result_type,
        init,
        needs_narrowing,
    })
}
