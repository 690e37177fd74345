//! End-to-end constructor-call scenarios: compile through a [`Unit`], inspect
//! the chosen plan and bytecode, then run the sequence.

mod common;

use common::*;
use ctorspec::{
    ArgKind, CallSite, ClassEntry, ClassFlags, CompilationError, DataType, FunctionImpl, OpCode,
    Param, RuntimeError, Signature, SpecializationPlan, Unit, Value, builtins,
};

fn single_site(classes: Vec<ClassEntry>, site: CallSite) -> (Unit, usize) {
    let mut unit = unit_with(classes);
    let index = unit.add_call_site(site);
    (unit, index)
}

fn build_error(classes: Vec<ClassEntry>, site: CallSite) -> CompilationError {
    let (mut unit, index) = single_site(classes, site);
    let err = unit.build().expect_err("call site should not compile");
    err.for_site(index).cloned().expect("error for the site")
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn init_only_class_allocates_and_stores_field() {
    let class = compiled(MODULE, "C").with_init(
        Signature::new(vec![Param::new("a", int64())]),
        FunctionImpl::Native(ctorspec::NativeFn::new(|ctx| {
            let receiver = ctx.receiver();
            let a = ctx.arg(0)?.clone();
            ctx.set_attr(&receiver, "value", a)?;
            Ok(Value::None)
        })),
    );
    let (mut unit, site) = single_site(vec![class], CallSite::new(name("C")).arg(int64()));
    unit.build().unwrap();

    assert!(matches!(
        unit.plan(site),
        Some(SpecializationPlan::AllocateAndInit { .. })
    ));
    let value = unit.run(site, &[Value::Int(42)], &[]).unwrap();
    assert_eq!(field(&unit, &value, "value"), Some(Value::Int(42)));
}

#[test]
fn wrong_argument_type_is_rejected() {
    let class = compiled(MODULE, "C").with_init(
        Signature::new(vec![Param::new("a", int())]),
        FunctionImpl::Declared,
    );
    let err = build_error(vec![class], CallSite::new(name("C")).arg(str_type()));
    assert!(matches!(
        &err,
        CompilationError::TypeMismatch {
            param,
            kind: ArgKind::Positional,
            expected,
            actual,
            ..
        } if param == "a" && expected == "int" && actual == "str"
    ));
    assert!(
        err.to_string()
            .contains("type mismatch: str received for positional arg 'a', expected int")
    );
}

#[test]
fn too_many_arguments_counts_the_receiver() {
    let class = compiled(MODULE, "C").with_init(
        Signature::new(vec![Param::new("a", int())]),
        FunctionImpl::Declared,
    );
    let err = build_error(vec![class], CallSite::new(name("C")).arg(int()).arg(int()));
    assert!(matches!(
        &err,
        CompilationError::ArityMismatch {
            expected: 2,
            actual: 3,
            callee,
            ..
        } if callee == "<module>.C.__init__"
    ));
    assert!(
        err.to_string()
            .contains("Mismatched number of args for function <module>.C.__init__. Expected 2, got 3")
    );
}

#[test]
fn unrelated_new_return_suppresses_init() {
    let class = compiled(MODULE, "C")
        .with_new(
            Signature::new(vec![Param::new("a", int64())]),
            int(),
            returning(Value::Int(42)),
        )
        .with_init(varargs(), raising("__init__ must not run"));
    let (mut unit, site) = single_site(
        vec![class],
        CallSite::new(name("C")).arg(int64()).expecting(int()),
    );
    unit.build().unwrap();

    assert!(matches!(
        unit.plan(site),
        Some(SpecializationPlan::AllocateOnly { new: Some(_), .. })
    ));
    let call = unit.compiled(site).unwrap();
    call.chunk.assert_opcodes(&[
        OpCode::SpillArgs,
        OpCode::LoadClass,
        OpCode::LoadTemp,
        OpCode::InvokeFunction,
    ]);
    assert_eq!(call.result_type, int());
    assert_eq!(unit.run(site, &[Value::Int(7)], &[]), Ok(Value::Int(42)));
}

#[test]
fn opaque_base_always_goes_generic() {
    let base = ClassEntry::external("ext", "Base");
    let class = compiled(MODULE, "C").with_base(base.type_hash);
    let (mut unit, site) = single_site(vec![base, class], CallSite::new(name("C")));
    unit.build().unwrap();

    let Some(SpecializationPlan::GenericInvoke { narrow_to, .. }) = unit.plan(site) else {
        panic!("expected GenericInvoke, got {:?}", unit.plan(site));
    };
    assert_eq!(*narrow_to, Some(name("C").to_type_hash()));
    let call = unit.compiled(site).unwrap();
    assert!(call.chunk.contains_op(OpCode::CallFunction));
    assert!(!call.chunk.contains_op(OpCode::Alloc));

    let value = unit.run(site, &[], &[]).unwrap();
    assert_eq!(unit.object(&value).unwrap().class, name("C").to_type_hash());
}

#[test]
fn opaque_base_arguments_pass_through_unchecked() {
    let base = ClassEntry::external("ext", "Base").with_init(
        Signature::new(vec![Param::new("x", int())]),
        storing_init(&["x"]),
    );
    let class = compiled(MODULE, "C").with_base(base.type_hash);
    // A str argument is not checked against the opaque base's signature.
    let (mut unit, site) = single_site(vec![base, class], CallSite::new(name("C")).arg(str_type()));
    unit.build().unwrap();

    assert!(unit.plan(site).unwrap().is_generic());
    let value = unit.run(site, &[Value::str("five")], &[]).unwrap();
    assert_eq!(field(&unit, &value, "x"), Some(Value::str("five")));
}

#[test]
fn new_returning_object_in_class_context_fails() {
    let class = compiled(MODULE, "C")
        .with_new(Signature::default(), DataType::object(), allocating_new())
        .with_init(Signature::default(), storing_init(&[]));
    let err = build_error(
        vec![class],
        CallSite::new(name("C")).expecting(class_type("C")),
    );
    assert_eq!(
        err,
        CompilationError::ReturnTypeMismatch {
            expected: "<module>.C".to_string(),
            actual: "object".to_string(),
            span: Default::default(),
        }
    );
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn class_without_slots_takes_no_arguments() {
    let err = build_error(
        vec![compiled(MODULE, "C")],
        CallSite::new(name("C")).kwarg("x", int()),
    );
    assert!(err.is_arity_mismatch());
    assert!(err.to_string().ends_with("<module>.C() takes no arguments"));
}

#[test]
fn arity_is_checked_before_argument_types() {
    let class = compiled(MODULE, "C").with_init(
        Signature::new(vec![Param::new("a", int())]),
        FunctionImpl::Declared,
    );
    let err = build_error(
        vec![class],
        CallSite::new(name("C")).arg(str_type()).arg(str_type()),
    );
    assert!(err.is_arity_mismatch());
}

#[test]
fn argument_types_are_checked_before_return_type() {
    let class = compiled(MODULE, "C").with_new(
        Signature::new(vec![Param::new("a", int())]),
        DataType::object(),
        allocating_new(),
    );
    let err = build_error(
        vec![class],
        CallSite::new(name("C"))
            .arg(str_type())
            .expecting(class_type("C")),
    );
    assert!(matches!(err, CompilationError::TypeMismatch { .. }));
}

#[test]
fn keyword_only_call_is_specialized() {
    let class = compiled(MODULE, "C").with_init(
        Signature::new(vec![Param::new("x", str_type())]),
        storing_init(&["x"]),
    );
    let (mut unit, site) =
        single_site(vec![class], CallSite::new(name("C")).kwarg("x", str_type()));
    unit.build().unwrap();

    let chunk = &unit.compiled(site).unwrap().chunk;
    assert!(chunk.contains_op(OpCode::Alloc));
    assert!(chunk.contains_op(OpCode::InvokeFunction));
    assert!(!chunk.contains_op(OpCode::CallFunction));

    let value = unit.run(site, &[], &[Value::str("abc")]).unwrap();
    assert_eq!(field(&unit, &value, "x"), Some(Value::str("abc")));
}

#[test]
fn class_factory_subclass_goes_generic() {
    let class = compiled(MODULE, "Meta").with_base(builtins::TYPE);
    let (mut unit, site) = single_site(vec![class], CallSite::new(name("Meta")));
    unit.build().unwrap();
    assert!(unit.plan(site).unwrap().is_generic());
}

#[test]
fn builtin_converters_are_called_directly() {
    let mut unit = Unit::new();
    let to_bool = unit.add_call_site(
        CallSite::new(ctorspec::QualifiedName::builtin("bool"))
            .arg(int())
            .expecting(DataType::simple(builtins::BOOL)),
    );
    let to_int = unit.add_call_site(
        CallSite::new(ctorspec::QualifiedName::builtin("int")).arg(str_type()),
    );
    unit.build().unwrap();

    let Some(SpecializationPlan::AllocateOnly { new: Some(new), .. }) = unit.plan(to_bool) else {
        panic!("expected direct bool.__new__");
    };
    assert_eq!(new.callee.to_string(), "bool.__new__");
    assert!(new.is_direct());

    assert_eq!(unit.run(to_bool, &[Value::Int(3)], &[]), Ok(Value::Bool(true)));
    assert_eq!(unit.run(to_int, &[Value::str("5")], &[]), Ok(Value::Int(5)));
}

#[test]
fn inherited_init_is_called_on_the_derived_instance() {
    let base = compiled(MODULE, "Base").with_init(
        Signature::new(vec![Param::new("a", int())]),
        storing_init(&["a"]),
    );
    let derived = compiled(MODULE, "Derived").with_base(base.type_hash);
    let (mut unit, site) = single_site(
        vec![base, derived],
        CallSite::new(name("Derived")).arg(int()),
    );
    unit.build().unwrap();

    let Some(SpecializationPlan::AllocateAndInit { init, .. }) = unit.plan(site) else {
        panic!("expected AllocateAndInit");
    };
    assert_eq!(init.callee.to_string(), "<module>.Base.__init__");

    let value = unit.run(site, &[Value::Int(1)], &[]).unwrap();
    let object = unit.object(&value).unwrap();
    assert_eq!(object.class, name("Derived").to_type_hash());
    assert_eq!(object.get("a"), Some(&Value::Int(1)));
}

#[test]
fn omitted_defaults_are_loaded_from_the_callee() {
    let class = compiled(MODULE, "C").with_method(
        ctorspec::FunctionEntry::new(
            init_def(
                "C",
                Signature::new(vec![
                    Param::new("a", int()),
                    Param::with_default("b", int()),
                ]),
            ),
            storing_init(&["a", "b"]),
        )
        .with_default("b", Value::Int(5)),
    );
    let (mut unit, site) = single_site(vec![class], CallSite::new(name("C")).arg(int()));
    unit.build().unwrap();

    assert!(unit.compiled(site).unwrap().chunk.contains_op(OpCode::LoadDefault));
    let value = unit.run(site, &[Value::Int(1)], &[]).unwrap();
    assert_eq!(field(&unit, &value, "a"), Some(Value::Int(1)));
    assert_eq!(field(&unit, &value, "b"), Some(Value::Int(5)));
}

fn init_def(class: &str, signature: Signature) -> ctorspec::FunctionDef {
    let owner = name(class);
    ctorspec::FunctionDef::method(
        &owner,
        owner.to_type_hash(),
        "__init__",
        signature,
        DataType::none(),
    )
}

#[test]
fn variadic_init_collects_extras() {
    let class = compiled(MODULE, "C").with_init(
        Signature::new(vec![Param::new("a", int())])
            .with_varargs()
            .with_kwargs(),
        storing_init(&["a"]),
    );
    let (mut unit, site) = single_site(
        vec![class],
        CallSite::new(name("C"))
            .arg(int())
            .arg(str_type())
            .kwarg("z", int()),
    );
    unit.build().unwrap();

    let value = unit
        .run(site, &[Value::Int(1), Value::str("x")], &[Value::Int(9)])
        .unwrap();
    assert_eq!(field(&unit, &value, "a"), Some(Value::Int(1)));
    assert_eq!(field(&unit, &value, "extra"), Some(Value::Int(2)));
}

#[test]
fn guarded_init_runs_only_on_instances() {
    let mark_ready = ctorspec::NativeFn::new(|ctx| {
        let receiver = ctx.receiver();
        ctx.set_attr(&receiver, "ready", Value::Bool(true))?;
        Ok(Value::None)
    });
    let instance = compiled(MODULE, "C")
        .with_new(Signature::default(), DataType::object(), allocating_new())
        .with_init(Signature::default(), FunctionImpl::Native(mark_ready));
    let foreign = compiled(MODULE, "D")
        .with_new(
            Signature::default(),
            DataType::object(),
            returning(Value::Int(1)),
        )
        .with_init(Signature::default(), raising("__init__ must not run"));

    let mut unit = unit_with(vec![instance, foreign]);
    let c = unit.add_call_site(CallSite::new(name("C")));
    let d = unit.add_call_site(CallSite::new(name("D")));
    unit.build().unwrap();

    for site in [c, d] {
        assert!(matches!(
            unit.plan(site),
            Some(SpecializationPlan::UserNewDynamicInit {
                guard_init: true,
                ..
            })
        ));
    }
    let value = unit.run(c, &[], &[]).unwrap();
    assert_eq!(field(&unit, &value, "ready"), Some(Value::Bool(true)));
    assert_eq!(unit.run(d, &[], &[]), Ok(Value::Int(1)));
}

#[test]
fn failing_init_surfaces_runtime_error() {
    let class = compiled(MODULE, "C").with_init(Signature::default(), raising("boom"));
    let (mut unit, site) = single_site(vec![class], CallSite::new(name("C")));
    unit.build().unwrap();
    assert_eq!(
        unit.run(site, &[], &[]),
        Err(ctorspec::UnitError::Runtime(RuntimeError::raised("boom")))
    );
}

#[test]
fn open_class_falls_back_to_generic_invoke() {
    let class = compiled(MODULE, "C")
        .with_flags(ClassFlags::OPEN)
        .with_init(
            Signature::new(vec![Param::new("a", int())]),
            storing_init(&["a"]),
        );
    let (mut unit, site) = single_site(vec![class], CallSite::new(name("C")).arg(int()));
    unit.build().unwrap();

    let Some(SpecializationPlan::GenericInvoke { narrow_to, .. }) = unit.plan(site) else {
        panic!("expected GenericInvoke");
    };
    assert_eq!(*narrow_to, Some(name("C").to_type_hash()));
    let value = unit.run(site, &[Value::Int(4)], &[]).unwrap();
    assert_eq!(field(&unit, &value, "a"), Some(Value::Int(4)));
}

#[test]
fn planning_is_deterministic() {
    let make = || {
        let class = compiled(MODULE, "C").with_init(
            Signature::new(vec![Param::new("a", int()), Param::new("b", str_type())]),
            FunctionImpl::Declared,
        );
        let (mut unit, site) = single_site(
            vec![class],
            CallSite::new(name("C")).arg(int()).kwarg("b", str_type()),
        );
        unit.build().unwrap();
        unit.compiled(site).cloned().unwrap()
    };
    assert_eq!(make(), make());
}
