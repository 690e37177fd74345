//! Lowering of specialization plans to bytecode.
//!
//! The [`ConstructorEmitter`] is a mechanical translator: every decision has
//! already been made by the planner. It preserves operation order exactly
//! (arguments spilled once up front, allocation before initialization,
//! `__new__` before `__init__`).
//!
//! # Example
//!
//! ```ignore
//! let mut constants = ConstantPool::new();
//! let mut emitter = ConstructorEmitter::new(&mut constants);
//! emitter.set_line(site.span.line);
//! let chunk = emitter.emit_plan(&plan);
//! ```

use ctorspec_core::TypeHash;

use crate::bytecode::{BytecodeChunk, Constant, ConstantPool, OpCode, u16_operand};
use crate::planner::{ArgLayout, Dispatch, Operand, SlotCall, SpecializationPlan};

/// Emits the bytecode for one constructor call.
///
/// Uses a shared unit-level constant pool for deduplication across call sites.
pub struct ConstructorEmitter<'pool> {
    chunk: BytecodeChunk,
    constants: &'pool mut ConstantPool,
    current_line: u32,
}

impl<'pool> ConstructorEmitter<'pool> {
    pub fn new(constants: &'pool mut ConstantPool) -> Self {
        Self {
            chunk: BytecodeChunk::new(),
            constants,
            current_line: 1,
        }
    }

    /// Set current source line for debug info.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit_plan(mut self, plan: &SpecializationPlan) -> BytecodeChunk {
        self.emit_spill(plan.args());

        match plan {
            SpecializationPlan::GenericInvoke {
                class,
                args,
                narrow_to,
            } => {
                self.emit_class_op(OpCode::LoadClass, *class);
                for temp in 0..args.count() {
                    self.emit_u16(OpCode::LoadTemp, u16_operand(temp, "temp index"));
                }
                let names = self.names(&args.keywords);
                self.emit(OpCode::CallFunction);
                self.operand(u16_operand(args.positional, "argument count"));
                self.operand(names);
                if let Some(target) = narrow_to {
                    self.emit_class_op(OpCode::CheckType, *target);
                }
            }
            SpecializationPlan::AllocateAndInit {
                class,
                fields,
                init,
                ..
            } => {
                self.emit_alloc(*class, fields);
                self.emit_init(init);
            }
            SpecializationPlan::AllocateOnly {
                class,
                fields,
                new,
                ..
            } => match new {
                Some(new) => {
                    self.emit_class_op(OpCode::LoadClass, *class);
                    self.emit_call(new);
                }
                None => self.emit_alloc(*class, fields),
            },
            SpecializationPlan::UserNewDynamicInit {
                class,
                new,
                init,
                guard_init,
                subclass_init,
                ..
            } => {
                self.emit_class_op(OpCode::LoadClass, *class);
                self.emit_call(new);
                let guard = guard_init.then(|| self.emit_guard(OpCode::GuardInstance, *class));
                match subclass_init {
                    Some(fallback) => {
                        let not_exact = self.emit_guard(OpCode::GuardExact, *class);
                        self.emit_init(init);
                        self.emit(OpCode::Jump);
                        let done = self.chunk.write_jump_placeholder(self.current_line);
                        self.chunk.patch_jump(not_exact);
                        self.emit_init(fallback);
                        self.chunk.patch_jump(done);
                    }
                    None => self.emit_init(init),
                }
                if let Some(offset) = guard {
                    self.chunk.patch_jump(offset);
                }
            }
        }

        tracing::trace!(
            plan = plan.name(),
            bytes = self.chunk.len(),
            "emitted constructor sequence"
        );
        self.chunk
    }

    fn emit_spill(&mut self, args: &ArgLayout) {
        if args.count() > 0 {
            self.emit_u16(
                OpCode::SpillArgs,
                u16_operand(args.count(), "argument count"),
            );
        }
    }

    fn emit_alloc(&mut self, class: TypeHash, fields: &[String]) {
        let fields = self.names(fields);
        self.emit_class_op(OpCode::Alloc, class);
        self.operand(fields);
    }

    /// Run `__init__` on the instance on top of the stack, keeping the instance.
    fn emit_init(&mut self, init: &SlotCall) {
        self.emit(OpCode::Dup);
        self.emit_call(init);
        self.emit(OpCode::Pop);
    }

    /// Push the arguments of `call` and invoke it on the receiver below them.
    fn emit_call(&mut self, call: &SlotCall) {
        let func = match &call.dispatch {
            Dispatch::Direct { func } => self.constants.add(Constant::TypeHash(*func)),
            Dispatch::MethodLookup { name } => self.constants.add(Constant::Name(name.clone())),
        };

        for operand in &call.args {
            match *operand {
                Operand::Temp(temp) => self.emit_u16(OpCode::LoadTemp, temp),
                Operand::Default(param) => {
                    self.emit(OpCode::LoadDefault);
                    self.operand(func);
                    self.operand(param);
                }
            }
        }
        for &temp in &call.rest {
            self.emit_u16(OpCode::LoadTemp, temp);
        }
        for (_, temp) in &call.keywords {
            self.emit_u16(OpCode::LoadTemp, *temp);
        }

        let names: Vec<String> = call.keywords.iter().map(|(name, _)| name.clone()).collect();
        let names = self.names(&names);
        match call.dispatch {
            Dispatch::Direct { .. } => {
                self.emit(OpCode::InvokeFunction);
                self.operand(func);
                self.operand(u16_operand(call.args.len(), "argument count"));
                self.operand(u16_operand(call.rest.len(), "argument count"));
                self.operand(names);
            }
            Dispatch::MethodLookup { .. } => {
                self.emit(OpCode::CallMethod);
                self.operand(func);
                self.operand(u16_operand(call.args.len(), "argument count"));
                self.operand(names);
            }
        }
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.current_line);
    }

    fn operand(&mut self, value: u16) {
        self.chunk.write_u16(value, self.current_line);
    }

    fn emit_u16(&mut self, op: OpCode, value: u16) {
        self.emit(op);
        self.operand(value);
    }

    fn emit_class_op(&mut self, op: OpCode, class: TypeHash) {
        let index = self.constants.add(Constant::TypeHash(class));
        self.emit_u16(op, index);
    }

    /// Class guard with a forward distance to patch.
    fn emit_guard(&mut self, op: OpCode, class: TypeHash) -> usize {
        self.emit_class_op(op, class);
        self.chunk.write_jump_placeholder(self.current_line)
    }

    fn names(&mut self, names: &[String]) -> u16 {
        self.constants.add(Constant::Names(names.to_vec()))
    }
}
