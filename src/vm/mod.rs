//! Reference interpreter for constructor sequences.
//!
//! Executes the chunks the emitter produces, and implements the generic call
//! protocol ([`Vm::construct`]) that every specialized sequence must be
//! observably equivalent to.
//!
//! On entry the stack holds the call-site argument values: positional first,
//! then keyword values in source order. A chunk leaves exactly the value of
//! the constructor expression on the stack.

mod call;

pub use call::{BoundCall, bind_arguments};

use ctorspec_compiler::bytecode::{BytecodeChunk, ConstantPool, OpCode};
use ctorspec_core::runtime::{ObjectHeap, Value};
use ctorspec_core::{ClassTable, DataType, FunctionEntry, RuntimeError, TypeHash, builtins};
use ctorspec_registry::SymbolRegistry;

type Result<T> = std::result::Result<T, RuntimeError>;

pub struct Vm<'a> {
    registry: &'a SymbolRegistry,
    constants: &'a ConstantPool,
    heap: &'a mut ObjectHeap,
    stack: Vec<Value>,
    temps: Vec<Value>,
}

impl<'a> Vm<'a> {
    pub fn new(
        registry: &'a SymbolRegistry,
        constants: &'a ConstantPool,
        heap: &'a mut ObjectHeap,
    ) -> Self {
        Self {
            registry,
            constants,
            heap,
            stack: Vec::new(),
            temps: Vec::new(),
        }
    }

    /// Run a constructor chunk with the given call-site argument values.
    pub fn execute(
        &mut self,
        chunk: &BytecodeChunk,
        positional: &[Value],
        keywords: &[Value],
    ) -> Result<Value> {
        self.stack.clear();
        self.temps.clear();
        self.stack.extend(positional.iter().cloned());
        self.stack.extend(keywords.iter().cloned());

        let mut ip = 0;
        while ip < chunk.len() {
            let op = chunk
                .read_op(ip)
                .ok_or(RuntimeError::InvalidBytecode { offset: ip })?;
            let at = ip + 1;
            ip = at + op.operand_size();

            match op {
                OpCode::SpillArgs => {
                    let count = operand(chunk, at)?;
                    self.temps = self.pop_n(count as usize)?;
                }
                OpCode::LoadTemp => {
                    let index = operand(chunk, at)?;
                    let value = self
                        .temps
                        .get(index as usize)
                        .cloned()
                        .ok_or(RuntimeError::InvalidBytecode { offset: at })?;
                    self.stack.push(value);
                }
                OpCode::LoadDefault => {
                    let func = self.function_const(chunk, at)?;
                    let param = operand(chunk, at + 2)?;
                    let value = default_value(func, param as usize)?;
                    self.stack.push(value);
                }
                OpCode::LoadClass => {
                    let class = self.class_const(chunk, at)?;
                    self.stack.push(Value::Class(class));
                }
                OpCode::Dup => {
                    let top = self.peek()?.clone();
                    self.stack.push(top);
                }
                OpCode::Pop => {
                    self.pop()?;
                }
                OpCode::Alloc => {
                    let class = self.class_const(chunk, at)?;
                    let fields = self.names_const(chunk, at + 2)?;
                    let handle = self
                        .heap
                        .allocate_laid_out(class, fields.iter().map(String::as_str));
                    self.stack.push(Value::Object(handle));
                }
                OpCode::InvokeFunction => {
                    let func = self.function_const(chunk, at)?;
                    let argc = operand(chunk, at + 2)? as usize;
                    let rest = operand(chunk, at + 4)? as usize;
                    let names = self.names_const(chunk, at + 6)?;

                    let keywords = self.pop_keywords(names)?;
                    let rest = self.pop_n(rest)?;
                    let args = self.pop_n(argc)?;
                    let receiver = self.pop()?;
                    let result = self.invoke(func, receiver, &args, &rest, &keywords)?;
                    self.stack.push(result);
                }
                OpCode::CallMethod => {
                    let name = self.name_const(chunk, at)?;
                    let argc = operand(chunk, at + 2)? as usize;
                    let names = self.names_const(chunk, at + 4)?;

                    let keywords = self.pop_keywords(names)?;
                    let positional = self.pop_n(argc)?;
                    let receiver = self.pop()?;
                    let result = self.call_method(receiver, name, positional, keywords)?;
                    self.stack.push(result);
                }
                OpCode::CallFunction => {
                    let argc = operand(chunk, at)? as usize;
                    let names = self.names_const(chunk, at + 2)?;

                    let keywords = self.pop_keywords(names)?;
                    let positional = self.pop_n(argc)?;
                    let callee = self.pop()?;
                    let result = self.call_value(callee, positional, keywords)?;
                    self.stack.push(result);
                }
                OpCode::GuardInstance => {
                    let class = self.class_const(chunk, at)?;
                    let skip = operand(chunk, at + 2)?;
                    if !self.is_instance(self.peek()?, class)? {
                        ip += skip as usize;
                    }
                }
                OpCode::GuardExact => {
                    let class = self.class_const(chunk, at)?;
                    let skip = operand(chunk, at + 2)?;
                    if self.class_of(self.peek()?)? != class {
                        ip += skip as usize;
                    }
                }
                OpCode::Jump => {
                    ip += operand(chunk, at)? as usize;
                }
                OpCode::CheckType => {
                    let class = self.class_const(chunk, at)?;
                    let top = self.peek()?;
                    if !self.is_instance(top, class)? {
                        let actual = self.class_of(top)?;
                        return Err(RuntimeError::TypeCheck {
                            expected: self.type_name(class),
                            actual: self.type_name(actual),
                        });
                    }
                }
            }
        }

        let result = self.pop()?;
        tracing::trace!(remaining = self.stack.len(), "constructor sequence finished");
        Ok(result)
    }

    /// Whether `value` is an instance of `class` (or of a subclass).
    pub fn is_instance(&self, value: &Value, class: TypeHash) -> Result<bool> {
        if class == builtins::OBJECT || class == builtins::DYNAMIC {
            return Ok(true);
        }
        let runtime = self.class_of(value)?;
        let related = runtime == class || self.registry.is_subclass(runtime, class);
        Ok(related)
    }

    /// Runtime class of a value.
    pub fn class_of(&self, value: &Value) -> Result<TypeHash> {
        Ok(match value {
            Value::None => builtins::NONE,
            Value::Bool(_) => builtins::BOOL,
            Value::Int(_) => builtins::INT,
            Value::Str(_) => builtins::STR,
            Value::Object(handle) => self.heap.get(*handle)?.class,
            Value::Class(_) => builtins::TYPE,
        })
    }

    fn type_name(&self, class: TypeHash) -> String {
        self.registry.type_name(DataType::simple(class))
    }

    // ==========================================================================
    // Stack
    // ==========================================================================

    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn peek(&self) -> Result<&Value> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    /// Pop `count` values, preserving push order.
    fn pop_n(&mut self, count: usize) -> Result<Vec<Value>> {
        let start = self
            .stack
            .len()
            .checked_sub(count)
            .ok_or(RuntimeError::StackUnderflow)?;
        Ok(self.stack.split_off(start))
    }

    fn pop_keywords(&mut self, names: &[String]) -> Result<Vec<(String, Value)>> {
        let values = self.pop_n(names.len())?;
        Ok(names.iter().cloned().zip(values).collect())
    }

    // ==========================================================================
    // Constants
    // ==========================================================================

    fn class_const(&self, chunk: &BytecodeChunk, at: usize) -> Result<TypeHash> {
        let index = operand(chunk, at)?;
        self.constants
            .type_hash(index)
            .ok_or(RuntimeError::InvalidBytecode { offset: at })
    }

    fn function_const(&self, chunk: &BytecodeChunk, at: usize) -> Result<&'a FunctionEntry> {
        let registry: &'a SymbolRegistry = self.registry;
        let hash = self.class_const(chunk, at)?;
        registry
            .get_function(hash)
            .ok_or(RuntimeError::UnknownSymbol(hash))
    }

    fn name_const(&self, chunk: &BytecodeChunk, at: usize) -> Result<&'a str> {
        let constants: &'a ConstantPool = self.constants;
        let index = operand(chunk, at)?;
        constants
            .name(index)
            .ok_or(RuntimeError::InvalidBytecode { offset: at })
    }

    fn names_const(&self, chunk: &BytecodeChunk, at: usize) -> Result<&'a [String]> {
        let constants: &'a ConstantPool = self.constants;
        let index = operand(chunk, at)?;
        constants
            .names(index)
            .ok_or(RuntimeError::InvalidBytecode { offset: at })
    }
}

fn operand(chunk: &BytecodeChunk, at: usize) -> Result<u16> {
    chunk
        .read_u16(at)
        .ok_or(RuntimeError::InvalidBytecode { offset: at })
}

fn default_value(func: &FunctionEntry, param: usize) -> Result<Value> {
    let missing = || RuntimeError::MissingArgument {
        callee: func.def.name.to_string(),
        param: format!("#{param}"),
    };
    let param = func.def.signature.params.get(param).ok_or_else(missing)?;
    func.default_for(&param.name)
        .cloned()
        .ok_or_else(|| RuntimeError::MissingArgument {
            callee: func.def.name.to_string(),
            param: param.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctorspec_compiler::bytecode::Constant;
    use ctorspec_core::QualifiedName;

    fn run(chunk: &BytecodeChunk, constants: &ConstantPool, args: &[Value]) -> Result<Value> {
        let registry = SymbolRegistry::with_builtins();
        let mut heap = ObjectHeap::new();
        Vm::new(&registry, constants, &mut heap).execute(chunk, args, &[])
    }

    #[test]
    fn spill_and_reload_preserves_order() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::SpillArgs, 1);
        chunk.write_u16(2, 1);
        chunk.write_op(OpCode::LoadTemp, 1);
        chunk.write_u16(1, 1);
        let result = run(
            &chunk,
            &ConstantPool::new(),
            &[Value::Int(1), Value::Int(2)],
        )
        .unwrap();
        assert_eq!(result, Value::Int(2));
    }

    #[test]
    fn check_type_rejects_foreign_value() {
        let mut constants = ConstantPool::new();
        let int = constants.add(Constant::TypeHash(builtins::INT));
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::CheckType, 1);
        chunk.write_u16(int, 1);

        assert_eq!(run(&chunk, &constants, &[Value::Bool(true)]), Ok(Value::Bool(true)));
        assert_eq!(
            run(&chunk, &constants, &[Value::str("x")]),
            Err(RuntimeError::TypeCheck {
                expected: "int".to_string(),
                actual: "str".to_string(),
            })
        );
    }

    #[test]
    fn exact_guard_does_not_match_subclasses() {
        let mut constants = ConstantPool::new();
        let int = constants.add(Constant::TypeHash(builtins::INT));
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::GuardExact, 1);
        chunk.write_u16(int, 1);
        chunk.write_u16(4, 1);
        chunk.write_op(OpCode::Pop, 1);
        chunk.write_op(OpCode::LoadClass, 1);
        chunk.write_u16(int, 1);

        assert_eq!(run(&chunk, &constants, &[Value::Int(3)]), Ok(Value::Class(builtins::INT)));
        // bool is an int subclass: skipped.
        assert_eq!(run(&chunk, &constants, &[Value::Bool(true)]), Ok(Value::Bool(true)));
    }

    #[test]
    fn jump_skips_forward() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Jump, 1);
        chunk.write_u16(1, 1);
        chunk.write_op(OpCode::Pop, 1);
        assert_eq!(run(&chunk, &ConstantPool::new(), &[Value::Int(7)]), Ok(Value::Int(7)));
    }

    #[test]
    fn alloc_lays_out_fields() {
        let class = QualifiedName::in_module("<module>", "C").to_type_hash();
        let mut constants = ConstantPool::new();
        let class_index = constants.add(Constant::TypeHash(class));
        let fields = constants.add(Constant::Names(vec!["x".to_string(), "y".to_string()]));
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Alloc, 1);
        chunk.write_u16(class_index, 1);
        chunk.write_u16(fields, 1);

        let registry = SymbolRegistry::with_builtins();
        let mut heap = ObjectHeap::new();
        let result = Vm::new(&registry, &constants, &mut heap)
            .execute(&chunk, &[], &[])
            .unwrap();
        let Value::Object(handle) = result else {
            panic!("expected an object, got {result:?}");
        };
        let object = heap.get(handle).unwrap();
        assert_eq!(object.class, class);
        assert_eq!(
            object.fields(),
            &[
                ("x".to_string(), Value::None),
                ("y".to_string(), Value::None),
            ]
        );
    }

    #[test]
    fn truncated_chunk_is_rejected() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::LoadTemp, 1);
        chunk.write_byte(0, 1);
        assert_eq!(
            run(&chunk, &ConstantPool::new(), &[]),
            Err(RuntimeError::InvalidBytecode { offset: 1 })
        );
    }

    #[test]
    fn empty_stack_underflows() {
        assert_eq!(
            run(&BytecodeChunk::new(), &ConstantPool::new(), &[]),
            Err(RuntimeError::StackUnderflow)
        );
    }

    #[test]
    fn primitives_are_instances_of_their_classes() {
        let registry = SymbolRegistry::with_builtins();
        let constants = ConstantPool::new();
        let mut heap = ObjectHeap::new();
        let vm = Vm::new(&registry, &constants, &mut heap);
        assert!(vm.is_instance(&Value::Bool(true), builtins::INT).unwrap());
        assert!(vm.is_instance(&Value::Int(1), builtins::OBJECT).unwrap());
        assert!(!vm.is_instance(&Value::Int(1), builtins::STR).unwrap());
        assert!(
            !vm.is_instance(
                &Value::Int(1),
                QualifiedName::in_module("<module>", "C").to_type_hash()
            )
            .unwrap()
        );
    }
}
