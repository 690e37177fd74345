use crate::{RuntimeError, TypeHash};

use super::Value;

/// Index of an instance in an [`ObjectHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u32);

/// An instance: its class plus fields in assignment order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptObject {
    pub class: TypeHash,
    fields: Vec<(String, Value)>,
}

impl ScriptObject {
    pub fn new(class: TypeHash) -> Self {
        Self {
            class,
            fields: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

/// Arena of instances. Objects are never freed; the VM is short-lived.
#[derive(Debug, Default)]
pub struct ObjectHeap {
    objects: Vec<ScriptObject>,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an instance of `class` with no fields set.
    pub fn allocate(&mut self, class: TypeHash) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(ScriptObject::new(class));
        handle
    }

    /// Allocate an instance with `fields` laid out in order, each set to none.
    pub fn allocate_laid_out<'f>(
        &mut self,
        class: TypeHash,
        fields: impl IntoIterator<Item = &'f str>,
    ) -> ObjectHandle {
        let handle = self.allocate(class);
        let object = &mut self.objects[handle.0 as usize];
        for field in fields {
            object.set(field, Value::None);
        }
        handle
    }

    pub fn get(&self, handle: ObjectHandle) -> Result<&ScriptObject, RuntimeError> {
        self.objects
            .get(handle.0 as usize)
            .ok_or(RuntimeError::InvalidHandle)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut ScriptObject, RuntimeError> {
        self.objects
            .get_mut(handle.0 as usize)
            .ok_or(RuntimeError::InvalidHandle)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
