//! Class descriptor resolution.
//!
//! A [`ClassDescriptor`] summarizes everything the rest of the pipeline needs
//! to know about constructing a class: where `__new__` and `__init__` come
//! from, whether those bindings are closed to runtime redefinition, and
//! whether the whole base chain is statically known. The hierarchy is walked
//! once here; downstream components only match on [`SlotBinding`].

use std::sync::Arc;

use rustc_hash::FxHashMap;

use ctorspec_core::{
    ClassEntry, CompilationError, DataType, FieldEntry, INIT, NEW, QualifiedName, Signature,
    Span, SymbolTable, TypeHash, builtins,
};

use crate::Result;
use crate::options::CompilerOptions;

/// A `__new__` or `__init__` definition found on the class or a known ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserSlot {
    pub func_hash: TypeHash,
    /// Callee description for diagnostics (`<module>.C.__init__`).
    pub name: QualifiedName,
    /// Class that defines the slot.
    pub owner: TypeHash,
    pub signature: Signature,
    pub return_type: DataType,
}

/// Where a construction slot is bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotBinding {
    /// The chain ended without reaching `object`; behaves like [`SlotBinding::FromObject`].
    Absent,
    /// The builtin default: token-only allocation, or a no-op initializer.
    FromObject,
    /// Resolution stopped at an opaque ancestor before finding a definition.
    FromUnknownBase,
    UserDefined(UserSlot),
}

impl SlotBinding {
    pub fn user(&self) -> Option<&UserSlot> {
        match self {
            SlotBinding::UserDefined(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn is_user_defined(&self) -> bool {
        matches!(self, SlotBinding::UserDefined(_))
    }

    /// `Absent` or `FromObject`.
    pub fn is_default(&self) -> bool {
        matches!(self, SlotBinding::Absent | SlotBinding::FromObject)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SlotBinding::FromUnknownBase)
    }
}

/// Structural summary of a class, as far as construction is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassDescriptor {
    pub name: QualifiedName,
    pub type_hash: TypeHash,
    pub new_slot: SlotBinding,
    pub init_slot: SlotBinding,
    /// Fields of the known chain, base classes first.
    pub declared_fields: Vec<FieldEntry>,
    pub is_frozen: bool,
    pub base_is_known: bool,
    /// `__new__` cannot change before the call runs.
    pub new_closed: bool,
    /// `__init__` cannot change before the call runs.
    pub init_closed: bool,
}

impl ClassDescriptor {
    pub fn data_type(&self) -> DataType {
        DataType::simple(self.type_hash)
    }

    /// True when no specialized plan is possible.
    pub fn is_opaque(&self) -> bool {
        !self.base_is_known || self.new_slot.is_unknown() || self.init_slot.is_unknown()
    }
}

/// Freeze state of every class a descriptor was derived from.
type FrozenSnapshot = Vec<(TypeHash, bool)>;

struct CacheEntry {
    descriptor: Arc<ClassDescriptor>,
    chain: FrozenSnapshot,
}

/// Resolves and caches class descriptors for one compilation unit.
///
/// Cached descriptors are reused only while the freeze state of every class
/// on their chain is unchanged, so freezing a class (or an ancestor) lets
/// later call sites regenerate sharper plans.
pub struct DescriptorResolver {
    options: CompilerOptions,
    cache: FxHashMap<TypeHash, CacheEntry>,
}

impl DescriptorResolver {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            cache: FxHashMap::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(
        &mut self,
        table: &dyn SymbolTable,
        name: &QualifiedName,
        span: Span,
    ) -> Result<Arc<ClassDescriptor>> {
        let class = table
            .lookup_class(name)
            .ok_or_else(|| CompilationError::UnresolvedSymbol {
                name: name.to_string(),
                span,
            })?;

        if let Some(entry) = self.cache.get(&class.type_hash) {
            if entry
                .chain
                .iter()
                .all(|&(hash, frozen)| table.is_frozen(hash) == frozen)
            {
                tracing::trace!(class = %name, "descriptor cache hit");
                return Ok(Arc::clone(&entry.descriptor));
            }
            tracing::debug!(class = %name, "freeze state changed, re-resolving descriptor");
        }

        let (descriptor, chain) = resolve_class(table, &self.options, class);
        let descriptor = Arc::new(descriptor);
        self.cache.insert(
            class.type_hash,
            CacheEntry {
                descriptor: Arc::clone(&descriptor),
                chain,
            },
        );
        Ok(descriptor)
    }

    /// Drop cached descriptors of `class` and of every class derived from it.
    pub fn invalidate(&mut self, class: TypeHash) {
        self.cache
            .retain(|_, entry| !entry.chain.iter().any(|&(hash, _)| hash == class));
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

/// Where a slot was found while walking the chain.
struct Found {
    binding: SlotBinding,
    /// Index into the walked chain of the class providing the binding.
    provider: usize,
}

/// Walk the base chain of `class` and build its descriptor. Uncached.
pub fn resolve_class(
    table: &dyn SymbolTable,
    options: &CompilerOptions,
    class: &ClassEntry,
) -> (ClassDescriptor, FrozenSnapshot) {
    let mut chain: Vec<&ClassEntry> = Vec::new();
    let mut new_slot: Option<Found> = None;
    let mut init_slot: Option<Found> = None;
    let mut base_is_known = true;
    let mut current = Some(class);

    let fallback = loop {
        let Some(entry) = current else {
            break SlotBinding::Absent;
        };
        if entry.type_hash == builtins::OBJECT {
            chain.push(entry);
            break SlotBinding::FromObject;
        }
        if entry.is_opaque() || chain.len() >= options.max_hierarchy_depth {
            tracing::debug!(
                class = %class.name,
                ancestor = %entry.name,
                "stopped at opaque ancestor"
            );
            base_is_known = false;
            break SlotBinding::FromUnknownBase;
        }

        let index = chain.len();
        chain.push(entry);
        for (slot, name) in [(&mut new_slot, NEW), (&mut init_slot, INIT)] {
            if slot.is_none() {
                *slot = user_slot(entry, name).map(|binding| Found {
                    binding,
                    provider: index,
                });
            }
        }

        current = match entry.base {
            Some(base) => match table.get_class(base) {
                Some(base) => Some(base),
                None => {
                    base_is_known = false;
                    break SlotBinding::FromUnknownBase;
                }
            },
            None => None,
        };
    };

    let closed = |found: &Option<Found>| match found {
        Some(found) => is_closed(table, options, &chain[..=found.provider]),
        None if fallback.is_unknown() => false,
        None => is_closed(table, options, &chain),
    };
    let new_closed = closed(&new_slot);
    let init_closed = closed(&init_slot);

    let declared_fields = chain
        .iter()
        .rev()
        .flat_map(|entry| entry.fields.iter().cloned())
        .collect();
    let snapshot = chain
        .iter()
        .map(|entry| (entry.type_hash, table.is_frozen(entry.type_hash)))
        .collect();

    let descriptor = ClassDescriptor {
        name: class.name.clone(),
        type_hash: class.type_hash,
        new_slot: new_slot.map_or_else(|| fallback.clone(), |f| f.binding),
        init_slot: init_slot.map_or_else(|| fallback.clone(), |f| f.binding),
        declared_fields,
        is_frozen: table.is_frozen(class.type_hash),
        base_is_known,
        new_closed,
        init_closed,
    };
    tracing::trace!(
        class = %descriptor.name,
        new = ?slot_kind(&descriptor.new_slot),
        init = ?slot_kind(&descriptor.init_slot),
        base_is_known,
        "resolved class descriptor"
    );
    (descriptor, snapshot)
}

fn user_slot(entry: &ClassEntry, name: &str) -> Option<SlotBinding> {
    let method = entry.find_method(name)?;
    Some(SlotBinding::UserDefined(UserSlot {
        func_hash: method.def.func_hash,
        name: method.def.name.clone(),
        owner: method.def.owner,
        signature: method.def.signature.clone(),
        return_type: method.def.return_type,
    }))
}

/// A binding is closed when every class from the constructed one up to the
/// provider is frozen, or final by construction.
fn is_closed(table: &dyn SymbolTable, options: &CompilerOptions, chain: &[&ClassEntry]) -> bool {
    chain.iter().all(|entry| {
        table.is_frozen(entry.type_hash) || (options.trust_final_classes && !entry.is_open())
    })
}

fn slot_kind(binding: &SlotBinding) -> &'static str {
    match binding {
        SlotBinding::Absent => "absent",
        SlotBinding::FromObject => "object",
        SlotBinding::FromUnknownBase => "unknown",
        SlotBinding::UserDefined(_) => "user",
    }
}
