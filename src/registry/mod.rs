//! Converter registration and lookup.
//!
//! A process-wide registry, seeded with the built-in converters, backs the
//! top-level serialize/deserialize entry points; callers that want isolation
//! build their own [`Registry`] and use the `*_with_registry` variants.
//! Registration is additive only and belongs in setup code: a pass holds the
//! registry for its whole duration, so registering concurrently with running
//! passes blocks and is unsupported.

pub mod builtins;

use std::sync::{LazyLock, RwLock, RwLockReadGuard};

use crate::error::RegistryError;
use crate::options::SerializeOptions;
use crate::value::Value;

/// Decides whether a converter handles the given value.
pub type MatchFn = fn(&Value) -> bool;

/// Decomposes a matched value into plain data the serializer then walks, so
/// decompositions may contain shared references of their own.
pub type DecomposeFn = fn(&Value, &SerializeOptions) -> Value;

/// Rebuilds a value from reconstructed payload data. An error degrades to the
/// raw payload at the decode site; it never fails the pass.
pub type RebuildFn = fn(Value) -> Result<Value, String>;

/// Serialization capability for one opaque type.
///
/// `decompose` is invoked only for values `matches` accepted, at most once
/// per occurrence per pass.
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    /// Wire tag, unique within a registry.
    pub tag: &'static str,
    pub matches: MatchFn,
    pub decompose: DecomposeFn,
    pub rebuild: RebuildFn,
}

/// Ordered converter table; value lookup scans in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    converters: Vec<Converter>,
}

impl Registry {
    /// Empty registry with no built-ins.
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Registry seeded with the `Error`, `RegExp`, and `Date` converters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for converter in builtins::all() {
            registry.register(converter).expect("builtin tags are distinct");
        }
        registry
    }

    /// Adds a converter; rejects a tag an earlier registration already took.
    pub fn register(&mut self, converter: Converter) -> Result<(), RegistryError> {
        if self.converters.iter().any(|existing| existing.tag == converter.tag) {
            return Err(RegistryError::DuplicateTag(converter.tag.to_string()));
        }
        self.converters.push(converter);
        Ok(())
    }

    /// First converter whose predicate matches, in registration order.
    ///
    /// Built-ins are seeded first, so later registrations extend the type set
    /// but cannot override built-in handling.
    pub fn by_value(&self, value: &Value) -> Option<&Converter> {
        self.converters
            .iter()
            .find(|converter| (converter.matches)(value))
    }

    /// Converter registered under `tag`, if any.
    pub fn by_tag(&self, tag: &str) -> Option<&Converter> {
        self.converters.iter().find(|converter| converter.tag == tag)
    }
}

static GLOBAL: LazyLock<RwLock<Registry>> =
    LazyLock::new(|| RwLock::new(Registry::with_builtins()));

/// Registers `converter` in the process-wide registry.
pub fn register_type(converter: Converter) -> Result<(), RegistryError> {
    // Registration is a single push; a lock poisoned mid-panic still holds a
    // valid table.
    match GLOBAL.write() {
        Ok(mut registry) => registry.register(converter),
        Err(poisoned) => poisoned.into_inner().register(converter),
    }
}

/// Read access to the process-wide registry for the duration of one pass.
pub(crate) fn global() -> RwLockReadGuard<'static, Registry> {
    match GLOBAL.read() {
        Ok(registry) => registry,
        Err(poisoned) => poisoned.into_inner(),
    }
}
