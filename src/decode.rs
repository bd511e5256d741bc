//! Deserialization: one document walk plus deferred pointer patching.
//!
//! Containers are put into the reference map before their children are
//! reconstructed, so a pointer that targets an enclosing composite resolves
//! while the target is still being filled. A pointer in a container slot
//! resolves on the spot when its target already exists, which is always the
//! case for documents this engine emits; pointers inside converter payloads
//! therefore arrive at `rebuild` fully wired. A pointer that arrives
//! before its target (foreign documents may reorder) leaves a `Null`
//! placeholder and a patch record, applied once the walk ends. Unknown tags,
//! and payloads a converter rejects, keep their payload as plain data. The
//! only structural failures are a pointer whose id no node carries and
//! exhausting the depth bound.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde_json::{Map, Number};

use crate::error::DecodeError;
use crate::options::DeserializeOptions;
use crate::registry::{self, Registry};
use crate::value::Value;
use crate::wire::{self, Document};

/// Reconstructs a value graph against the process-wide registry with default
/// options.
pub fn deserialize(document: &Document) -> Result<Value, DecodeError> {
    deserialize_with_options(document, &DeserializeOptions::default())
}

/// Reconstructs a value graph against the process-wide registry.
pub fn deserialize_with_options(
    document: &Document,
    options: &DeserializeOptions,
) -> Result<Value, DecodeError> {
    let registry = registry::global();
    deserialize_with_registry(document, options, &registry)
}

/// Reconstructs a value graph against an explicit registry.
pub fn deserialize_with_registry(
    document: &Document,
    options: &DeserializeOptions,
    registry: &Registry,
) -> Result<Value, DecodeError> {
    let mut decoder = Decoder::new(options, registry);
    let value = decoder.walk(document, 0)?;
    decoder.apply_patches()?;
    Ok(value)
}

struct Decoder<'a> {
    options: &'a DeserializeOptions,
    registry: &'a Registry,
    /// Reconstructed composites, by the reference id their node carried.
    references: HashMap<u64, Value>,
    /// Pointer slots to fill once every referenced composite exists.
    patches: Vec<Patch>,
}

/// One pointer occurrence: the container slot holding its placeholder and the
/// id it must resolve to.
struct Patch {
    slot: Slot,
    reference: u64,
}

enum Slot {
    Index(Rc<RefCell<Vec<Value>>>, usize),
    Key(Rc<RefCell<BTreeMap<String, Value>>>, String),
}

impl<'a> Decoder<'a> {
    fn new(options: &'a DeserializeOptions, registry: &'a Registry) -> Self {
        Self {
            options,
            registry,
            references: HashMap::new(),
            patches: Vec::new(),
        }
    }

    fn walk(&mut self, node: &Document, depth: usize) -> Result<Value, DecodeError> {
        if depth > self.options.max_depth {
            return Err(DecodeError::DepthLimitExceeded(self.options.max_depth));
        }
        match node {
            Document::Null => Ok(Value::Null),
            Document::Bool(flag) => Ok(Value::Bool(*flag)),
            Document::Number(number) => Ok(number_value(number)),
            Document::String(text) => Ok(Value::string(text.as_str())),
            Document::Array(items) => self.walk_sequence(items, None, depth),
            Document::Object(map) => {
                if let Some(reference) = wire::reference_of(node) {
                    // A referenced sequence arrives as the carrier object.
                    if let Some(Document::Array(items)) = map.get(wire::PAYLOAD_KEY) {
                        return self.walk_sequence(items, Some(reference), depth);
                    }
                    return self.walk_mapping(map, Some(reference), depth);
                }
                if let Some(tag) = wire::tag_of(node) {
                    return self.walk_tagged(map, tag, depth);
                }
                if let Some(reference) = wire::pointer_of(node) {
                    // A pointer with no enclosing slot (the document root):
                    // its target must already exist.
                    return self.resolve(reference);
                }
                self.walk_mapping(map, None, depth)
            }
        }
    }

    fn walk_sequence(
        &mut self,
        items: &[Document],
        reference: Option<u64>,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        let cells = Rc::new(RefCell::new(Vec::with_capacity(items.len())));
        if let Some(reference) = reference {
            self.references
                .insert(reference, Value::Array(Rc::clone(&cells)));
        }
        for (index, item) in items.iter().enumerate() {
            let child = if let Some(target) = wire::pointer_of(item) {
                self.resolve_or_defer(target, || Slot::Index(Rc::clone(&cells), index))
            } else {
                self.walk(item, depth + 1)?
            };
            cells.borrow_mut().push(child);
        }
        Ok(Value::Array(cells))
    }

    fn walk_mapping(
        &mut self,
        map: &Map<String, Document>,
        reference: Option<u64>,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        let entries = Rc::new(RefCell::new(BTreeMap::new()));
        if let Some(reference) = reference {
            self.references
                .insert(reference, Value::Object(Rc::clone(&entries)));
        }
        for (key, item) in map {
            if key == wire::REF_KEY {
                continue;
            }
            let child = if let Some(target) = wire::pointer_of(item) {
                self.resolve_or_defer(target, || Slot::Key(Rc::clone(&entries), key.clone()))
            } else {
                self.walk(item, depth + 1)?
            };
            entries.borrow_mut().insert(key.clone(), child);
        }
        Ok(Value::Object(entries))
    }

    fn walk_tagged(
        &mut self,
        map: &Map<String, Document>,
        tag: &str,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        let payload = match map.get(wire::PAYLOAD_KEY) {
            Some(node) => {
                if let Some(target) = wire::pointer_of(node) {
                    // A payload-root pointer has no slot to patch. Containers
                    // are registered before their children, so a legal
                    // back-reference already resolves here.
                    self.resolve(target)?
                } else {
                    self.walk(node, depth + 1)?
                }
            }
            None => Value::Null,
        };
        match self.registry.by_tag(tag) {
            Some(converter) => match (converter.rebuild)(payload.clone()) {
                Ok(value) => Ok(value),
                // A payload the converter rejects stays around as plain data.
                Err(_) => Ok(payload),
            },
            None => Ok(payload),
        }
    }

    /// Resolves a slot pointer on the spot when its target already exists;
    /// otherwise records a patch and leaves a placeholder.
    fn resolve_or_defer(&mut self, target: u64, slot: impl FnOnce() -> Slot) -> Value {
        match self.references.get(&target) {
            Some(existing) => existing.clone(),
            None => {
                self.patches.push(Patch {
                    slot: slot(),
                    reference: target,
                });
                Value::Null
            }
        }
    }

    fn resolve(&self, reference: u64) -> Result<Value, DecodeError> {
        self.references
            .get(&reference)
            .cloned()
            .ok_or(DecodeError::DanglingPointer(reference))
    }

    fn apply_patches(&mut self) -> Result<(), DecodeError> {
        for patch in std::mem::take(&mut self.patches) {
            let target = self.resolve(patch.reference)?;
            match patch.slot {
                Slot::Index(cells, index) => cells.borrow_mut()[index] = target,
                Slot::Key(entries, key) => {
                    entries.borrow_mut().insert(key, target);
                }
            }
        }
        Ok(())
    }
}

/// Integers stay integral when they fit; everything else becomes a float.
fn number_value(number: &Number) -> Value {
    if let Some(int) = number.as_i64() {
        Value::Int(int)
    } else if let Some(float) = number.as_f64() {
        Value::Float(float)
    } else {
        Value::Null
    }
}
