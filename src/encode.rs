//! Serialization: two deterministic passes over the value graph.
//!
//! The scan pass walks the graph once, keyed on composite identity, and
//! assigns a reference id to every sequence or mapping it reaches a second
//! time; shared sub-structure and cycles look the same to the scan. The emit
//! pass walks again in the same order: the first arrival at a referenced
//! composite writes its full node carrying `@ravel:ref`, every later arrival
//! writes a `@ravel:ptr` node. Opaque instances are decomposed once, during
//! the scan, and the retained decompositions are replayed by the emit pass so
//! both passes see the same allocations.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Number};

use crate::error::EncodeError;
use crate::options::SerializeOptions;
use crate::registry::{self, Registry};
use crate::value::{Value, ValueId};
use crate::wire::{self, Document};

/// Serializes `value` against the process-wide registry with default options.
pub fn serialize(value: &Value) -> Result<Document, EncodeError> {
    serialize_with_options(value, &SerializeOptions::default())
}

/// Serializes `value` against the process-wide registry.
pub fn serialize_with_options(
    value: &Value,
    options: &SerializeOptions,
) -> Result<Document, EncodeError> {
    let registry = registry::global();
    serialize_with_registry(value, options, &registry)
}

/// Serializes `value` against an explicit registry.
pub fn serialize_with_registry(
    value: &Value,
    options: &SerializeOptions,
    registry: &Registry,
) -> Result<Document, EncodeError> {
    let mut encoder = Encoder::new(options, registry);
    encoder.scan(value, 0)?;
    encoder.emit(value, 0)
}

struct Encoder<'a> {
    options: &'a SerializeOptions,
    registry: &'a Registry,
    /// Composites the scan has entered, by identity.
    visited: HashSet<ValueId>,
    /// Reference ids for composites reached more than once.
    shared: HashMap<ValueId, u64>,
    next_ref: u64,
    /// Scan-order opaque decompositions, replayed by the emit pass. Holding
    /// them here also keeps their allocations alive, so identities recorded
    /// during the scan stay valid through the emit.
    decomposed: Vec<Value>,
    /// Emit-pass cursor into `decomposed`.
    replay: usize,
    /// Referenced composites the emit pass has already written in full.
    emitted: HashSet<ValueId>,
}

impl<'a> Encoder<'a> {
    fn new(options: &'a SerializeOptions, registry: &'a Registry) -> Self {
        Self {
            options,
            registry,
            visited: HashSet::new(),
            shared: HashMap::new(),
            next_ref: 1,
            decomposed: Vec::new(),
            replay: 0,
            emitted: HashSet::new(),
        }
    }

    fn scan(&mut self, value: &Value, depth: usize) -> Result<(), EncodeError> {
        if depth > self.options.max_depth {
            return Err(EncodeError::DepthLimitExceeded(self.options.max_depth));
        }
        match value {
            Value::Array(items) => {
                if self.mark_repeat(ValueId::of(items)) {
                    return Ok(());
                }
                let items = items.borrow();
                for item in items.iter() {
                    self.scan(item, depth + 1)?;
                }
                Ok(())
            }
            Value::Object(entries) => {
                if self.mark_repeat(ValueId::of(entries)) {
                    return Ok(());
                }
                let entries = entries.borrow();
                for item in entries.values() {
                    self.scan(item, depth + 1)?;
                }
                Ok(())
            }
            Value::Date(_) | Value::Error(_) | Value::Regex(_) | Value::Opaque(_) => {
                if let Some(&converter) = self.registry.by_value(value) {
                    let decomposition = (converter.decompose)(value, self.options);
                    self.decomposed.push(decomposition.clone());
                    self.scan(&decomposition, depth + 1)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Records a visit. A repeat visit assigns the reference id (once) and
    /// returns true so the caller does not descend again.
    fn mark_repeat(&mut self, id: ValueId) -> bool {
        if self.visited.insert(id) {
            return false;
        }
        self.shared.entry(id).or_insert_with(|| {
            let assigned = self.next_ref;
            self.next_ref += 1;
            assigned
        });
        true
    }

    fn emit(&mut self, value: &Value, depth: usize) -> Result<Document, EncodeError> {
        if depth > self.options.max_depth {
            return Err(EncodeError::DepthLimitExceeded(self.options.max_depth));
        }
        match value {
            Value::Null => Ok(Document::Null),
            Value::Bool(flag) => Ok(Document::Bool(*flag)),
            Value::Int(number) => Ok(Document::from(*number)),
            Value::Float(number) => Ok(float_node(*number)),
            Value::String(text) => Ok(Document::String(text.to_string())),
            Value::Array(items) => {
                let id = ValueId::of(items);
                if let Some(pointer) = self.pointer_for(id) {
                    return Ok(pointer);
                }
                let items = items.borrow();
                let mut nodes = Vec::with_capacity(items.len());
                for item in items.iter() {
                    nodes.push(self.emit(item, depth + 1)?);
                }
                Ok(self.attach_reference(id, Document::Array(nodes)))
            }
            Value::Object(entries) => {
                let id = ValueId::of(entries);
                if let Some(pointer) = self.pointer_for(id) {
                    return Ok(pointer);
                }
                let entries = entries.borrow();
                let mut map = Map::with_capacity(entries.len());
                for (key, item) in entries.iter() {
                    map.insert(key.clone(), self.emit(item, depth + 1)?);
                }
                Ok(self.attach_reference(id, Document::Object(map)))
            }
            Value::Date(_) | Value::Error(_) | Value::Regex(_) | Value::Opaque(_) => {
                match self.registry.by_value(value) {
                    Some(&converter) => {
                        // Replay order matches scan order because the walks
                        // are identical.
                        let decomposition = self.decomposed[self.replay].clone();
                        self.replay += 1;
                        let payload = self.emit(&decomposition, depth + 1)?;
                        Ok(wire::tagged(converter.tag, payload))
                    }
                    None => Ok(Document::String(format!("<{}>", value.type_name()))),
                }
            }
        }
    }

    /// On re-arrival at an already-written referenced composite, the pointer
    /// node to write instead; on first arrival, `None` after marking it
    /// written, so a cycle back into the node takes the pointer branch while
    /// its children are still being walked.
    fn pointer_for(&mut self, id: ValueId) -> Option<Document> {
        let &reference = self.shared.get(&id)?;
        if self.emitted.insert(id) {
            None
        } else {
            Some(wire::pointer(reference))
        }
    }

    /// Attaches `@ravel:ref` to a composite node the scan marked as shared.
    /// Sequences become the carrier object because JSON arrays cannot hold
    /// extra fields.
    fn attach_reference(&self, id: ValueId, node: Document) -> Document {
        let Some(&reference) = self.shared.get(&id) else {
            return node;
        };
        match node {
            Document::Object(mut map) => {
                map.insert(wire::REF_KEY.to_string(), Document::from(reference));
                Document::Object(map)
            }
            other => {
                let mut map = Map::new();
                map.insert(wire::REF_KEY.to_string(), Document::from(reference));
                map.insert(wire::PAYLOAD_KEY.to_string(), other);
                Document::Object(map)
            }
        }
    }
}

/// Non-finite floats have no JSON representation and degrade to null.
fn float_node(number: f64) -> Document {
    match Number::from_f64(number) {
        Some(number) => Document::Number(number),
        None => Document::Null,
    }
}
