//! Reserved wire-format literals and document-shape helpers.
//!
//! A document is plain JSON apart from the reserved object keys below:
//! tagged nodes wrap converted opaque instances, pointer nodes stand in for
//! repeated references, and pointed-to composites carry a reference id.
//! JSON arrays cannot hold extra fields, so a pointed-to sequence is wrapped
//! in a carrier object pairing the id with the items. Mappings whose own keys
//! collide with the reserved set are outside the format's domain.

use serde_json::Map;

/// JSON-compatible tree produced by serialization and accepted by
/// deserialization.
pub type Document = serde_json::Value;

/// Key carrying the registered type tag of a tagged node.
pub const CLASS_KEY: &str = "@ravel:class";

/// Key carrying a tagged node's payload, and a pointed-to sequence's items.
pub const PAYLOAD_KEY: &str = "@ravel:payload";

/// Key carrying a pointer to an already-emitted composite.
pub const POINTER_KEY: &str = "@ravel:ptr";

/// Key attaching a reference id to a pointed-to composite.
pub const REF_KEY: &str = "@ravel:ref";

/// Reads the type tag if `node` is a tagged node.
pub fn tag_of(node: &Document) -> Option<&str> {
    node.as_object()
        .and_then(|map| map.get(CLASS_KEY))
        .and_then(|tag| tag.as_str())
}

/// Reads the target id if `node` is a pointer node.
pub fn pointer_of(node: &Document) -> Option<u64> {
    node.as_object()
        .and_then(|map| map.get(POINTER_KEY))
        .and_then(|id| id.as_u64())
}

/// Reads the attached reference id if `node` carries one.
pub fn reference_of(node: &Document) -> Option<u64> {
    node.as_object()
        .and_then(|map| map.get(REF_KEY))
        .and_then(|id| id.as_u64())
}

/// Builds a tagged node.
pub fn tagged(tag: &str, payload: Document) -> Document {
    let mut map = Map::new();
    map.insert(CLASS_KEY.to_string(), Document::String(tag.to_string()));
    map.insert(PAYLOAD_KEY.to_string(), payload);
    Document::Object(map)
}

/// Builds a pointer node.
pub fn pointer(reference: u64) -> Document {
    let mut map = Map::new();
    map.insert(POINTER_KEY.to_string(), Document::from(reference));
    Document::Object(map)
}
