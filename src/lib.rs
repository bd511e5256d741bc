//! Bidirectional serialization of value graphs to JSON documents.
//!
//! ravel flattens an in-memory [`Value`] graph into a JSON-compatible
//! [`Document`] and reconstructs an equivalent graph from one. Graphs may
//! share sub-structure, contain cycles, and hold opaque runtime types such as
//! errors and regexes; shared and cyclic structure survives the trip, so
//! repeated references come back as one allocation rather than copies.
//!
//! ```
//! use ravel::{Value, deserialize, serialize};
//!
//! // `a` and `b` share one object.
//! let shared = Value::object([("n", Value::Int(1))]);
//! let root = Value::object([("a", shared.clone()), ("b", shared)]);
//!
//! let document = serialize(&root)?;
//! let rebuilt = deserialize(&document)?;
//! assert_eq!(rebuilt, root);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Opaque types are handled by [`Converter`]s looked up in a [`Registry`];
//! the process-wide registry ships with `Error`, `RegExp`, and `Date`
//! built in, and [`register_type`] extends it during setup.

pub mod decode;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod options;
pub mod registry;
pub mod value;
pub mod wire;

pub use decode::{deserialize, deserialize_with_options, deserialize_with_registry};
pub use encode::{serialize, serialize_with_options, serialize_with_registry};
pub use envelope::{CallEnvelope, LogEntry, LogLabel, ResultEnvelope};
pub use error::{DecodeError, EncodeError, RegistryError};
pub use options::{DEFAULT_MAX_DEPTH, DeserializeOptions, SerializeOptions};
pub use registry::{Converter, Registry, register_type};
pub use value::{OpaqueValue, ScriptError, ScriptRegex, Value, ValueId};
pub use wire::Document;
