//! Value graphs the engine serializes and reconstructs.
//!
//! # Identity
//! Sequences and mappings are `Rc<RefCell<...>>`: cloning a [`Value`] shares
//! the backing allocation, and that allocation's address is the identity the
//! serializer tracks. Graphs may therefore share sub-structures and contain
//! cycles. [`PartialEq`] and the derived `Debug` walk structurally and expect
//! acyclic input; cyclic graphs are compared by identity (`Rc::ptr_eq`)
//! instead.

pub mod error;
pub mod regex;

pub use error::ScriptError;
pub use self::regex::ScriptRegex;

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// In-memory value the engine serializes and reconstructs.
///
/// Scalars are unboxed; strings and composites are `Rc`-backed so cloning is
/// O(1) and shares structure. `Array` and `Object` additionally use `RefCell`
/// because reconstructed graphs are patched in place after the document walk.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Instant in time, milliseconds since the Unix epoch.
    Date(i64),
    /// UTF-8 string value.
    String(Rc<str>),
    /// Ordered sequence of values.
    Array(Rc<RefCell<Vec<Value>>>),
    /// String-keyed mapping; ordered iteration keeps serialization deterministic.
    Object(Rc<RefCell<BTreeMap<String, Value>>>),
    /// Script error carrying name, message, and optional stack text.
    Error(Rc<ScriptError>),
    /// Regex carrying a mutable match-state cursor.
    Regex(Rc<ScriptRegex>),
    /// Extension instance handled by a registered converter.
    Opaque(Rc<dyn OpaqueValue>),
}

/// Extension hook for values outside the built-in set.
///
/// Implementations surface a stable type label and a `dyn Any` view their
/// converter downcasts during decomposition.
pub trait OpaqueValue: fmt::Debug {
    /// Label reported by [`Value::type_name`] and used in the
    /// unregistered-type placeholder.
    fn type_name(&self) -> &'static str;

    /// Downcast hook for converters.
    fn as_any(&self) -> &dyn Any;
}

/// Identity of one `Rc` allocation, valid while the allocation is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(usize);

impl ValueId {
    pub(crate) fn of<T: ?Sized>(rc: &Rc<T>) -> ValueId {
        ValueId(Rc::as_ptr(rc) as *const () as usize)
    }
}

impl Value {
    /// Builds an `Array` value from items.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Builds an `Object` value from key/value pairs.
    pub fn object<I, K>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(Rc::new(RefCell::new(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )))
    }

    /// Builds a `String` value.
    pub fn string(text: impl Into<Rc<str>>) -> Value {
        Value::String(text.into())
    }

    /// Identity of this value's backing allocation, for `Array` and `Object`.
    ///
    /// Scalars and opaque instances carry no tracked identity and return
    /// `None`.
    pub fn composite_id(&self) -> Option<ValueId> {
        match self {
            Value::Array(items) => Some(ValueId::of(items)),
            Value::Object(entries) => Some(ValueId::of(entries)),
            _ => None,
        }
    }

    /// Returns the canonical type label used in diagnostics and placeholders.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Date(_) => "Date",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
            Value::Error(_) => "Error",
            Value::Regex(_) => "RegExp",
            Value::Opaque(value) => value.type_name(),
        }
    }
}

/// Structural equality with an identity shortcut: composites backed by the
/// same allocation compare equal without descending. Requires acyclic input
/// (see module docs). Opaque instances compare by identity only.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Object(a), Value::Object(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}
