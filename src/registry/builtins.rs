//! Built-in converters: `Error`, `RegExp`, and `Date`.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::options::SerializeOptions;
use crate::value::{ScriptError, ScriptRegex, Value};

use super::Converter;

/// All built-in converters, in seeding order.
pub fn all() -> [Converter; 3] {
    [
        Converter {
            tag: "Error",
            matches: match_error,
            decompose: decompose_error,
            rebuild: rebuild_error,
        },
        Converter {
            tag: "RegExp",
            matches: match_regexp,
            decompose: decompose_regexp,
            rebuild: rebuild_regexp,
        },
        Converter {
            tag: "Date",
            matches: match_date,
            decompose: decompose_date,
            rebuild: rebuild_date,
        },
    ]
}

fn match_error(value: &Value) -> bool {
    matches!(value, Value::Error(_))
}

/// Flattens an error to `{name, message, stack?}`; `stack` is omitted when
/// the pass options suppress it.
fn decompose_error(value: &Value, options: &SerializeOptions) -> Value {
    let Value::Error(error) = value else {
        // Guarded by match_error.
        return Value::Null;
    };
    let mut fields = vec![
        ("name", Value::string(error.name())),
        ("message", Value::string(error.message())),
    ];
    if options.stack
        && let Some(stack) = error.stack()
    {
        fields.push(("stack", Value::string(stack)));
    }
    Value::object(fields)
}

/// Rebuilds an error, splicing transported stack text instead of capturing a
/// local stack.
fn rebuild_error(payload: Value) -> Result<Value, String> {
    let Value::Object(entries) = &payload else {
        return Err(format!(
            "Error payload must be an object, got {}",
            payload.type_name()
        ));
    };
    let entries = entries.borrow();
    let name = string_field(&entries, "name")?.unwrap_or_else(|| "Error".to_string());
    let message = string_field(&entries, "message")?.unwrap_or_default();
    let stack = string_field(&entries, "stack")?;
    Ok(Value::Error(Rc::new(ScriptError::with_stack(
        name, message, stack,
    ))))
}

fn match_regexp(value: &Value) -> bool {
    matches!(value, Value::Regex(_))
}

fn decompose_regexp(value: &Value, _options: &SerializeOptions) -> Value {
    let Value::Regex(regex) = value else {
        // Guarded by match_regexp.
        return Value::Null;
    };
    Value::object([
        ("source", Value::string(regex.source())),
        ("flags", Value::string(regex.flags())),
        ("lastIndex", Value::Int(regex.last_index() as i64)),
    ])
}

/// Recompiles the pattern and restores the cursor, so the next match resumes
/// where the original stopped.
fn rebuild_regexp(payload: Value) -> Result<Value, String> {
    let Value::Object(entries) = &payload else {
        return Err(format!(
            "RegExp payload must be an object, got {}",
            payload.type_name()
        ));
    };
    let entries = entries.borrow();
    let source = string_field(&entries, "source")?
        .ok_or_else(|| "RegExp payload is missing \"source\"".to_string())?;
    let flags = string_field(&entries, "flags")?.unwrap_or_default();
    let last_index = match entries.get("lastIndex") {
        None | Some(Value::Null) => 0,
        Some(Value::Int(index)) => usize::try_from(*index)
            .map_err(|_| format!("field \"lastIndex\" must be non-negative, got {index}"))?,
        Some(other) => {
            return Err(format!(
                "field \"lastIndex\" must be an integer, got {}",
                other.type_name()
            ));
        }
    };
    let regex = ScriptRegex::new(&source, &flags)?;
    regex.set_last_index(last_index);
    Ok(Value::Regex(Rc::new(regex)))
}

fn match_date(value: &Value) -> bool {
    matches!(value, Value::Date(_))
}

/// A date's payload is its bare epoch-millisecond integer.
fn decompose_date(value: &Value, _options: &SerializeOptions) -> Value {
    match value {
        Value::Date(millis) => Value::Int(*millis),
        // Guarded by match_date.
        _ => Value::Null,
    }
}

fn rebuild_date(payload: Value) -> Result<Value, String> {
    match payload {
        Value::Int(millis) => Ok(Value::Date(millis)),
        other => Err(format!(
            "Date payload must be an integer, got {}",
            other.type_name()
        )),
    }
}

/// Reads an optional string field, rejecting non-string occupants.
fn string_field(
    entries: &BTreeMap<String, Value>,
    key: &str,
) -> Result<Option<String>, String> {
    match entries.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.to_string())),
        Some(other) => Err(format!(
            "field {key:?} must be a string, got {}",
            other.type_name()
        )),
    }
}
