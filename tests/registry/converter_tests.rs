use std::any::Any;
use std::rc::Rc;

use ravel::{
    Converter, DeserializeOptions, OpaqueValue, Registry, ScriptError, ScriptRegex,
    SerializeOptions, Value, deserialize, deserialize_with_registry, serialize,
    serialize_with_options, serialize_with_registry,
};

/// Serializes, crosses a JSON text boundary, and reconstructs.
fn full_cycle(value: &Value) -> Value {
    let document = serialize(value).expect("serializes");
    let text = serde_json::to_string(&document).expect("document is plain JSON");
    let parsed = serde_json::from_str(&text).expect("text parses back");
    deserialize(&parsed).expect("deserializes")
}

/// Raises the error from a named frame so stack assertions have a symbol to
/// look for.
#[inline(never)]
fn produce_error(message: &str) -> Value {
    Value::Error(Rc::new(ScriptError::new(message)))
}

fn expect_error(value: &Value) -> Rc<ScriptError> {
    match value {
        Value::Error(error) => Rc::clone(error),
        _ => panic!("expected error value, got {}", value.type_name()),
    }
}

fn expect_regex(value: &Value) -> Rc<ScriptRegex> {
    match value {
        Value::Regex(regex) => Rc::clone(regex),
        _ => panic!("expected regex value, got {}", value.type_name()),
    }
}

#[test]
fn test_error_name_and_message_survive() {
    let round = full_cycle(&produce_error("boom"));
    let error = expect_error(&round);
    assert_eq!(error.name(), "Error");
    assert_eq!(error.message(), "boom");
    assert_eq!(error.to_string(), "Error: boom");
}

#[test]
fn test_error_custom_name_survives() {
    let value = Value::Error(Rc::new(ScriptError::with_name(
        "TypeError",
        "x is not a function",
    )));
    let error = expect_error(&full_cycle(&value));
    assert_eq!(error.name(), "TypeError");
    assert_eq!(error.to_string(), "TypeError: x is not a function");
}

#[test]
fn test_error_stack_names_the_raising_frame() {
    let round = full_cycle(&produce_error("boom"));
    let error = expect_error(&round);
    let stack = error.stack().expect("stack captured by default");
    assert!(stack.starts_with("Stack trace:"));
    assert!(
        stack.contains("produce_error"),
        "expected the raising frame in:\n{stack}"
    );
}

#[test]
fn test_error_stack_is_suppressed_on_request() {
    let quiet = SerializeOptions {
        stack: false,
        ..SerializeOptions::default()
    };
    let document = serialize_with_options(&produce_error("boom"), &quiet).expect("serializes");
    assert!(
        !document.to_string().contains("produce_error"),
        "suppressed stack must not reach the wire"
    );

    let error = expect_error(&deserialize(&document).expect("deserializes"));
    assert_eq!(error.message(), "boom");
    assert_eq!(error.stack(), None);
}

#[test]
fn test_error_nested_in_plain_data() {
    let value = Value::object([
        ("ok", Value::Bool(false)),
        ("problem", produce_error("nested failure")),
    ]);
    let round = full_cycle(&value);
    match &round {
        Value::Object(entries) => {
            let entries = entries.borrow();
            assert_eq!(entries.get("ok"), Some(&Value::Bool(false)));
            let error = expect_error(entries.get("problem").expect("field kept"));
            assert_eq!(error.message(), "nested failure");
        }
        _ => panic!("expected object"),
    }
}

#[test]
fn test_regex_cursor_resumes_where_the_original_stopped() {
    let regex = ScriptRegex::new(r"\d+", "g").expect("compiles");
    let haystack = "ab12cd34";
    assert_eq!(regex.find_next(haystack).expect("first match").as_str(), "12");
    assert_eq!(regex.last_index(), 4);

    let round = full_cycle(&Value::Regex(Rc::new(regex)));
    let restored = expect_regex(&round);
    assert_eq!(restored.last_index(), 4, "cursor must not reset to 0");
    assert_eq!(restored.source(), r"\d+");
    assert_eq!(restored.flags(), "g");

    let next = restored.find_next(haystack).expect("resumes past 12");
    assert_eq!(next.as_str(), "34");
    assert_eq!(next.start(), 6);
}

#[test]
fn test_regex_flags_survive() {
    let regex = ScriptRegex::new("abc", "i").expect("compiles");
    let restored = expect_regex(&full_cycle(&Value::Regex(Rc::new(regex))));
    assert_eq!(restored.flags(), "i");
    assert!(restored.is_match("xABCx"));
}

#[test]
fn test_date_survives() {
    let round = full_cycle(&Value::Date(1_690_000_000_123));
    assert_eq!(round, Value::Date(1_690_000_000_123));
}

#[derive(Debug)]
struct Temperature {
    celsius: f64,
}

impl OpaqueValue for Temperature {
    fn type_name(&self) -> &'static str {
        "Temperature"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn match_temperature(value: &Value) -> bool {
    matches!(value, Value::Opaque(inner) if inner.as_any().is::<Temperature>())
}

fn decompose_temperature(value: &Value, _options: &SerializeOptions) -> Value {
    let Value::Opaque(inner) = value else {
        return Value::Null;
    };
    match inner.as_any().downcast_ref::<Temperature>() {
        Some(temperature) => Value::object([("celsius", Value::Float(temperature.celsius))]),
        None => Value::Null,
    }
}

fn rebuild_temperature(payload: Value) -> Result<Value, String> {
    let Value::Object(entries) = &payload else {
        return Err("Temperature payload must be an object".to_string());
    };
    let celsius = match entries.borrow().get("celsius") {
        Some(Value::Float(celsius)) => *celsius,
        Some(Value::Int(celsius)) => *celsius as f64,
        _ => return Err("Temperature payload is missing \"celsius\"".to_string()),
    };
    Ok(Value::Opaque(Rc::new(Temperature { celsius })))
}

fn temperature_converter() -> Converter {
    Converter {
        tag: "Temperature",
        matches: match_temperature,
        decompose: decompose_temperature,
        rebuild: rebuild_temperature,
    }
}

#[test]
fn test_custom_converter_round_trips_through_text() {
    let mut registry = Registry::with_builtins();
    registry.register(temperature_converter()).expect("fresh tag");

    let value = Value::object([
        ("sensor", Value::string("kitchen")),
        ("reading", Value::Opaque(Rc::new(Temperature { celsius: 21.5 }))),
    ]);

    let document =
        serialize_with_registry(&value, &SerializeOptions::default(), &registry)
            .expect("serializes");
    let text = serde_json::to_string(&document).expect("document is plain JSON");
    let parsed: serde_json::Value = serde_json::from_str(&text).expect("text parses back");
    let round =
        deserialize_with_registry(&parsed, &DeserializeOptions::default(), &registry)
            .expect("deserializes");

    match &round {
        Value::Object(entries) => {
            let entries = entries.borrow();
            match entries.get("reading") {
                Some(Value::Opaque(inner)) => {
                    let temperature = inner
                        .as_any()
                        .downcast_ref::<Temperature>()
                        .expect("rebuilt as Temperature");
                    assert_eq!(temperature.celsius, 21.5);
                }
                other => panic!("expected opaque reading, got {other:?}"),
            }
        }
        _ => panic!("expected object"),
    }
}

#[test]
fn test_unregistered_opaque_degrades_to_placeholder() {
    let registry = Registry::with_builtins();
    let value = Value::array(vec![
        Value::Opaque(Rc::new(Temperature { celsius: 3.0 })),
        Value::Int(1),
    ]);
    let document =
        serialize_with_registry(&value, &SerializeOptions::default(), &registry)
            .expect("serialization never fails on unsupported input");
    assert_eq!(document, serde_json::json!(["<Temperature>", 1]));
}

#[test]
fn test_repeated_opaque_instance_serializes_as_repeated_payloads() {
    // Opaque instances carry no tracked identity; each occurrence is
    // decomposed independently and both survive the trip.
    let error = produce_error("twice");
    let value = Value::array(vec![error.clone(), error]);
    let round = full_cycle(&value);
    match &round {
        Value::Array(items) => {
            let items = items.borrow();
            assert_eq!(expect_error(&items[0]).message(), "twice");
            assert_eq!(expect_error(&items[1]).message(), "twice");
        }
        _ => panic!("expected array"),
    }
}

#[derive(Debug)]
struct Wrapper {
    inner: Value,
}

impl OpaqueValue for Wrapper {
    fn type_name(&self) -> &'static str {
        "Wrapper"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn match_wrapper(value: &Value) -> bool {
    matches!(value, Value::Opaque(inner) if inner.as_any().is::<Wrapper>())
}

fn decompose_wrapper(value: &Value, _options: &SerializeOptions) -> Value {
    let Value::Opaque(inner) = value else {
        return Value::Null;
    };
    match inner.as_any().downcast_ref::<Wrapper>() {
        Some(wrapper) => Value::object([("inner", wrapper.inner.clone())]),
        None => Value::Null,
    }
}

fn rebuild_wrapper(payload: Value) -> Result<Value, String> {
    let Value::Object(entries) = &payload else {
        return Err("Wrapper payload must be an object".to_string());
    };
    let inner = entries
        .borrow()
        .get("inner")
        .cloned()
        .ok_or_else(|| "Wrapper payload is missing \"inner\"".to_string())?;
    Ok(Value::Opaque(Rc::new(Wrapper { inner })))
}

#[test]
fn test_decomposition_may_share_structure_with_the_graph() {
    let mut registry = Registry::with_builtins();
    registry
        .register(Converter {
            tag: "Wrapper",
            matches: match_wrapper,
            decompose: decompose_wrapper,
            rebuild: rebuild_wrapper,
        })
        .expect("fresh tag");

    // The wrapped composite is also reachable directly, so its occurrence
    // inside the converter payload becomes a pointer on the wire.
    let shared = Value::object([("v", Value::Int(7))]);
    let value = Value::object([
        ("plain", shared.clone()),
        ("wrapped", Value::Opaque(Rc::new(Wrapper { inner: shared }))),
    ]);

    let document = serialize_with_registry(&value, &SerializeOptions::default(), &registry)
        .expect("serializes");
    let round = deserialize_with_registry(&document, &DeserializeOptions::default(), &registry)
        .expect("deserializes");

    let (plain, wrapped_inner) = match &round {
        Value::Object(entries) => {
            let entries = entries.borrow();
            let plain = entries.get("plain").cloned().expect("plain kept");
            let wrapped_inner = match entries.get("wrapped") {
                Some(Value::Opaque(inner)) => inner
                    .as_any()
                    .downcast_ref::<Wrapper>()
                    .expect("rebuilt as Wrapper")
                    .inner
                    .clone(),
                other => panic!("expected opaque wrapper, got {other:?}"),
            };
            (plain, wrapped_inner)
        }
        _ => panic!("expected object"),
    };

    match (&plain, &wrapped_inner) {
        (Value::Object(left), Value::Object(right)) => {
            assert!(Rc::ptr_eq(left, right), "payload pointer must rewire sharing");
        }
        _ => panic!("expected objects, got {plain:?} and {wrapped_inner:?}"),
    }
}
