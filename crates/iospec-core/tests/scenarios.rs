//! Integration tests: end-to-end boundary scenarios through the public API.
//!
//! Each test builds schemas the way an application would (shorthand in Rust,
//! or a JSON document) and drives them through `Processor` / `Manager`.

use iospec_core::{
    normalize_json, CoercionRegistry, Direction, IospecError, KeyedSelector, Manager,
    ManagerBuilder, MappingSpec, Processor, RawSpec, ScalarType, SpecNode, TypeCheck,
    TypeCheckRegistry, Value, ViolationKind,
};
use serde_json::json;

fn str_to_int() -> CoercionRegistry {
    CoercionRegistry::new().with(ScalarType::Int, |value, _| {
        if let Value::Str(s) = &value {
            if let Ok(n) = s.parse::<i64>() {
                return Value::Int(n);
            }
        }
        value
    })
}

fn person() -> RawSpec {
    RawSpec::mapping([
        ("name", RawSpec::from(ScalarType::Str)),
        ("age", RawSpec::optional_with_default(ScalarType::Int, 0i64)),
    ])
}

#[test]
fn test_absent_optional_gets_default() {
    let manager = ManagerBuilder::new().input_spec(person()).build().unwrap();
    let out = manager
        .process_input(&Value::map([("name", "Ann")]))
        .unwrap();
    assert_eq!(
        out,
        Value::from(json!({"name": "Ann", "age": 0}))
    );
}

#[test]
fn test_extra_key_reported_once() {
    let manager = ManagerBuilder::new().input_spec(person()).build().unwrap();
    let err = manager
        .process_input(&Value::from(json!({"name": "Ann", "extra": 1})))
        .unwrap_err();
    assert!(err.is_input());
    assert_eq!(
        err.messages(),
        vec![("extra".to_string(), "unexpected key".to_string())]
    );
    assert_eq!(err.to_string(), "Invalid input.\n  extra: unexpected key");
}

#[test]
fn test_list_of_int_with_string_coercer() {
    let manager = ManagerBuilder::new()
        .input_spec(RawSpec::sequence([ScalarType::Int]))
        .input_coercions(str_to_int())
        .build()
        .unwrap();
    let out = manager
        .process_input(&Value::from(json!(["1", 2, "3"])))
        .unwrap();
    assert_eq!(out, Value::from(json!([1, 2, 3])));
}

#[test]
fn test_tuple_arity_mismatch() {
    let manager = ManagerBuilder::new()
        .input_spec(RawSpec::sequence([ScalarType::Str, ScalarType::Int]))
        .build()
        .unwrap();
    let err = manager
        .process_input(&Value::from(json!(["a", "b", "c"])))
        .unwrap_err();
    assert_eq!(err.violations().len(), 1);
    assert_eq!(err.violations().violations()[0].kind, ViolationKind::LengthMismatch);
    assert_eq!(err.violations().violations()[0].message, "expected 2 elements, got 3");
}

#[test]
fn test_required_fails_where_optional_default_passes() {
    let required = Processor::input(RawSpec::mapping([("age", ScalarType::Int)])).unwrap();
    let optional = Processor::input(RawSpec::mapping([(
        "age",
        RawSpec::optional_with_default(ScalarType::Int, 0i64),
    )]))
    .unwrap();
    let empty = Value::from(json!({}));
    assert!(required.verify(&required.coerce(&empty)).is_err());
    assert!(optional.verify(&optional.coerce(&empty)).is_ok());
}

#[test]
fn test_unlimited_toggles_extra_keys() {
    let value = Value::from(json!({"a": 1, "b": 2}));
    let closed = Processor::input(SpecNode::from(
        MappingSpec::new().required("a", ScalarType::Int),
    ))
    .unwrap();
    let open = Processor::input(SpecNode::from(
        MappingSpec::new().required("a", ScalarType::Int).unlimited(),
    ))
    .unwrap();
    assert!(closed.verify(&value).is_err());
    assert!(open.verify(&value).is_ok());
}

#[test]
fn test_output_direction_failure() {
    let manager = ManagerBuilder::new()
        .output_spec(RawSpec::mapping([("id", ScalarType::Int)]))
        .build()
        .unwrap();
    let err = manager
        .process_output(&Value::from(json!({"id": "7"})))
        .unwrap_err();
    assert_eq!(err.direction(), Direction::Output);
    let top: IospecError = err.into();
    assert!(matches!(top, IospecError::OutputVerification(_)));
}

#[test]
fn test_json_schema_document() {
    let spec = normalize_json(&json!({
        "user": {"name": "str", "emails": ["str"]},
        "point": ["float", "float"],
        "meta": {"$optional": {"*": "any"}},
    }))
    .unwrap();
    let processor = Processor::input(spec).unwrap();
    let ok = Value::from(json!({
        "user": {"name": "Ann", "emails": ["a@x", "b@x"]},
        "point": [1.5, 2.5],
    }));
    assert!(processor.verify(&ok).is_ok());

    let bad = Value::from(json!({
        "user": {"name": "Ann", "emails": ["a@x", 3]},
        "point": [1.5],
        "meta": 5,
    }));
    let paths: Vec<String> = processor
        .verify(&bad)
        .unwrap_err()
        .violations()
        .iter()
        .map(|v| v.path.to_string())
        .collect();
    assert_eq!(paths, vec!["meta", "point", "user.emails[1]"]);
}

#[test]
fn test_type_checks_force_success_and_failure() {
    let checks = TypeCheckRegistry::new().with(ScalarType::Str, |value, _| match value {
        Value::Str(s) if s.trim().is_empty() => Some(TypeCheck::Failure),
        Value::Uuid(_) => Some(TypeCheck::Success),
        _ => None,
    });
    let manager = ManagerBuilder::new()
        .input_spec(RawSpec::mapping([("name", ScalarType::Str)]))
        .type_checks(checks)
        .build()
        .unwrap();
    assert!(manager.verify_input(&Value::map([("name", "   ")])).is_err());
    assert!(manager
        .verify_input(&Value::map([("name", uuid::Uuid::nil())]))
        .is_ok());
    assert!(manager.verify_input(&Value::map([("name", "Ann")])).is_ok());
}

#[test]
fn test_versioned_manager() {
    let v2 = Processor::input(RawSpec::mapping([
        ("name", RawSpec::from(ScalarType::Str)),
        ("email", RawSpec::from(ScalarType::Str)),
    ]))
    .unwrap();
    let manager: Manager<str> = ManagerBuilder::new()
        .input_spec(person())
        .build_with_selector(KeyedSelector::new().input("v2".to_string(), v2))
        .unwrap();

    let v1_body = Value::from(json!({"name": "Ann"}));
    assert!(manager.process_input_for(&v1_body, "v1").is_ok());
    let err = manager.process_input_for(&v1_body, "v2").unwrap_err();
    assert_eq!(
        err.messages(),
        vec![("email".to_string(), "missing required key".to_string())]
    );
}

#[test]
fn test_managers_shared_across_threads() {
    let manager = ManagerBuilder::new()
        .input_spec(RawSpec::sequence([ScalarType::Int]))
        .input_coercions(str_to_int())
        .build()
        .unwrap();
    let handles: Vec<_> = (0..4i64)
        .map(|i| {
            let m = manager.clone();
            std::thread::spawn(move || m.process_input(&Value::list([i.to_string()])))
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.join().unwrap().unwrap();
        assert_eq!(out, Value::list([i as i64]));
    }
}

#[test]
fn test_mistyped_default_fails_at_configuration() {
    let schema = json!({
        "name": "str",
        "nick": {"$optional": "str", "$default": null},
    });
    let spec = RawSpec::from_json(&schema).unwrap();
    let err = ManagerBuilder::new()
        .input_spec(spec.clone())
        .build()
        .unwrap_err();
    assert!(err.to_string().starts_with("invalid default at nick"));
    assert!(ManagerBuilder::new().output_spec(spec).build().is_err());

    // With a well-typed default, coercing a valid value keeps it valid.
    let manager = ManagerBuilder::new()
        .input_spec(normalize_json(&json!({
            "name": "str",
            "nick": {"$optional": "str", "$default": ""},
        }))
        .unwrap())
        .build()
        .unwrap();
    let value = Value::map([("name", "Ann")]);
    assert!(manager.verify_input(&value).is_ok());
    assert_eq!(
        manager.process_input(&value).unwrap(),
        Value::map([("name", "Ann"), ("nick", "")])
    );
}
