//! Integration tests: web presets driven through processors, managers and
//! YAML configuration.

use chrono::{TimeZone, Utc};
use iospec_core::{ManagerConfig, RawSpec, ScalarType, Value};
use iospec_web::{input_processor, manager, output_processor, WebPresets};
use serde_json::json;
use uuid::Uuid;

fn cycle(ty: ScalarType, start: Value) -> Value {
    let spec = RawSpec::mapping([("value", ty)]);
    let output = output_processor(spec.clone()).unwrap();
    let input = input_processor(spec).unwrap();
    let exported = output.coerce(&Value::map([("value", start)]));
    let imported = input.coerce(&exported);
    imported.get("value").cloned().unwrap_or(Value::Null)
}

#[test]
fn test_datetime_cycle() {
    let start = Value::from(Utc::now());
    assert_eq!(cycle(ScalarType::DateTime, start.clone()), start);
}

#[test]
fn test_uuid_cycle() {
    let start = Value::from(Uuid::new_v4());
    assert_eq!(cycle(ScalarType::Uuid, start.clone()), start);
}

#[test]
fn test_request_response_round() {
    let m = manager(
        RawSpec::mapping([
            ("id", RawSpec::from(ScalarType::Uuid)),
            ("amount", RawSpec::from(ScalarType::Decimal)),
            ("when", RawSpec::optional(ScalarType::DateTime)),
        ]),
        RawSpec::mapping([
            ("id", RawSpec::from(ScalarType::Uuid)),
            ("created", RawSpec::from(ScalarType::DateTime)),
        ]),
    )
    .unwrap();

    let id = Uuid::new_v4();
    let request = Value::from(json!({
        "id": id.to_string(),
        "amount": 250,
        "when": "2026-03-01T09:30:00Z",
    }));
    let parsed = m.process_input(&request).unwrap();
    assert_eq!(parsed.get("id"), Some(&Value::Uuid(id)));
    assert!(matches!(parsed.get("amount"), Some(Value::Decimal(_))));
    assert!(matches!(parsed.get("when"), Some(Value::DateTime(_))));

    let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
    let response = Value::map([("id", Value::Uuid(id)), ("created", Value::from(created))]);
    let body = m.process_output(&response).unwrap();
    assert_eq!(
        body.to_json(),
        json!({"id": id.to_string(), "created": "2026-03-01T09:30:00Z"})
    );
}

#[test]
fn test_bad_uuid_is_reported() {
    let m = manager(RawSpec::mapping([("id", ScalarType::Uuid)]), ScalarType::Any).unwrap();
    let err = m
        .process_input(&Value::from(json!({"id": "not-a-uuid"})))
        .unwrap_err();
    assert_eq!(
        err.messages(),
        vec![("id".to_string(), "expected 'uuid'; got 'str'".to_string())]
    );
}

#[test]
fn test_output_rejects_unexported_strings() {
    // Output verifies before coercing: producers must hand over real uuids.
    let m = manager(ScalarType::Any, RawSpec::mapping([("id", ScalarType::Uuid)])).unwrap();
    assert!(m
        .process_output(&Value::from(json!({"id": Uuid::nil().to_string()})))
        .is_err());
}

#[test]
fn test_yaml_config_with_web_presets() {
    let config: ManagerConfig = serde_yaml::from_str(
        r#"
coercions: [web]
input:
  schema: { page: int, ids: [uuid] }
  coercions: [form]
output:
  schema: { total: decimal }
"#,
    )
    .unwrap();
    let m = config.build(&WebPresets).unwrap();

    let id = Uuid::new_v4();
    let query = Value::map([
        ("page", Value::from("3")),
        ("ids", Value::list([id.to_string()])),
    ]);
    let parsed = m.process_input(&query).unwrap();
    assert_eq!(parsed.get("page"), Some(&Value::Int(3)));
    assert_eq!(parsed.get("ids"), Some(&Value::list([Value::Uuid(id)])));

    let out = m
        .process_output(&Value::map([("total", rust_decimal::Decimal::new(1999, 2))]))
        .unwrap();
    assert_eq!(out, Value::map([("total", "19.99")]));
}
