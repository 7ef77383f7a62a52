//! # Coercion Engine
//!
//! Best-effort conversion of a raw value toward the shape of a
//! [`SpecNode`] tree. The walk mirrors verification, but never fails:
//! anything it cannot convert is returned unchanged and left for
//! verification to report.
//!
//! Optional entries that are absent get their declared default. Sequences
//! keep their container kind, so a tuple stays a tuple.

use crate::registry::CoercionRegistry;
use crate::spec::{MappingSpec, SpecNode};
use crate::value::{Map, Value};

/// Coerce `value` toward `spec` using `registry`. Returns a new tree.
pub fn coerce(value: &Value, spec: &SpecNode, registry: &CoercionRegistry) -> Value {
    match spec {
        SpecNode::Scalar(ty) => registry.apply(value.clone(), *ty),
        SpecNode::Required(inner) | SpecNode::Optional { inner, .. } => {
            coerce(value, inner, registry)
        }
        SpecNode::Mapping(mapping) => match value {
            Value::Map(map) => Value::Map(coerce_mapping(map, mapping, registry)),
            other => other.clone(),
        },
        SpecNode::ListOf(element) => match value {
            Value::List(items) => Value::List(coerce_each(items, element, registry)),
            Value::Tuple(items) => Value::Tuple(coerce_each(items, element, registry)),
            other => other.clone(),
        },
        SpecNode::TupleOf(elements) => match value {
            Value::List(items) if items.len() == elements.len() => {
                Value::List(coerce_positions(items, elements, registry))
            }
            Value::Tuple(items) if items.len() == elements.len() => {
                Value::Tuple(coerce_positions(items, elements, registry))
            }
            other => other.clone(),
        },
    }
}

/// Coerce a mapping entry that may be absent. An absent optional entry
/// yields its default; any other absent entry stays absent.
fn coerce_entry(value: Option<&Value>, spec: &SpecNode, registry: &CoercionRegistry) -> Option<Value> {
    match value {
        Some(v) => Some(coerce(v, spec, registry)),
        None => spec.default_value().cloned(),
    }
}

fn coerce_mapping(map: &Map, spec: &MappingSpec, registry: &CoercionRegistry) -> Map {
    let mut out = Map::new();
    for (key, entry) in spec.entries() {
        if let Some(v) = coerce_entry(map.get(key), entry, registry) {
            out.insert(key.clone(), v);
        }
    }
    for (key, v) in map {
        if spec.entries().contains_key(key) {
            continue;
        }
        let coerced = match spec.extra_key_spec() {
            Some(Some(extra)) => coerce(v, extra, registry),
            _ => v.clone(),
        };
        out.insert(key.clone(), coerced);
    }
    out
}

fn coerce_each(items: &[Value], element: &SpecNode, registry: &CoercionRegistry) -> Vec<Value> {
    items.iter().map(|item| coerce(item, element, registry)).collect()
}

fn coerce_positions(items: &[Value], elements: &[SpecNode], registry: &CoercionRegistry) -> Vec<Value> {
    items
        .iter()
        .zip(elements)
        .map(|(item, element)| coerce(item, element, registry))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::registry::MessageRegistry;
    use crate::spec::ScalarType::{self, Bool, Float, Int, Str};
    use crate::verify::verify;
    use proptest::prelude::*;

    /// Coerces numeric strings to int, and leaves everything else alone.
    fn registry() -> CoercionRegistry {
        CoercionRegistry::new().with(Int, |value: Value, _ty: ScalarType| {
            if let Value::Str(s) = &value {
                if let Ok(n) = s.parse::<i64>() {
                    return Value::Int(n);
                }
            }
            value
        })
    }

    fn spec() -> SpecNode {
        SpecNode::from(
            MappingSpec::new()
                .required("id", Int)
                .required("name", Str)
                .optional_with_default("active", Bool, true)
                .required("scores", SpecNode::list_of(Float))
                .required("pair", SpecNode::tuple_of([Str, Int]))
                .unlimited_of(Str),
        )
    }

    /// Values that already match [`spec`].
    fn matching_value() -> impl Strategy<Value = Value> {
        (
            any::<i64>(),
            "[a-z]{0,8}",
            proptest::option::of(any::<bool>()),
            proptest::collection::vec(-1.0e6f64..1.0e6, 0..5),
            ("[a-z]{0,4}", any::<i64>()),
            proptest::collection::btree_map("x[a-z]{1,4}", "[a-z]{0,4}", 0..3),
        )
            .prop_map(|(id, name, active, scores, (p0, p1), extras)| {
                let mut map = Map::new();
                map.insert("id".into(), Value::Int(id));
                map.insert("name".into(), Value::Str(name));
                if let Some(a) = active {
                    map.insert("active".into(), Value::Bool(a));
                }
                map.insert("scores".into(), Value::list(scores));
                map.insert("pair".into(), Value::list([Value::Str(p0), Value::Int(p1)]));
                for (k, v) in extras {
                    map.insert(k, Value::Str(v));
                }
                Value::Map(map)
            })
    }

    proptest! {
        #[test]
        fn verify_after_coerce_succeeds(value in matching_value()) {
            let spec = spec();
            let coerced = coerce(&value, &spec, &registry());
            prop_assert!(verify(&coerced, &spec, &MessageRegistry::new()).is_ok());
        }

        #[test]
        fn coercion_is_idempotent(value in matching_value()) {
            let spec = spec();
            let reg = registry();
            let once = coerce(&value, &spec, &reg);
            let twice = coerce(&once, &spec, &reg);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn typed_scalars_unchanged(n in any::<i64>()) {
            let v = Value::Int(n);
            prop_assert_eq!(coerce(&v, &SpecNode::Scalar(Int), &registry()), v);
        }

        #[test]
        fn numeric_strings_coerced_in_lists(ns in proptest::collection::vec(any::<i64>(), 0..8)) {
            let raw = Value::list(ns.iter().map(|n| Value::Str(n.to_string())));
            let out = coerce(&raw, &SpecNode::list_of(Int), &registry());
            prop_assert_eq!(out, Value::list(ns));
        }
    }
}
