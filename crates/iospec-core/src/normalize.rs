//! # Shorthand Normalizer
//!
//! Turns authored schemas ([`RawSpec`]) into canonical [`SpecNode`] trees.
//!
//! ## Shorthand Forms
//!
//! | shorthand                         | canonical node                        |
//! |-----------------------------------|---------------------------------------|
//! | bare type                         | `Scalar(t)`                           |
//! | literal mapping                   | `Mapping`, bare entries `Required`    |
//! | `"*"` key in a literal mapping    | unlimited extra keys of that spec     |
//! | one-element sequence              | `ListOf(element)`                     |
//! | multi-element sequence            | `TupleOf(elements)`                   |
//!
//! ## JSON / YAML Authoring
//!
//! [`RawSpec::from_json`] reads the same forms from a decoded document:
//! strings name types, arrays are sequences, objects are mappings, and
//! objects whose keys all start with `$` are markers:
//!
//! ```json
//! {
//!   "name": "str",
//!   "age": {"$optional": "int", "$default": 0},
//!   "tags": ["str"],
//!   "point": ["float", "float"],
//!   "pair": {"$tuple": ["str"]},
//!   "*": "any"
//! }
//! ```
//!
//! ## Errors
//!
//! Normalization fails with [`SpecDefinitionError`] for empty sequences,
//! conflicting or misplaced presence markers, duplicate keys, unknown type
//! names, unrecognized literals and defaults that do not match their own
//! entry. Each error names the schema path.

use std::collections::BTreeMap;

use crate::error::SpecDefinitionError;
use crate::path::Path;
use crate::registry::MessageRegistry;
use crate::spec::{MappingSpec, ScalarType, SpecNode};
use crate::value::Value;
use crate::verify::Verifier;

/// Mapping key that declares a mapping unlimited.
pub const UNLIMITED_KEY: &str = "*";

const REQUIRED_MARKER: &str = "$required";
const OPTIONAL_MARKER: &str = "$optional";
const DEFAULT_MARKER: &str = "$default";
const LIST_MARKER: &str = "$list";
const TUPLE_MARKER: &str = "$tuple";

/// An authored, not yet normalized, schema.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSpec {
    /// A bare type.
    Type(ScalarType),
    /// A literal mapping, in authored order. The key [`UNLIMITED_KEY`]
    /// declares the spec for undeclared keys.
    Mapping(Vec<(String, RawSpec)>),
    /// A mapping whose undeclared-key policy is stated outright rather than
    /// through [`UNLIMITED_KEY`]; every key, `"*"` included, is an entry.
    /// `None` rejects undeclared keys, `Some(None)` passes them through
    /// untyped and `Some(Some(spec))` holds them to `spec`.
    Declared {
        entries: Vec<(String, RawSpec)>,
        unlimited: Option<Option<Box<RawSpec>>>,
    },
    /// A literal sequence: one element means "list of", more mean "tuple of".
    Sequence(Vec<RawSpec>),
    /// An explicit homogeneous list.
    ListOf(Box<RawSpec>),
    /// An explicit fixed tuple (any arity, including one).
    TupleOf(Vec<RawSpec>),
    Required(Box<RawSpec>),
    Optional {
        inner: Box<RawSpec>,
        default: Option<Value>,
    },
}

impl RawSpec {
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<RawSpec>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn sequence<V, I>(items: I) -> Self
    where
        V: Into<RawSpec>,
        I: IntoIterator<Item = V>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn list_of(element: impl Into<RawSpec>) -> Self {
        Self::ListOf(Box::new(element.into()))
    }

    pub fn tuple_of<V, I>(items: I) -> Self
    where
        V: Into<RawSpec>,
        I: IntoIterator<Item = V>,
    {
        Self::TupleOf(items.into_iter().map(Into::into).collect())
    }

    pub fn required(inner: impl Into<RawSpec>) -> Self {
        Self::Required(Box::new(inner.into()))
    }

    pub fn optional(inner: impl Into<RawSpec>) -> Self {
        Self::Optional {
            inner: Box::new(inner.into()),
            default: None,
        }
    }

    pub fn optional_with_default(inner: impl Into<RawSpec>, default: impl Into<Value>) -> Self {
        Self::Optional {
            inner: Box::new(inner.into()),
            default: Some(default.into()),
        }
    }

    /// Read the JSON/YAML authoring form.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, SpecDefinitionError> {
        parse_json(json, &Path::root())
    }

    fn marker_name(&self) -> &'static str {
        match self {
            Self::Required(_) => "required",
            Self::Optional { .. } => "optional",
            _ => "none",
        }
    }
}

impl From<ScalarType> for RawSpec {
    fn from(ty: ScalarType) -> Self {
        Self::Type(ty)
    }
}

impl From<SpecNode> for RawSpec {
    fn from(node: SpecNode) -> Self {
        match node {
            SpecNode::Scalar(ty) => Self::Type(ty),
            SpecNode::Required(inner) => Self::Required(Box::new((*inner).into())),
            SpecNode::Optional { inner, default } => Self::Optional {
                inner: Box::new((*inner).into()),
                default,
            },
            SpecNode::Mapping(mapping) => mapping.into(),
            SpecNode::ListOf(element) => Self::ListOf(Box::new((*element).into())),
            SpecNode::TupleOf(elements) => {
                Self::TupleOf(elements.into_iter().map(Into::into).collect())
            }
        }
    }
}

impl From<MappingSpec> for RawSpec {
    fn from(mapping: MappingSpec) -> Self {
        let unlimited = mapping
            .extra_key_spec()
            .map(|spec| spec.map(|spec| Box::new(RawSpec::from(spec.clone()))));
        let entries = mapping
            .entries()
            .iter()
            .map(|(k, v)| (k.clone(), RawSpec::from(v.clone())))
            .collect();
        Self::Declared { entries, unlimited }
    }
}

/// Normalize an authored schema into its canonical tree.
pub fn normalize(raw: impl Into<RawSpec>) -> Result<SpecNode, SpecDefinitionError> {
    normalize_root(raw.into(), &Path::root())
}

/// Parse and normalize the JSON/YAML authoring form.
pub fn normalize_json(json: &serde_json::Value) -> Result<SpecNode, SpecDefinitionError> {
    normalize(RawSpec::from_json(json)?)
}

fn normalize_root(raw: RawSpec, path: &Path) -> Result<SpecNode, SpecDefinitionError> {
    match raw {
        // A top-level value is always present; the marker is implied.
        RawSpec::Required(inner) => match *inner {
            RawSpec::Optional { .. } => Err(conflict(path, "required", "optional")),
            other => normalize_root(other, path),
        },
        RawSpec::Optional { .. } => Err(misplaced(path, "optional")),
        other => normalize_body(other, path),
    }
}

/// Normalize a node that is neither the root nor a mapping entry.
fn normalize_body(raw: RawSpec, path: &Path) -> Result<SpecNode, SpecDefinitionError> {
    match raw {
        RawSpec::Type(ty) => Ok(SpecNode::Scalar(ty)),
        RawSpec::Mapping(entries) => normalize_mapping(entries, path),
        RawSpec::Declared { entries, unlimited } => {
            let unlimited = match unlimited {
                Some(Some(extra)) => Some(Some(normalize_body(*extra, &path.key(UNLIMITED_KEY))?)),
                Some(None) => Some(None),
                None => None,
            };
            declared_mapping(entries, unlimited, path)
        }
        RawSpec::Sequence(mut items) => match items.len() {
            0 => Err(SpecDefinitionError::EmptySequence {
                path: path.to_string(),
            }),
            1 => {
                let element = items.remove(0);
                Ok(SpecNode::ListOf(Box::new(normalize_body(element, &path.each())?)))
            }
            _ => normalize_tuple(items, path),
        },
        RawSpec::ListOf(element) => {
            Ok(SpecNode::ListOf(Box::new(normalize_body(*element, &path.each())?)))
        }
        RawSpec::TupleOf(items) => normalize_tuple(items, path),
        marker @ (RawSpec::Required(_) | RawSpec::Optional { .. }) => {
            Err(misplaced(path, marker.marker_name()))
        }
    }
}

fn normalize_tuple(items: Vec<RawSpec>, path: &Path) -> Result<SpecNode, SpecDefinitionError> {
    let elements = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| normalize_body(item, &path.index(i)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SpecNode::TupleOf(elements))
}

/// Normalize a literal mapping, where the key [`UNLIMITED_KEY`] carries the
/// spec for undeclared keys.
fn normalize_mapping(
    entries: Vec<(String, RawSpec)>,
    path: &Path,
) -> Result<SpecNode, SpecDefinitionError> {
    let mut declared = Vec::with_capacity(entries.len());
    let mut unlimited: Option<Option<SpecNode>> = None;

    for (key, raw) in entries {
        if key != UNLIMITED_KEY {
            declared.push((key, raw));
            continue;
        }
        if unlimited.is_some() {
            return Err(duplicate(path, &key));
        }
        let spec = match raw {
            RawSpec::Type(ScalarType::Any) => None,
            other => Some(normalize_body(other, &path.key(key.as_str()))?),
        };
        unlimited = Some(spec);
    }

    declared_mapping(declared, unlimited, path)
}

fn declared_mapping(
    entries: Vec<(String, RawSpec)>,
    unlimited: Option<Option<SpecNode>>,
    path: &Path,
) -> Result<SpecNode, SpecDefinitionError> {
    let mut normalized = BTreeMap::new();
    for (key, raw) in entries {
        if normalized.contains_key(&key) {
            return Err(duplicate(path, &key));
        }
        let entry = normalize_entry(raw, &path.key(key.as_str()))?;
        normalized.insert(key, entry);
    }

    let allow_unlimited = unlimited.is_some();
    Ok(SpecNode::Mapping(MappingSpec::from_parts(
        normalized,
        allow_unlimited,
        unlimited.flatten(),
    )))
}

/// Normalize a mapping entry: peel presence markers, collapse repeats of the
/// same kind, and wrap the body in exactly one marker.
fn normalize_entry(raw: RawSpec, path: &Path) -> Result<SpecNode, SpecDefinitionError> {
    match raw {
        RawSpec::Required(inner) => {
            let mut body = *inner;
            loop {
                match body {
                    RawSpec::Required(next) => body = *next,
                    RawSpec::Optional { .. } => {
                        return Err(conflict(path, "required", "optional"));
                    }
                    other => {
                        return Ok(SpecNode::Required(Box::new(normalize_body(other, path)?)));
                    }
                }
            }
        }
        RawSpec::Optional { inner, default } => {
            let mut body = *inner;
            let mut default = default;
            loop {
                match body {
                    RawSpec::Optional {
                        inner,
                        default: inner_default,
                    } => {
                        default = default.or(inner_default);
                        body = *inner;
                    }
                    RawSpec::Required(_) => {
                        return Err(conflict(path, "optional", "required"));
                    }
                    other => {
                        let inner = normalize_body(other, path)?;
                        if let Some(default) = &default {
                            check_default(default, &inner, path)?;
                        }
                        return Ok(SpecNode::Optional {
                            inner: Box::new(inner),
                            default,
                        });
                    }
                }
            }
        }
        bare => Ok(SpecNode::Required(Box::new(normalize_body(bare, path)?))),
    }
}

/// A default must pass strict verification against its entry's spec.
fn check_default(default: &Value, inner: &SpecNode, path: &Path) -> Result<(), SpecDefinitionError> {
    let messages = MessageRegistry::new();
    Verifier::new(&messages)
        .verify(default, inner)
        .map_err(|violations| SpecDefinitionError::InvalidDefault {
            path: path.to_string(),
            reason: violations
                .iter()
                .map(|v| {
                    if v.path.is_root() {
                        v.message.clone()
                    } else {
                        format!("{}: {}", v.path, v.message)
                    }
                })
                .collect::<Vec<_>>()
                .join("; "),
        })
}

fn parse_json(json: &serde_json::Value, path: &Path) -> Result<RawSpec, SpecDefinitionError> {
    use serde_json::Value as Json;
    match json {
        Json::String(name) => ScalarType::from_name(name)
            .map(RawSpec::Type)
            .ok_or_else(|| SpecDefinitionError::UnknownType {
                path: path.to_string(),
                name: name.clone(),
            }),
        Json::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_json(item, &path.index(i)))
            .collect::<Result<Vec<_>, _>>()
            .map(RawSpec::Sequence),
        Json::Object(map) => {
            let marker_keys = map.keys().filter(|k| k.starts_with('$')).count();
            if marker_keys == 0 {
                return map
                    .iter()
                    .map(|(k, v)| parse_json(v, &path.key(k.as_str())).map(|spec| (k.clone(), spec)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(RawSpec::Mapping);
            }
            if marker_keys != map.len() {
                return Err(invalid(path, "marker keys ($...) cannot be mixed with mapping keys"));
            }
            parse_marker(map, path)
        }
        Json::Null | Json::Bool(_) | Json::Number(_) => Err(invalid(
            path,
            &format!("expected a type name, mapping, or sequence; got {json}"),
        )),
    }
}

fn parse_marker(
    map: &serde_json::Map<String, serde_json::Value>,
    path: &Path,
) -> Result<RawSpec, SpecDefinitionError> {
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    match keys.as_slice() {
        [REQUIRED_MARKER] => Ok(RawSpec::required(parse_json(&map[REQUIRED_MARKER], path)?)),
        [LIST_MARKER] => Ok(RawSpec::list_of(parse_json(&map[LIST_MARKER], &path.each())?)),
        [TUPLE_MARKER] => match &map[TUPLE_MARKER] {
            serde_json::Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| parse_json(item, &path.index(i)))
                .collect::<Result<Vec<_>, _>>()
                .map(RawSpec::TupleOf),
            _ => Err(invalid(path, "`$tuple` expects an array of specs")),
        },
        _ if map.contains_key(OPTIONAL_MARKER)
            && keys.iter().all(|k| *k == OPTIONAL_MARKER || *k == DEFAULT_MARKER) =>
        {
            let inner = parse_json(&map[OPTIONAL_MARKER], path)?;
            Ok(RawSpec::Optional {
                inner: Box::new(inner),
                default: map.get(DEFAULT_MARKER).map(Value::from),
            })
        }
        _ => Err(invalid(
            path,
            &format!("unrecognized marker keys {keys:?}"),
        )),
    }
}

fn conflict(path: &Path, outer: &str, inner: &str) -> SpecDefinitionError {
    SpecDefinitionError::ConflictingMarkers {
        path: path.to_string(),
        outer: outer.to_string(),
        inner: inner.to_string(),
    }
}

fn misplaced(path: &Path, marker: &str) -> SpecDefinitionError {
    SpecDefinitionError::MisplacedMarker {
        path: path.to_string(),
        marker: marker.to_string(),
    }
}

fn duplicate(path: &Path, key: &str) -> SpecDefinitionError {
    SpecDefinitionError::DuplicateKey {
        path: path.to_string(),
        key: key.to_string(),
    }
}

fn invalid(path: &Path, reason: &str) -> SpecDefinitionError {
    SpecDefinitionError::InvalidShorthand {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
