//! # Verification Engine
//!
//! Walks a value against a canonical [`SpecNode`] tree and reports every
//! mismatch in a single pass. Verification is authoritative: whatever
//! coercion did, a value that reaches the caller has passed this walk.
//!
//! Violations carry a [`Path`], a machine-readable [`ViolationKind`] and a
//! human-readable message:
//!
//! ```text
//!   name: expected 'str'; got 'int'
//!   extra: unexpected key
//!   point: expected 2 elements, got 3
//! ```

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::path::Path;
use crate::registry::{MessageRegistry, TypeCheck, TypeCheckRegistry};
use crate::spec::{MappingSpec, ScalarType, SpecNode};
use crate::value::Value;

/// Machine-readable classification of a [`Violation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    WrongType,
    MissingKey,
    UnexpectedKey,
    LengthMismatch,
    WrongContainer,
}

/// A single mismatch between a value and its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: Path,
    pub kind: ViolationKind,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {}", self.path, self.message)
    }
}

impl Serialize for Violation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Violation", 3)?;
        s.serialize_field("path", &self.path.to_string())?;
        s.serialize_field("kind", &self.kind)?;
        s.serialize_field("message", &self.message)?;
        s.end()
    }
}

/// Every violation found in one verification walk, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// How `null` is treated at scalar nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullPolicy {
    /// `null` only matches `any`.
    #[default]
    Strict,
    /// `null` also satisfies a scalar at the root, in a mapping entry or at a
    /// tuple position, but never a list element or a container node.
    Entries,
}

/// Where a node sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Root,
    Entry,
    Position,
    Element,
}

/// Verification settings borrowed from a processor.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a> {
    messages: &'a MessageRegistry,
    type_checks: Option<&'a TypeCheckRegistry>,
    nulls: NullPolicy,
}

impl<'a> Verifier<'a> {
    pub fn new(messages: &'a MessageRegistry) -> Self {
        Self {
            messages,
            type_checks: None,
            nulls: NullPolicy::Strict,
        }
    }

    pub fn with_type_checks(mut self, type_checks: &'a TypeCheckRegistry) -> Self {
        self.type_checks = Some(type_checks);
        self
    }

    pub fn with_null_policy(mut self, nulls: NullPolicy) -> Self {
        self.nulls = nulls;
        self
    }

    /// Verify `value` against `spec`, collecting every violation.
    pub fn verify(&self, value: &Value, spec: &SpecNode) -> Result<(), Violations> {
        let mut walk = Walk::new(self, true);
        walk.node(value, spec, &Path::root(), Slot::Root);
        if walk.found.is_empty() {
            Ok(())
        } else {
            Err(Violations(walk.found))
        }
    }

    /// Pass/fail form of [`verify`](Self::verify). Stops at the first
    /// violation and renders no messages.
    pub fn check(&self, value: &Value, spec: &SpecNode) -> TypeCheck {
        let mut walk = Walk::new(self, false);
        walk.node(value, spec, &Path::root(), Slot::Root);
        TypeCheck::from_bool(!walk.failed)
    }
}

/// Verify with default settings: no custom type checks, strict nulls.
pub fn verify(value: &Value, spec: &SpecNode, messages: &MessageRegistry) -> Result<(), Violations> {
    Verifier::new(messages).verify(value, spec)
}

struct Walk<'v, 'a> {
    verifier: &'v Verifier<'a>,
    collect: bool,
    failed: bool,
    found: Vec<Violation>,
}

impl<'v, 'a> Walk<'v, 'a> {
    fn new(verifier: &'v Verifier<'a>, collect: bool) -> Self {
        Self {
            verifier,
            collect,
            failed: false,
            found: Vec::new(),
        }
    }

    fn done(&self) -> bool {
        self.failed && !self.collect
    }

    fn report(&mut self, path: &Path, kind: ViolationKind, message: impl FnOnce() -> String) {
        self.failed = true;
        if self.collect {
            self.found.push(Violation {
                path: path.clone(),
                kind,
                message: message(),
            });
        }
    }

    fn node(&mut self, value: &Value, spec: &SpecNode, path: &Path, slot: Slot) {
        if self.done() {
            return;
        }
        match spec {
            SpecNode::Scalar(ty) => self.scalar(value, *ty, path, slot),
            SpecNode::Required(inner) | SpecNode::Optional { inner, .. } => {
                self.node(value, inner, path, slot)
            }
            SpecNode::Mapping(mapping) => self.mapping(value, mapping, path),
            SpecNode::ListOf(element) => match value.as_sequence() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        self.node(item, element, &path.index(i), Slot::Element);
                    }
                }
                None => self.wrong_container(value, "list", path),
            },
            SpecNode::TupleOf(elements) => match value.as_sequence() {
                Some(items) if items.len() != elements.len() => {
                    self.report(path, ViolationKind::LengthMismatch, || {
                        format!("expected {} elements, got {}", elements.len(), items.len())
                    });
                }
                Some(items) => {
                    for (i, (item, element)) in items.iter().zip(elements).enumerate() {
                        self.node(item, element, &path.index(i), Slot::Position);
                    }
                }
                None => self.wrong_container(value, "tuple", path),
            },
        }
    }

    fn scalar(&mut self, value: &Value, ty: ScalarType, path: &Path, slot: Slot) {
        let custom = self
            .verifier
            .type_checks
            .and_then(|checks| checks.evaluate(value, ty));
        let ok = match custom {
            Some(outcome) => outcome.is_success(),
            None => ty.matches(value) || self.null_allowed(value, slot),
        };
        if !ok {
            let messages = self.verifier.messages;
            self.report(path, ViolationKind::WrongType, || {
                messages.render(ty, value.kind())
            });
        }
    }

    fn null_allowed(&self, value: &Value, slot: Slot) -> bool {
        value.is_null()
            && self.verifier.nulls == NullPolicy::Entries
            && matches!(slot, Slot::Root | Slot::Entry | Slot::Position)
    }

    fn mapping(&mut self, value: &Value, spec: &MappingSpec, path: &Path) {
        let Some(map) = value.as_map() else {
            self.wrong_container(value, "mapping", path);
            return;
        };
        for (key, entry) in spec.entries() {
            match map.get(key) {
                Some(v) => self.node(v, entry, &path.key(key.as_str()), Slot::Entry),
                None if entry.is_required() => {
                    self.report(&path.key(key.as_str()), ViolationKind::MissingKey, || {
                        "missing required key".to_string()
                    });
                }
                None => {}
            }
            if self.done() {
                return;
            }
        }
        for (key, v) in map {
            if spec.entries().contains_key(key) {
                continue;
            }
            match spec.extra_key_spec() {
                None => self.report(&path.key(key.as_str()), ViolationKind::UnexpectedKey, || {
                    "unexpected key".to_string()
                }),
                Some(None) => {}
                Some(Some(extra)) => self.node(v, extra, &path.key(key.as_str()), Slot::Entry),
            }
            if self.done() {
                return;
            }
        }
    }

    fn wrong_container(&mut self, value: &Value, expected: &str, path: &Path) {
        self.report(path, ViolationKind::WrongContainer, || {
            format!(
                "wrong container kind: expected {expected}, got {}",
                value.kind()
            )
        });
    }
}
