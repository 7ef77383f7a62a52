//! # Spec Model
//!
//! The canonical schema tree. A [`SpecNode`] is a closed tagged union; both
//! engines match on it exhaustively, so adding a node kind forces every walk
//! to handle it.
//!
//! ## Canonical Form
//!
//! Trees produced by [`crate::normalize()`] satisfy:
//!
//! - Every [`MappingSpec`] entry is wrapped in exactly one presence marker
//!   (`Required` or `Optional`).
//! - Presence markers appear nowhere else.
//!
//! The builder methods on [`MappingSpec`] produce canonical entries directly.
//! Trees assembled by hand are re-checked when handed to a
//! [`crate::Processor`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Expected-type identity of a scalar node.
///
/// This is the key into the coercion, type-check and message registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Matches every value, including `null` and containers.
    Any,
    Bool,
    Int,
    Float,
    Str,
    Decimal,
    DateTime,
    Uuid,
}

impl ScalarType {
    /// Every scalar type, in declaration order.
    pub const ALL: [ScalarType; 8] = [
        Self::Any,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::Str,
        Self::Decimal,
        Self::DateTime,
        Self::Uuid,
    ];

    /// The canonical shorthand name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Decimal => "decimal",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
        }
    }

    /// Parse a shorthand type name. Accepts `string` as an alias of `str`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::Str),
            other => Self::ALL.into_iter().find(|t| t.name() == other),
        }
    }

    /// Built-in identity check: is `value` an instance of this type?
    ///
    /// `int` does not accept booleans and `float` does not accept integers.
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Any, _)
                | (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::Str, Value::Str(_))
                | (Self::Decimal, Value::Decimal(_))
                | (Self::DateTime, Value::DateTime(_))
                | (Self::Uuid, Value::Uuid(_))
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the canonical schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecNode {
    /// A single value of (or coercible to) the given type.
    Scalar(ScalarType),
    /// The mapping entry must be present.
    Required(Box<SpecNode>),
    /// The mapping entry may be absent; `default` is substituted by coercion.
    Optional {
        inner: Box<SpecNode>,
        default: Option<Value>,
    },
    Mapping(MappingSpec),
    /// A sequence of any length whose every element matches.
    ListOf(Box<SpecNode>),
    /// A sequence of exactly `elements.len()` positions.
    TupleOf(Vec<SpecNode>),
}

impl SpecNode {
    pub fn scalar(ty: ScalarType) -> Self {
        Self::Scalar(ty)
    }

    pub fn required(inner: impl Into<SpecNode>) -> Self {
        Self::Required(Box::new(inner.into()))
    }

    pub fn optional(inner: impl Into<SpecNode>) -> Self {
        Self::Optional {
            inner: Box::new(inner.into()),
            default: None,
        }
    }

    pub fn optional_with_default(inner: impl Into<SpecNode>, default: impl Into<Value>) -> Self {
        Self::Optional {
            inner: Box::new(inner.into()),
            default: Some(default.into()),
        }
    }

    pub fn list_of(element: impl Into<SpecNode>) -> Self {
        Self::ListOf(Box::new(element.into()))
    }

    pub fn tuple_of<I>(elements: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SpecNode>,
    {
        Self::TupleOf(elements.into_iter().map(Into::into).collect())
    }

    /// True for `Required` and `Optional`.
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Required(_) | Self::Optional { .. })
    }

    /// True for a `Required` marker, or a bare node (implicitly required).
    pub fn is_required(&self) -> bool {
        !matches!(self, Self::Optional { .. })
    }

    /// The node under any presence marker.
    pub fn body(&self) -> &SpecNode {
        match self {
            Self::Required(inner) | Self::Optional { inner, .. } => inner.body(),
            other => other,
        }
    }

    /// The default value of an `Optional` marker.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Self::Optional { default, .. } => default.as_ref(),
            _ => None,
        }
    }
}

impl From<ScalarType> for SpecNode {
    fn from(ty: ScalarType) -> Self {
        Self::Scalar(ty)
    }
}

impl From<MappingSpec> for SpecNode {
    fn from(mapping: MappingSpec) -> Self {
        Self::Mapping(mapping)
    }
}

impl fmt::Display for SpecNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(ty) => write!(f, "{ty}"),
            Self::Required(inner) => write!(f, "{inner}"),
            Self::Optional { inner, default } => {
                write!(f, "optional {inner}")?;
                if let Some(d) = default {
                    write!(f, " = {d}")?;
                }
                Ok(())
            }
            Self::Mapping(m) => write!(f, "{m}"),
            Self::ListOf(element) => write!(f, "[{element}]"),
            Self::TupleOf(elements) => {
                f.write_str("(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Mapping node: declared entries plus the policy for undeclared keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingSpec {
    entries: BTreeMap<String, SpecNode>,
    allow_unlimited: bool,
    unlimited_value_spec: Option<Box<SpecNode>>,
}

impl MappingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required entry.
    pub fn required(mut self, key: impl Into<String>, spec: impl Into<SpecNode>) -> Self {
        self.entries.insert(key.into(), SpecNode::required(spec));
        self
    }

    /// Declare an optional entry without a default.
    pub fn optional(mut self, key: impl Into<String>, spec: impl Into<SpecNode>) -> Self {
        self.entries.insert(key.into(), SpecNode::optional(spec));
        self
    }

    /// Declare an optional entry whose absence is filled by `default`.
    pub fn optional_with_default(
        mut self,
        key: impl Into<String>,
        spec: impl Into<SpecNode>,
        default: impl Into<Value>,
    ) -> Self {
        self.entries
            .insert(key.into(), SpecNode::optional_with_default(spec, default));
        self
    }

    /// Accept undeclared keys with any value.
    pub fn unlimited(mut self) -> Self {
        self.allow_unlimited = true;
        self.unlimited_value_spec = None;
        self
    }

    /// Accept undeclared keys whose values match `spec`.
    pub fn unlimited_of(mut self, spec: impl Into<SpecNode>) -> Self {
        self.allow_unlimited = true;
        self.unlimited_value_spec = Some(Box::new(spec.into()));
        self
    }

    pub(crate) fn from_parts(
        entries: BTreeMap<String, SpecNode>,
        allow_unlimited: bool,
        unlimited_value_spec: Option<SpecNode>,
    ) -> Self {
        Self {
            entries,
            allow_unlimited,
            unlimited_value_spec: unlimited_value_spec.map(Box::new),
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, SpecNode> {
        &self.entries
    }

    pub fn entry(&self, key: &str) -> Option<&SpecNode> {
        self.entries.get(key)
    }

    pub fn allows_unlimited(&self) -> bool {
        self.allow_unlimited
    }

    /// Spec applied to undeclared keys. `None` means untyped pass-through.
    pub fn unlimited_value_spec(&self) -> Option<&SpecNode> {
        self.unlimited_value_spec.as_deref()
    }

    /// The spec an undeclared key is held to, if undeclared keys are allowed.
    pub(crate) fn extra_key_spec(&self) -> Option<Option<&SpecNode>> {
        self.allow_unlimited.then(|| self.unlimited_value_spec())
    }
}

impl fmt::Display for MappingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for (key, entry) in &self.entries {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            match entry {
                SpecNode::Optional { inner, default } => {
                    write!(f, "{key}?: {inner}")?;
                    if let Some(d) = default {
                        write!(f, " = {d}")?;
                    }
                }
                other => write!(f, "{key}: {other}")?,
            }
        }
        if self.allow_unlimited {
            if !first {
                f.write_str(", ")?;
            }
            match &self.unlimited_value_spec {
                Some(spec) => write!(f, "*: {spec}")?,
                None => f.write_str("*: any")?,
            }
        }
        f.write_str("}")
    }
}
