//! # Processor
//!
//! Binds one canonical schema to the registries used to coerce and verify
//! values against it. A processor is built once (normalizing its schema, so
//! malformed schemas fail at configuration time) and then shared freely:
//! clones share the same immutable state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coerce::coerce;
use crate::error::{SpecDefinitionError, VerificationFailure};
use crate::normalize::{normalize, RawSpec};
use crate::registry::{CoercionRegistry, MessageRegistry, TypeCheck, TypeCheckRegistry};
use crate::spec::SpecNode;
use crate::value::Value;
use crate::verify::{NullPolicy, Verifier};

/// Which side of a boundary a processor guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Data arriving from a caller.
    Input,
    /// Data leaving toward a caller.
    Output,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    /// Summary line used when a processor is not given one.
    pub fn default_summary(self) -> &'static str {
        match self {
            Self::Input => "Invalid input.",
            Self::Output => "Invalid output.",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Inner {
    direction: Direction,
    spec: SpecNode,
    coercions: CoercionRegistry,
    type_checks: TypeCheckRegistry,
    messages: MessageRegistry,
    nulls: NullPolicy,
    summary: String,
}

/// A schema bound to its coercion, type-check and message registries.
#[derive(Clone)]
pub struct Processor {
    inner: Arc<Inner>,
}

impl Processor {
    pub fn builder(direction: Direction, spec: impl Into<RawSpec>) -> ProcessorBuilder {
        ProcessorBuilder::new(direction, spec)
    }

    /// An input processor with empty registries.
    pub fn input(spec: impl Into<RawSpec>) -> Result<Self, SpecDefinitionError> {
        Self::builder(Direction::Input, spec).build()
    }

    /// An output processor with empty registries.
    pub fn output(spec: impl Into<RawSpec>) -> Result<Self, SpecDefinitionError> {
        Self::builder(Direction::Output, spec).build()
    }

    pub fn direction(&self) -> Direction {
        self.inner.direction
    }

    /// The normalized schema.
    pub fn spec(&self) -> &SpecNode {
        &self.inner.spec
    }

    pub fn summary(&self) -> &str {
        &self.inner.summary
    }

    pub fn coercions(&self) -> &CoercionRegistry {
        &self.inner.coercions
    }

    pub fn type_checks(&self) -> &TypeCheckRegistry {
        &self.inner.type_checks
    }

    pub fn messages(&self) -> &MessageRegistry {
        &self.inner.messages
    }

    pub fn null_policy(&self) -> NullPolicy {
        self.inner.nulls
    }

    /// Best-effort conversion toward the schema. Never fails.
    pub fn coerce(&self, value: &Value) -> Value {
        coerce(value, &self.inner.spec, &self.inner.coercions)
    }

    /// Verify `value`, reporting every violation.
    pub fn verify(&self, value: &Value) -> Result<(), VerificationFailure> {
        match self.verifier().verify(value, &self.inner.spec) {
            Ok(()) => Ok(()),
            Err(violations) => {
                tracing::debug!(
                    direction = %self.inner.direction,
                    violations = violations.len(),
                    "verification failed"
                );
                Err(VerificationFailure::new(
                    self.inner.direction,
                    self.inner.summary.clone(),
                    violations,
                ))
            }
        }
    }

    /// Pass/fail verification without diagnostics.
    pub fn check(&self, value: &Value) -> TypeCheck {
        self.verifier().check(value, &self.inner.spec)
    }

    fn verifier(&self) -> Verifier<'_> {
        Verifier::new(&self.inner.messages)
            .with_type_checks(&self.inner.type_checks)
            .with_null_policy(self.inner.nulls)
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("direction", &self.inner.direction)
            .field("spec", &format_args!("{}", self.inner.spec))
            .field("coercions", &self.inner.coercions)
            .field("type_checks", &self.inner.type_checks)
            .field("nulls", &self.inner.nulls)
            .field("summary", &self.inner.summary)
            .finish()
    }
}

/// Builder for [`Processor`]. The schema is normalized by
/// [`build`](Self::build).
#[derive(Debug)]
pub struct ProcessorBuilder {
    direction: Direction,
    spec: RawSpec,
    coercions: CoercionRegistry,
    type_checks: TypeCheckRegistry,
    messages: MessageRegistry,
    nulls: NullPolicy,
    summary: Option<String>,
}

impl ProcessorBuilder {
    pub fn new(direction: Direction, spec: impl Into<RawSpec>) -> Self {
        Self {
            direction,
            spec: spec.into(),
            coercions: CoercionRegistry::new(),
            type_checks: TypeCheckRegistry::new(),
            messages: MessageRegistry::new(),
            nulls: NullPolicy::default(),
            summary: None,
        }
    }

    pub fn coercions(mut self, coercions: CoercionRegistry) -> Self {
        self.coercions = coercions;
        self
    }

    pub fn type_checks(mut self, type_checks: TypeCheckRegistry) -> Self {
        self.type_checks = type_checks;
        self
    }

    pub fn messages(mut self, messages: MessageRegistry) -> Self {
        self.messages = messages;
        self
    }

    pub fn null_policy(mut self, nulls: NullPolicy) -> Self {
        self.nulls = nulls;
        self
    }

    /// Override the summary line of verification failures.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn build(self) -> Result<Processor, SpecDefinitionError> {
        let spec = normalize(self.spec)?;
        tracing::debug!(direction = %self.direction, spec = %spec, "built processor");
        Ok(Processor {
            inner: Arc::new(Inner {
                direction: self.direction,
                spec,
                coercions: self.coercions,
                type_checks: self.type_checks,
                messages: self.messages,
                nulls: self.nulls,
                summary: self
                    .summary
                    .unwrap_or_else(|| self.direction.default_summary().to_string()),
            }),
        })
    }
}
