//! # Manager
//!
//! Pairs an input [`Processor`] with an output [`Processor`] and runs the
//! two-step pipelines at a boundary:
//!
//! - `process_input`: coerce, then verify. Raw caller data is normalized
//!   first, so verification sees the coerced tree.
//! - `process_output`: verify, then coerce. Internal data must already be
//!   correct; coercion only exports it to its external representation.
//!
//! ## Customization
//!
//! Which processor handles a call, and in which order the two steps run, is
//! decided per call by an injected [`ProcessorSelector`] that receives a
//! caller-supplied context (an API version, a tenant, a route). The manager
//! owns the fallback processors; selectors only borrow them.
//!
//! ## Layered Construction
//!
//! [`ManagerBuilder`] layers registries: shared coercions and type checks
//! apply to both directions, and direction-specific ones override them entry
//! by entry.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::{SpecDefinitionError, VerificationFailure};
use crate::normalize::RawSpec;
use crate::processor::{Direction, Processor};
use crate::registry::{CoercionRegistry, MessageRegistry, TypeCheckRegistry};
use crate::spec::ScalarType;
use crate::value::Value;
use crate::verify::NullPolicy;

/// Order of the coerce and verify steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    CoerceThenVerify,
    VerifyThenCoerce,
}

impl Pipeline {
    /// Run both steps of the pipeline with `processor`.
    pub fn run(self, processor: &Processor, value: &Value) -> Result<Value, VerificationFailure> {
        match self {
            Self::CoerceThenVerify => {
                let coerced = processor.coerce(value);
                processor.verify(&coerced)?;
                Ok(coerced)
            }
            Self::VerifyThenCoerce => {
                processor.verify(value)?;
                Ok(processor.coerce(value))
            }
        }
    }
}

/// Per-call strategy for choosing processors and pipeline order.
///
/// Every method has a default that reproduces the plain manager behaviour.
pub trait ProcessorSelector<C: ?Sized>: Send + Sync {
    fn input<'a>(&'a self, default: &'a Processor, _ctx: &C) -> &'a Processor {
        default
    }

    fn output<'a>(&'a self, default: &'a Processor, _ctx: &C) -> &'a Processor {
        default
    }

    fn input_pipeline(&self, _ctx: &C) -> Pipeline {
        Pipeline::CoerceThenVerify
    }

    fn output_pipeline(&self, _ctx: &C) -> Pipeline {
        Pipeline::VerifyThenCoerce
    }
}

/// Always uses the manager's own processors in the standard order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSelector;

impl<C: ?Sized> ProcessorSelector<C> for DefaultSelector {}

/// Per-key processor overrides; keys without an override fall back to the
/// manager's processors. The call context is any borrowed form of the key,
/// so a `KeyedSelector<String>` serves a `Manager<str>`.
#[derive(Debug, Clone)]
pub struct KeyedSelector<K> {
    inputs: HashMap<K, Processor>,
    outputs: HashMap<K, Processor>,
}

impl<K> Default for KeyedSelector<K> {
    fn default() -> Self {
        Self {
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> KeyedSelector<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, key: K, processor: Processor) -> Self {
        self.inputs.insert(key, processor);
        self
    }

    pub fn output(mut self, key: K, processor: Processor) -> Self {
        self.outputs.insert(key, processor);
        self
    }
}

impl<K, Q> ProcessorSelector<Q> for KeyedSelector<K>
where
    K: Borrow<Q> + Eq + Hash + Send + Sync,
    Q: Eq + Hash + ?Sized,
{
    fn input<'a>(&'a self, default: &'a Processor, ctx: &Q) -> &'a Processor {
        self.inputs.get(ctx).unwrap_or(default)
    }

    fn output<'a>(&'a self, default: &'a Processor, ctx: &Q) -> &'a Processor {
        self.outputs.get(ctx).unwrap_or(default)
    }
}

/// Input and output processors plus the selector consulted on every call.
///
/// `C` is the per-call context type handed to the selector; managers without
/// a selector use `()`.
pub struct Manager<C: ?Sized = ()> {
    input: Processor,
    output: Processor,
    selector: Arc<dyn ProcessorSelector<C>>,
}

impl<C: ?Sized> Clone for Manager<C> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
            selector: Arc::clone(&self.selector),
        }
    }
}

impl<C: ?Sized> fmt::Debug for Manager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl<C: ?Sized> Manager<C> {
    /// A manager using [`DefaultSelector`].
    pub fn new(input: Processor, output: Processor) -> Self {
        Self {
            input,
            output,
            selector: Arc::new(DefaultSelector),
        }
    }

    pub fn with_selector<S>(input: Processor, output: Processor, selector: S) -> Self
    where
        S: ProcessorSelector<C> + 'static,
    {
        Self {
            input,
            output,
            selector: Arc::new(selector),
        }
    }

    /// The fallback input processor.
    pub fn input_processor(&self) -> &Processor {
        &self.input
    }

    /// The fallback output processor.
    pub fn output_processor(&self) -> &Processor {
        &self.output
    }

    /// Coerce then verify inbound data (order per selector).
    pub fn process_input_for(&self, value: &Value, ctx: &C) -> Result<Value, VerificationFailure> {
        let processor = self.selector.input(&self.input, ctx);
        let pipeline = self.selector.input_pipeline(ctx);
        tracing::debug!(direction = %Direction::Input, ?pipeline, "processing value");
        pipeline.run(processor, value)
    }

    /// Verify then coerce outbound data (order per selector).
    pub fn process_output_for(&self, value: &Value, ctx: &C) -> Result<Value, VerificationFailure> {
        let processor = self.selector.output(&self.output, ctx);
        let pipeline = self.selector.output_pipeline(ctx);
        tracing::debug!(direction = %Direction::Output, ?pipeline, "processing value");
        pipeline.run(processor, value)
    }

    pub fn coerce_input_for(&self, value: &Value, ctx: &C) -> Value {
        self.selector.input(&self.input, ctx).coerce(value)
    }

    pub fn verify_input_for(&self, value: &Value, ctx: &C) -> Result<(), VerificationFailure> {
        self.selector.input(&self.input, ctx).verify(value)
    }

    pub fn coerce_output_for(&self, value: &Value, ctx: &C) -> Value {
        self.selector.output(&self.output, ctx).coerce(value)
    }

    pub fn verify_output_for(&self, value: &Value, ctx: &C) -> Result<(), VerificationFailure> {
        self.selector.output(&self.output, ctx).verify(value)
    }
}

impl Manager<()> {
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    pub fn process_input(&self, value: &Value) -> Result<Value, VerificationFailure> {
        self.process_input_for(value, &())
    }

    pub fn process_output(&self, value: &Value) -> Result<Value, VerificationFailure> {
        self.process_output_for(value, &())
    }

    pub fn coerce_input(&self, value: &Value) -> Value {
        self.coerce_input_for(value, &())
    }

    pub fn verify_input(&self, value: &Value) -> Result<(), VerificationFailure> {
        self.verify_input_for(value, &())
    }

    pub fn coerce_output(&self, value: &Value) -> Value {
        self.coerce_output_for(value, &())
    }

    pub fn verify_output(&self, value: &Value) -> Result<(), VerificationFailure> {
        self.verify_output_for(value, &())
    }
}

#[derive(Debug)]
struct DirectionSettings {
    direction: Direction,
    spec: RawSpec,
    coercions: CoercionRegistry,
    type_checks: TypeCheckRegistry,
    messages: MessageRegistry,
    nulls: NullPolicy,
    summary: Option<String>,
}

impl DirectionSettings {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            spec: RawSpec::Type(ScalarType::Any),
            coercions: CoercionRegistry::new(),
            type_checks: TypeCheckRegistry::new(),
            messages: MessageRegistry::new(),
            nulls: NullPolicy::default(),
            summary: None,
        }
    }

    fn build(
        self,
        shared_coercions: &CoercionRegistry,
        shared_type_checks: &TypeCheckRegistry,
    ) -> Result<Processor, SpecDefinitionError> {
        let mut builder = Processor::builder(self.direction, self.spec)
            .coercions(shared_coercions.layered(&self.coercions))
            .type_checks(shared_type_checks.layered(&self.type_checks))
            .messages(self.messages)
            .null_policy(self.nulls);
        if let Some(summary) = self.summary {
            builder = builder.summary(summary);
        }
        builder.build()
    }
}

/// Builder for [`Manager`] with layered registry precedence.
///
/// Unset schemas default to `any`, which accepts every value.
#[derive(Debug)]
pub struct ManagerBuilder {
    coercions: CoercionRegistry,
    type_checks: TypeCheckRegistry,
    input: DirectionSettings,
    output: DirectionSettings,
}

impl Default for ManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self {
            coercions: CoercionRegistry::new(),
            type_checks: TypeCheckRegistry::new(),
            input: DirectionSettings::new(Direction::Input),
            output: DirectionSettings::new(Direction::Output),
        }
    }

    /// Coercions shared by both directions (lowest precedence).
    pub fn coercions(mut self, coercions: CoercionRegistry) -> Self {
        self.coercions = coercions;
        self
    }

    /// Type checks shared by both directions (lowest precedence).
    pub fn type_checks(mut self, type_checks: TypeCheckRegistry) -> Self {
        self.type_checks = type_checks;
        self
    }

    pub fn input_spec(mut self, spec: impl Into<RawSpec>) -> Self {
        self.input.spec = spec.into();
        self
    }

    pub fn output_spec(mut self, spec: impl Into<RawSpec>) -> Self {
        self.output.spec = spec.into();
        self
    }

    pub fn input_coercions(mut self, coercions: CoercionRegistry) -> Self {
        self.input.coercions = coercions;
        self
    }

    pub fn output_coercions(mut self, coercions: CoercionRegistry) -> Self {
        self.output.coercions = coercions;
        self
    }

    pub fn input_type_checks(mut self, type_checks: TypeCheckRegistry) -> Self {
        self.input.type_checks = type_checks;
        self
    }

    pub fn output_type_checks(mut self, type_checks: TypeCheckRegistry) -> Self {
        self.output.type_checks = type_checks;
        self
    }

    pub fn input_messages(mut self, messages: MessageRegistry) -> Self {
        self.input.messages = messages;
        self
    }

    pub fn output_messages(mut self, messages: MessageRegistry) -> Self {
        self.output.messages = messages;
        self
    }

    pub fn input_null_policy(mut self, nulls: NullPolicy) -> Self {
        self.input.nulls = nulls;
        self
    }

    pub fn output_null_policy(mut self, nulls: NullPolicy) -> Self {
        self.output.nulls = nulls;
        self
    }

    pub fn input_summary(mut self, summary: impl Into<String>) -> Self {
        self.input.summary = Some(summary.into());
        self
    }

    pub fn output_summary(mut self, summary: impl Into<String>) -> Self {
        self.output.summary = Some(summary.into());
        self
    }

    /// Build both processors, normalizing both schemas.
    pub fn build(self) -> Result<Manager, SpecDefinitionError> {
        let (input, output) = self.processors()?;
        Ok(Manager::new(input, output))
    }

    /// Build a manager that consults `selector` on every call.
    pub fn build_with_selector<C, S>(self, selector: S) -> Result<Manager<C>, SpecDefinitionError>
    where
        C: ?Sized,
        S: ProcessorSelector<C> + 'static,
    {
        let (input, output) = self.processors()?;
        Ok(Manager::with_selector(input, output, selector))
    }

    fn processors(self) -> Result<(Processor, Processor), SpecDefinitionError> {
        let input = self.input.build(&self.coercions, &self.type_checks)?;
        let output = self.output.build(&self.coercions, &self.type_checks)?;
        Ok((input, output))
    }
}
