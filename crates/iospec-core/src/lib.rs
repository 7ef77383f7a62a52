//! # iospec-core — Input/Output Schemas for Semi-Structured Values
//!
//! Declarative schemas ("iospecs") for values decoded from JSON-like
//! sources, and the engine that applies them at a system boundary.
//!
//! ## Pipeline
//!
//! A schema is authored in shorthand ([`RawSpec`], or JSON/YAML through
//! [`RawSpec::from_json`]) and normalized once into a canonical [`SpecNode`]
//! tree. Two pure, total walks run over that tree:
//!
//! - [`coerce()`] — best-effort normalization toward the expected scalar
//!   types. Never fails; anything it cannot fix is passed through.
//! - [`verify()`] — the authoritative structural and nominal check. Collects
//!   every violation in one pass, each tagged with the path where it was found.
//!
//! A [`Processor`] binds one schema to its registries and a direction tag.
//! A [`Manager`] pairs an input processor with an output processor:
//!
//! - `process_input`: coerce, then verify (sanitize, then check).
//! - `process_output`: verify, then coerce (check the producer's contract,
//!   then convert to the external representation).
//!
//! ## Crate Policy
//!
//! - No I/O. Values arrive already decoded; the crate never reads files or
//!   sockets.
//! - Schemas, processors and managers are immutable after construction and
//!   are `Send + Sync`.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Schema errors surface at configuration time ([`SpecDefinitionError`]),
//!   never at call time.

pub mod coerce;
pub mod config;
pub mod error;
pub mod manager;
pub mod normalize;
pub mod path;
pub mod processor;
pub mod registry;
pub mod signature;
pub mod spec;
pub mod value;
pub mod verify;

// Re-export primary types for ergonomic imports.
pub use coerce::coerce;
pub use config::{ConfigError, ManagerConfig, NoPresets, PresetResolver, ProcessorConfig};
pub use error::{IospecError, SpecDefinitionError, VerificationFailure};
pub use manager::{
    DefaultSelector, KeyedSelector, Manager, ManagerBuilder, Pipeline, ProcessorSelector,
};
pub use normalize::{normalize, normalize_json, RawSpec, UNLIMITED_KEY};
pub use path::{Path, PathSegment};
pub use processor::{Direction, Processor, ProcessorBuilder};
pub use registry::{
    CoercionFn, CoercionPolicy, CoercionRegistry, MessageRegistry, TypeCheck, TypeCheckFn,
    TypeCheckRegistry, DEFAULT_TYPE_MESSAGE,
};
pub use signature::{schema_from_callable, Callable, Parameter, ParameterKind, Signature};
pub use spec::{MappingSpec, ScalarType, SpecNode};
pub use value::{Map, Value, ValueKind};
pub use verify::{verify, NullPolicy, Verifier, Violation, ViolationKind, Violations};
