//! # Error Types
//!
//! - [`SpecDefinitionError`] — the schema itself is malformed. Raised while
//!   normalizing, i.e. at configuration time, never at call time.
//! - [`VerificationFailure`] — a value did not match its schema. Tagged with
//!   the [`Direction`] of the processor that produced it; input and output
//!   failures differ only by that tag and their summary line.
//! - [`IospecError`] — crate-level aggregate for callers that want a single
//!   error type.
//!
//! Coercion has no error type: it never fails.

use thiserror::Error;

use crate::config::ConfigError;
use crate::processor::Direction;
use crate::verify::Violations;

/// A schema could not be normalized.
///
/// Every variant carries the schema path (rendered) where the problem was
/// found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecDefinitionError {
    /// An empty sequence literal: neither a list element nor a tuple arity
    /// can be inferred from it.
    #[error("ambiguous empty sequence at {path}: use a one-element list or an explicit tuple")]
    EmptySequence { path: String },

    /// A presence marker directly wraps a marker of the other kind.
    #[error("conflicting presence markers at {path}: {outer} wraps {inner}")]
    ConflictingMarkers {
        path: String,
        outer: String,
        inner: String,
    },

    /// A presence marker outside a mapping entry.
    #[error("presence marker `{marker}` at {path} is only allowed on a mapping entry")]
    MisplacedMarker { path: String, marker: String },

    /// The same key declared twice in one mapping.
    #[error("duplicate key '{key}' at {path}")]
    DuplicateKey { path: String, key: String },

    /// A type name that is not a known scalar type.
    #[error("unknown type name '{name}' at {path}")]
    UnknownType { path: String, name: String },

    /// An optional entry's default does not match the entry's own spec.
    #[error("invalid default at {path}: {reason}")]
    InvalidDefault { path: String, reason: String },

    /// A literal that is not a valid shorthand form.
    #[error("invalid shorthand at {path}: {reason}")]
    InvalidShorthand { path: String, reason: String },
}

/// A value failed verification.
///
/// Carries every violation found in a single walk of the value tree.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{summary}\n{violations}")]
pub struct VerificationFailure {
    direction: Direction,
    summary: String,
    violations: Violations,
}

impl VerificationFailure {
    pub fn new(direction: Direction, summary: impl Into<String>, violations: Violations) -> Self {
        Self {
            direction,
            summary: summary.into(),
            violations,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// True for an input verification failure.
    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    /// True for an output verification failure.
    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }

    /// The summary line, e.g. `Invalid input.`
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn violations(&self) -> &Violations {
        &self.violations
    }

    pub fn into_violations(self) -> Violations {
        self.violations
    }

    /// `(path, message)` pairs in the order they were found.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.violations
            .iter()
            .map(|v| (v.path.to_string(), v.message.clone()))
            .collect()
    }
}

/// Top-level error type for iospec.
#[derive(Error, Debug)]
pub enum IospecError {
    /// The schema is malformed.
    #[error("spec definition error: {0}")]
    SpecDefinition(#[from] SpecDefinitionError),

    /// Inbound data did not match the input schema.
    #[error("input verification failed: {0}")]
    InputVerification(VerificationFailure),

    /// Outbound data did not match the output schema.
    #[error("output verification failed: {0}")]
    OutputVerification(VerificationFailure),

    /// A manager configuration could not be built.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<VerificationFailure> for IospecError {
    fn from(failure: VerificationFailure) -> Self {
        match failure.direction() {
            Direction::Input => Self::InputVerification(failure),
            Direction::Output => Self::OutputVerification(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use crate::verify::{Violation, ViolationKind};

    fn one_violation() -> Violations {
        Violations::from(vec![Violation {
            path: Path::root().key("extra"),
            kind: ViolationKind::UnexpectedKey,
            message: "unexpected key".to_string(),
        }])
    }

    #[test]
    fn test_failure_display_has_summary_and_paths() {
        let f = VerificationFailure::new(Direction::Input, "Invalid input.", one_violation());
        let s = f.to_string();
        assert!(s.starts_with("Invalid input.\n"));
        assert!(s.contains("extra: unexpected key"));
    }

    #[test]
    fn test_failure_direction_routes_top_level_error() {
        let input = VerificationFailure::new(Direction::Input, "x", one_violation());
        let output = VerificationFailure::new(Direction::Output, "x", one_violation());
        assert!(matches!(IospecError::from(input), IospecError::InputVerification(_)));
        assert!(matches!(IospecError::from(output), IospecError::OutputVerification(_)));
    }

    #[test]
    fn test_messages_pairs() {
        let f = VerificationFailure::new(Direction::Output, "Invalid output.", one_violation());
        assert!(f.is_output());
        assert_eq!(
            f.messages(),
            vec![("extra".to_string(), "unexpected key".to_string())]
        );
    }

    #[test]
    fn test_spec_error_display() {
        let e = SpecDefinitionError::ConflictingMarkers {
            path: "age".to_string(),
            outer: "required".to_string(),
            inner: "optional".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "conflicting presence markers at age: required wraps optional"
        );
    }
}
