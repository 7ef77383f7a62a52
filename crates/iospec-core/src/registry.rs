//! # Registries
//!
//! Per-type customization points keyed by [`ScalarType`]:
//!
//! - [`CoercionRegistry`] — `(value, expected_type) → value` functions used
//!   by the coercion engine.
//! - [`TypeCheckRegistry`] — functions that can force a scalar check to pass
//!   or fail before the built-in identity check runs.
//! - [`MessageRegistry`] — message templates for type-mismatch violations.
//!
//! Registries are plain values. Functions are held behind `Arc` so cloning a
//! registry (e.g. to layer direction-specific entries over shared ones) is
//! cheap, and must be `Send + Sync` so processors can be shared across
//! threads.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::spec::ScalarType;
use crate::value::{Value, ValueKind};

/// A coercion function: `(raw_value, expected_type) → coerced_value`.
///
/// Must not fail. Values it cannot handle are returned unchanged.
pub type CoercionFn = Arc<dyn Fn(Value, ScalarType) -> Value + Send + Sync>;

/// A custom type-check function. `None` defers to the built-in check.
pub type TypeCheckFn = Arc<dyn Fn(&Value, ScalarType) -> Option<TypeCheck> + Send + Sync>;

/// When a registered coercion function is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum CoercionPolicy {
    /// Only for values that are not already of the expected type.
    #[default]
    WhenMismatched,
    /// For every value at the node, including already-typed ones. Used by
    /// output registries that export internal types (e.g. uuid → string).
    Always,
}

#[derive(Clone)]
struct CoercionRule {
    policy: CoercionPolicy,
    func: CoercionFn,
}

/// Coercion functions keyed by expected type.
#[derive(Clone, Default)]
pub struct CoercionRegistry {
    rules: HashMap<ScalarType, CoercionRule>,
}

impl CoercionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` for `ty`, replacing any earlier entry.
    pub fn register<F>(&mut self, ty: ScalarType, func: F)
    where
        F: Fn(Value, ScalarType) -> Value + Send + Sync + 'static,
    {
        self.insert(ty, CoercionPolicy::WhenMismatched, Arc::new(func));
    }

    /// Register `func` for `ty` with the [`CoercionPolicy::Always`] policy.
    pub fn register_always<F>(&mut self, ty: ScalarType, func: F)
    where
        F: Fn(Value, ScalarType) -> Value + Send + Sync + 'static,
    {
        self.insert(ty, CoercionPolicy::Always, Arc::new(func));
    }

    pub fn insert(&mut self, ty: ScalarType, policy: CoercionPolicy, func: CoercionFn) {
        self.rules.insert(ty, CoercionRule { policy, func });
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, ty: ScalarType, func: F) -> Self
    where
        F: Fn(Value, ScalarType) -> Value + Send + Sync + 'static,
    {
        self.register(ty, func);
        self
    }

    /// Builder form of [`register_always`](Self::register_always).
    pub fn with_always<F>(mut self, ty: ScalarType, func: F) -> Self
    where
        F: Fn(Value, ScalarType) -> Value + Send + Sync + 'static,
    {
        self.register_always(ty, func);
        self
    }

    pub fn contains(&self, ty: ScalarType) -> bool {
        self.rules.contains_key(&ty)
    }

    pub fn policy(&self, ty: ScalarType) -> Option<CoercionPolicy> {
        self.rules.get(&ty).map(|r| r.policy)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Copy every entry of `overrides` into `self`; `overrides` wins on
    /// conflicts.
    pub fn extend_from(&mut self, overrides: &CoercionRegistry) {
        for (ty, rule) in &overrides.rules {
            self.rules.insert(*ty, rule.clone());
        }
    }

    /// A new registry holding `self` with `overrides` layered on top.
    pub fn layered(&self, overrides: &CoercionRegistry) -> Self {
        let mut merged = self.clone();
        merged.extend_from(overrides);
        merged
    }

    /// Coerce a scalar toward `ty`. Never fails.
    pub fn apply(&self, value: Value, ty: ScalarType) -> Value {
        let Some(rule) = self.rules.get(&ty) else {
            return value;
        };
        if rule.policy == CoercionPolicy::WhenMismatched && ty.matches(&value) {
            return value;
        }
        let from = value.kind();
        let coerced = (rule.func)(value, ty);
        tracing::trace!(expected = %ty, from = %from, to = %coerced.kind(), "applied coercion");
        coerced
    }
}

impl fmt::Debug for CoercionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: BTreeSet<_> = self.rules.iter().map(|(t, r)| (*t, r.policy)).collect();
        f.debug_struct("CoercionRegistry").field("types", &types).finish()
    }
}

/// Outcome of a boolean-style type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCheck {
    Success,
    Failure,
}

impl TypeCheck {
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Self::Success
        } else {
            Self::Failure
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Custom type-check functions keyed by expected type.
#[derive(Clone, Default)]
pub struct TypeCheckRegistry {
    checks: HashMap<ScalarType, TypeCheckFn>,
}

impl TypeCheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, ty: ScalarType, func: F)
    where
        F: Fn(&Value, ScalarType) -> Option<TypeCheck> + Send + Sync + 'static,
    {
        self.checks.insert(ty, Arc::new(func));
    }

    pub fn with<F>(mut self, ty: ScalarType, func: F) -> Self
    where
        F: Fn(&Value, ScalarType) -> Option<TypeCheck> + Send + Sync + 'static,
    {
        self.register(ty, func);
        self
    }

    pub fn contains(&self, ty: ScalarType) -> bool {
        self.checks.contains_key(&ty)
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn extend_from(&mut self, overrides: &TypeCheckRegistry) {
        for (ty, func) in &overrides.checks {
            self.checks.insert(*ty, Arc::clone(func));
        }
    }

    pub fn layered(&self, overrides: &TypeCheckRegistry) -> Self {
        let mut merged = self.clone();
        merged.extend_from(overrides);
        merged
    }

    /// Run the custom check for `ty`, if one is registered and it does not
    /// defer.
    pub fn evaluate(&self, value: &Value, ty: ScalarType) -> Option<TypeCheck> {
        self.checks.get(&ty).and_then(|check| check(value, ty))
    }
}

impl fmt::Debug for TypeCheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: BTreeSet<_> = self.checks.keys().copied().collect();
        f.debug_struct("TypeCheckRegistry").field("types", &types).finish()
    }
}

/// Default template for type-mismatch violations.
pub const DEFAULT_TYPE_MESSAGE: &str = "expected '{expected}'; got '{actual}'";

/// Message templates for type-mismatch violations.
///
/// Templates may use `{expected}` (the scalar type name) and `{actual}` (the
/// value's kind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRegistry {
    default: String,
    by_type: HashMap<ScalarType, String>,
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self {
            default: DEFAULT_TYPE_MESSAGE.to_string(),
            by_type: HashMap::new(),
        }
    }
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fallback template.
    pub fn with_default(mut self, template: impl Into<String>) -> Self {
        self.default = template.into();
        self
    }

    /// Set the template for `ty`.
    pub fn with(mut self, ty: ScalarType, template: impl Into<String>) -> Self {
        self.register(ty, template);
        self
    }

    pub fn register(&mut self, ty: ScalarType, template: impl Into<String>) {
        self.by_type.insert(ty, template.into());
    }

    pub fn set_default(&mut self, template: impl Into<String>) {
        self.default = template.into();
    }

    pub fn template_for(&self, ty: ScalarType) -> &str {
        self.by_type.get(&ty).map_or(self.default.as_str(), String::as_str)
    }

    /// Render the type-mismatch message for `ty` against a value of `actual`
    /// kind.
    pub fn render(&self, ty: ScalarType, actual: ValueKind) -> String {
        self.template_for(ty)
            .replace("{expected}", ty.name())
            .replace("{actual}", actual.name())
    }
}
