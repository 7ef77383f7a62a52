//! # Manager Configuration
//!
//! Declarative manager setup, deserializable from YAML or JSON:
//!
//! ```yaml
//! coercions: [web]
//! input:
//!   schema: { name: str, age: { $optional: int, $default: 0 } }
//!   nulls: entries
//!   messages: { default: "bad value", int: "must be a whole number" }
//! output:
//!   schema: { id: uuid, created: datetime }
//!   summary: "Response failed validation."
//! ```
//!
//! Coercion presets are referenced by name and resolved by a caller-supplied
//! [`PresetResolver`], so the core never depends on preset crates.
//! Precedence follows [`crate::ManagerBuilder`]: shared presets first, then
//! direction presets in list order, later entries overriding earlier ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SpecDefinitionError;
use crate::manager::Manager;
use crate::normalize::RawSpec;
use crate::processor::{Direction, Processor};
use crate::registry::{CoercionRegistry, MessageRegistry};
use crate::spec::ScalarType;
use crate::verify::NullPolicy;

/// Message key that sets the fallback template.
const DEFAULT_MESSAGE_KEY: &str = "default";

/// A manager configuration could not be turned into a [`Manager`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No preset of that name is known for the direction.
    #[error("unknown coercion preset '{name}' for {direction}")]
    UnknownPreset { name: String, direction: Direction },

    /// A `messages` key that is neither `default` nor a type name.
    #[error("unknown message key '{key}' for {direction}")]
    UnknownMessageKey { key: String, direction: Direction },

    /// A schema failed to parse or normalize.
    #[error("invalid {direction} schema: {source}")]
    Schema {
        direction: Direction,
        #[source]
        source: SpecDefinitionError,
    },
}

/// Resolves coercion preset names to registries.
///
/// A preset may differ by direction (e.g. a web preset parses strings on
/// input and formats them on output).
pub trait PresetResolver {
    fn resolve(&self, name: &str, direction: Direction) -> Option<CoercionRegistry>;
}

impl<F> PresetResolver for F
where
    F: Fn(&str, Direction) -> Option<CoercionRegistry>,
{
    fn resolve(&self, name: &str, direction: Direction) -> Option<CoercionRegistry> {
        self(name, direction)
    }
}

/// Resolver that knows no presets.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPresets;

impl PresetResolver for NoPresets {
    fn resolve(&self, _name: &str, _direction: Direction) -> Option<CoercionRegistry> {
        None
    }
}

// -------------------------------------------------------------------------
// Config documents
// -------------------------------------------------------------------------

/// Top-level manager configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Presets applied to both directions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coercions: Vec<String>,
    pub input: ProcessorConfig,
    pub output: ProcessorConfig,
}

/// Per-direction settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    /// Schema in the JSON authoring form. Absent means `any`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
    /// Summary line of verification failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub nulls: NullPolicy,
    /// Presets for this direction only; override shared ones.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coercions: Vec<String>,
    /// Type-mismatch templates keyed by type name, or `default`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub messages: BTreeMap<String, String>,
}

impl ProcessorConfig {
    fn build(
        &self,
        direction: Direction,
        shared: &CoercionRegistry,
        presets: &dyn PresetResolver,
    ) -> Result<Processor, ConfigError> {
        let spec = match &self.schema {
            Some(json) => RawSpec::from_json(json)
                .map_err(|source| ConfigError::Schema { direction, source })?,
            None => RawSpec::Type(ScalarType::Any),
        };
        let coercions = shared.layered(&resolve_all(&self.coercions, direction, presets)?);
        let mut builder = Processor::builder(direction, spec)
            .coercions(coercions)
            .messages(self.message_registry(direction)?)
            .null_policy(self.nulls);
        if let Some(summary) = &self.summary {
            builder = builder.summary(summary.clone());
        }
        builder
            .build()
            .map_err(|source| ConfigError::Schema { direction, source })
    }

    fn message_registry(&self, direction: Direction) -> Result<MessageRegistry, ConfigError> {
        let mut messages = MessageRegistry::new();
        for (key, template) in &self.messages {
            if key == DEFAULT_MESSAGE_KEY {
                messages.set_default(template.clone());
                continue;
            }
            let ty = ScalarType::from_name(key).ok_or_else(|| ConfigError::UnknownMessageKey {
                key: key.clone(),
                direction,
            })?;
            messages.register(ty, template.clone());
        }
        Ok(messages)
    }
}

impl ManagerConfig {
    /// Build the manager, resolving presets through `presets`.
    pub fn build(&self, presets: &dyn PresetResolver) -> Result<Manager, ConfigError> {
        let shared_input = resolve_all(&self.coercions, Direction::Input, presets)?;
        let shared_output = resolve_all(&self.coercions, Direction::Output, presets)?;
        let input = self.input.build(Direction::Input, &shared_input, presets)?;
        let output = self.output.build(Direction::Output, &shared_output, presets)?;
        Ok(Manager::new(input, output))
    }
}

fn resolve_all(
    names: &[String],
    direction: Direction,
    presets: &dyn PresetResolver,
) -> Result<CoercionRegistry, ConfigError> {
    let mut registry = CoercionRegistry::new();
    for name in names {
        match presets.resolve(name, direction) {
            Some(preset) => registry.extend_from(&preset),
            None => {
                tracing::warn!(preset = %name, %direction, "unknown coercion preset");
                return Err(ConfigError::UnknownPreset {
                    name: name.clone(),
                    direction,
                });
            }
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const YAML: &str = r#"
coercions: [ints]
input:
  schema:
    name: str
    age: { $optional: int, $default: 0 }
  messages:
    default: "bad value ({actual})"
    str: "must be text"
output:
  schema: { id: int, "*": any }
  summary: "Response failed validation."
"#;

    fn presets(name: &str, direction: Direction) -> Option<CoercionRegistry> {
        match (name, direction) {
            ("ints", _) => Some(CoercionRegistry::new().with(ScalarType::Int, |v, _| {
                if let Value::Str(s) = &v {
                    if let Ok(n) = s.parse::<i64>() {
                        return Value::Int(n);
                    }
                }
                v
            })),
            ("zero", Direction::Input) => {
                Some(CoercionRegistry::new().with(ScalarType::Int, |_, _| Value::Int(0)))
            }
            _ => None,
        }
    }

    fn parse(yaml: &str) -> ManagerConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_yaml_config_builds_working_manager() {
        let manager = parse(YAML).build(&presets).unwrap();
        let out = manager
            .process_input(&Value::map([("name", "Ann")]))
            .unwrap();
        assert_eq!(out, Value::map([("name", Value::from("Ann")), ("age", Value::Int(0))]));
        let out = manager
            .process_input(&Value::map([("name", "Ann"), ("age", "41")]))
            .unwrap();
        assert_eq!(out.get("age"), Some(&Value::Int(41)));
    }

    #[test]
    fn test_messages_and_summary_from_config() {
        let manager = parse(YAML).build(&presets).unwrap();
        let err = manager
            .process_input(&Value::map([("name", Value::Int(1)), ("age", Value::from(true))]))
            .unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                ("age".to_string(), "bad value (bool)".to_string()),
                ("name".to_string(), "must be text".to_string()),
            ]
        );
        let err = manager.process_output(&Value::map([("id", "x")])).unwrap_err();
        assert_eq!(err.summary(), "Response failed validation.");
        assert!(manager
            .process_output(&Value::map([("id", Value::Int(1)), ("more", Value::Null)]))
            .is_ok());
    }

    #[test]
    fn test_direction_presets_override_shared() {
        let config = parse("coercions: [ints]
input: { schema: int, coercions: [zero] }
output: { schema: int }
");
        let manager = config.build(&presets).unwrap();
        assert_eq!(manager.coerce_input(&Value::from("7")), Value::Int(0));
        assert_eq!(manager.coerce_output(&Value::from("7")), Value::Int(7));
    }

    #[test]
    fn test_unknown_preset() {
        let config = parse("output: { coercions: [zero] }
");
        assert_eq!(
            config.build(&presets).unwrap_err(),
            ConfigError::UnknownPreset {
                name: "zero".to_string(),
                direction: Direction::Output,
            }
        );
        assert!(matches!(
            parse("coercions: [web]
").build(&NoPresets),
            Err(ConfigError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn test_unknown_message_key() {
        let config = parse("input: { messages: { integer: oops } }
");
        assert!(matches!(
            config.build(&NoPresets),
            Err(ConfigError::UnknownMessageKey { ref key, direction: Direction::Input }) if key == "integer"
        ));
    }

    #[test]
    fn test_schema_errors_name_direction() {
        let config = parse("output: { schema: { tags: [] } }
");
        let err = config.build(&NoPresets).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Schema { direction: Direction::Output, source: SpecDefinitionError::EmptySequence { .. } }
        ));
        assert_eq!(
            err.to_string(),
            "invalid output schema: ambiguous empty sequence at tags: use a one-element list or an explicit tuple"
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_yaml::from_str::<ManagerConfig>("inputs: {}
").is_err());
        assert!(serde_yaml::from_str::<ManagerConfig>("input: { nulls: sometimes }
").is_err());
    }

    #[test]
    fn test_empty_config_accepts_anything() {
        let manager = parse("{}").build(&NoPresets).unwrap();
        let v = Value::list([Value::Null, Value::from("x")]);
        assert_eq!(manager.process_input(&v).unwrap(), v);
    }

    #[test]
    fn test_null_policy_from_config() {
        let config = parse("input: { schema: { a: int }, nulls: entries }
");
        assert_eq!(config.input.nulls, NullPolicy::Entries);
        let manager = config.build(&NoPresets).unwrap();
        assert!(manager.verify_input(&Value::map([("a", Value::Null)])).is_ok());
    }
}
