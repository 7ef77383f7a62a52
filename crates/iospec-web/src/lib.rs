//! # iospec-web — Coercion Presets for Web Boundaries
//!
//! JSON has no datetime, uuid or decimal type, and does not distinguish
//! integers from floats. These presets bridge that gap at an HTTP boundary:
//!
//! | preset    | direction | conversions                                          |
//! |-----------|-----------|------------------------------------------------------|
//! | `web`     | input     | str → datetime, str → uuid, int/str → decimal, int → float |
//! | `web`     | output    | datetime → RFC 3339 str, uuid → str, decimal → str   |
//! | `form`    | input     | str → bool, str → int, str → float (query strings)   |
//!
//! Output conversions use [`CoercionPolicy::Always`](iospec_core::CoercionPolicy):
//! they apply to values that already have the expected type, since exporting
//! those values is their whole purpose. Running a value through the output
//! preset and then the input preset yields the starting value.
//!
//! ## Crate Policy
//!
//! - Conversions never fail. Unparseable strings pass through unchanged and
//!   are reported by verification.
//! - Datetime parsing is lenient (any offset; naive timestamps read as UTC).
//!   Output always renders UTC with a `Z` suffix.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use iospec_core::{
    CoercionRegistry, Direction, Manager, ManagerBuilder, PresetResolver, Processor, RawSpec,
    ScalarType, SpecDefinitionError, Value,
};

/// Name of the JSON preset.
pub const WEB_PRESET: &str = "web";
/// Name of the form/query-string preset.
pub const FORM_PRESET: &str = "form";

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

// -------------------------------------------------------------------------
// Registries
// -------------------------------------------------------------------------

/// Input conversions for JSON request bodies.
pub fn input_coercions() -> CoercionRegistry {
    CoercionRegistry::new()
        .with(ScalarType::DateTime, |value, _| match &value {
            Value::Str(s) => parse_datetime(s).map(Value::DateTime).unwrap_or(value),
            _ => value,
        })
        .with(ScalarType::Uuid, |value, _| match &value {
            Value::Str(s) => Uuid::parse_str(s.trim()).map(Value::Uuid).unwrap_or(value),
            _ => value,
        })
        .with(ScalarType::Decimal, |value, _| match &value {
            Value::Int(n) => Value::Decimal(Decimal::from(*n)),
            Value::Str(s) => Decimal::from_str(s.trim())
                .map(Value::Decimal)
                .unwrap_or(value),
            _ => value,
        })
        .with(ScalarType::Float, |value, _| match value {
            Value::Int(n) => Value::Float(n as f64),
            other => other,
        })
}

/// Output conversions for JSON response bodies.
pub fn output_coercions() -> CoercionRegistry {
    CoercionRegistry::new()
        .with_always(ScalarType::DateTime, |value, _| match value {
            Value::DateTime(dt) => Value::Str(format_datetime(&dt)),
            other => other,
        })
        .with_always(ScalarType::Uuid, |value, _| match value {
            Value::Uuid(u) => Value::Str(u.hyphenated().to_string()),
            other => other,
        })
        .with_always(ScalarType::Decimal, |value, _| match value {
            Value::Decimal(d) => Value::Str(d.to_string()),
            other => other,
        })
}

/// Input conversions for form fields and query strings, where every value
/// arrives as a string.
pub fn form_coercions() -> CoercionRegistry {
    CoercionRegistry::new()
        .with(ScalarType::Bool, |value, _| match &value {
            Value::Str(s) => parse_bool(s).map(Value::Bool).unwrap_or(value),
            _ => value,
        })
        .with(ScalarType::Int, |value, _| match &value {
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).unwrap_or(value),
            _ => value,
        })
        .with(ScalarType::Float, |value, _| match &value {
            Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).unwrap_or(value),
            Value::Int(n) => Value::Float(*n as f64),
            _ => value,
        })
}

/// Parse an RFC 3339 timestamp with any offset, or a naive ISO 8601
/// timestamp read as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(s, format)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

/// Render as RFC 3339 in UTC with a `Z` suffix, keeping sub-second digits.
pub fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
    dt.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// -------------------------------------------------------------------------
// Presets
// -------------------------------------------------------------------------

/// Look up a preset by name for `direction`.
///
/// `form` has no output side; it resolves to an empty registry there so a
/// shared `coercions: [form]` list stays valid.
pub fn preset(name: &str, direction: Direction) -> Option<CoercionRegistry> {
    match (name, direction) {
        (WEB_PRESET, Direction::Input) => Some(input_coercions()),
        (WEB_PRESET, Direction::Output) => Some(output_coercions()),
        (FORM_PRESET, Direction::Input) => Some(form_coercions()),
        (FORM_PRESET, Direction::Output) => Some(CoercionRegistry::new()),
        _ => None,
    }
}

/// [`PresetResolver`] for the presets in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPresets;

impl PresetResolver for WebPresets {
    fn resolve(&self, name: &str, direction: Direction) -> Option<CoercionRegistry> {
        let resolved = preset(name, direction);
        if resolved.is_some() {
            tracing::debug!(preset = name, %direction, "resolved coercion preset");
        }
        resolved
    }
}

// -------------------------------------------------------------------------
// Convenience constructors
// -------------------------------------------------------------------------

/// An input processor using the `web` preset.
pub fn input_processor(spec: impl Into<RawSpec>) -> Result<Processor, SpecDefinitionError> {
    Processor::builder(Direction::Input, spec)
        .coercions(input_coercions())
        .build()
}

/// An output processor using the `web` preset.
pub fn output_processor(spec: impl Into<RawSpec>) -> Result<Processor, SpecDefinitionError> {
    Processor::builder(Direction::Output, spec)
        .coercions(output_coercions())
        .build()
}

/// A manager builder preloaded with the `web` preset in both directions.
pub fn manager_builder() -> ManagerBuilder {
    ManagerBuilder::new()
        .input_coercions(input_coercions())
        .output_coercions(output_coercions())
}

/// A manager using the `web` preset in both directions.
pub fn manager(
    input: impl Into<RawSpec>,
    output: impl Into<RawSpec>,
) -> Result<Manager, SpecDefinitionError> {
    manager_builder().input_spec(input).output_spec(output).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn coerce_in(value: Value, ty: ScalarType) -> Value {
        input_coercions().apply(value, ty)
    }

    fn coerce_out(value: Value, ty: ScalarType) -> Value {
        output_coercions().apply(value, ty)
    }

    #[test]
    fn test_input_datetime_from_rfc3339() {
        let out = coerce_in(Value::from("2026-01-15T12:00:00+05:30"), ScalarType::DateTime);
        let expected = Utc.with_ymd_and_hms(2026, 1, 15, 6, 30, 0).unwrap();
        assert_eq!(out, Value::from(expected));
    }

    #[test]
    fn test_input_datetime_naive_is_utc() {
        let out = coerce_in(Value::from("2026-01-15T12:00:00.250"), ScalarType::DateTime);
        let Value::DateTime(dt) = out else {
            panic!("expected datetime, got {out:?}");
        };
        assert_eq!(dt.offset().local_minus_utc(), 0);
        assert_eq!(dt.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_input_uuid_and_decimal() {
        let id = Uuid::new_v4();
        assert_eq!(
            coerce_in(Value::from(id.to_string()), ScalarType::Uuid),
            Value::Uuid(id)
        );
        assert_eq!(
            coerce_in(Value::Int(123), ScalarType::Decimal),
            Value::Decimal(Decimal::from(123))
        );
        assert_eq!(
            coerce_in(Value::from("1.50"), ScalarType::Decimal),
            Value::Decimal(Decimal::new(150, 2))
        );
    }

    #[test]
    fn test_unparseable_passes_through() {
        for ty in [ScalarType::DateTime, ScalarType::Uuid, ScalarType::Decimal] {
            assert_eq!(coerce_in(Value::from("nope"), ty), Value::from("nope"));
            assert_eq!(coerce_in(Value::Bool(true), ty), Value::Bool(true));
            assert_eq!(coerce_out(Value::Bool(true), ty), Value::Bool(true));
        }
    }

    #[test]
    fn test_input_int_to_float() {
        assert_eq!(coerce_in(Value::Int(2), ScalarType::Float), Value::Float(2.0));
    }

    #[test]
    fn test_output_exports_typed_values() {
        let id = Uuid::nil();
        assert_eq!(
            coerce_out(Value::Uuid(id), ScalarType::Uuid),
            Value::from("00000000-0000-0000-0000-000000000000")
        );
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(
            coerce_out(Value::from(dt), ScalarType::DateTime),
            Value::from("2026-01-15T12:00:00Z")
        );
        assert_eq!(
            coerce_out(Value::Decimal(Decimal::new(150, 2)), ScalarType::Decimal),
            Value::from("1.50")
        );
    }

    #[test]
    fn test_form_coercions() {
        let form = form_coercions();
        assert_eq!(form.apply(Value::from("Yes"), ScalarType::Bool), Value::Bool(true));
        assert_eq!(form.apply(Value::from("off"), ScalarType::Bool), Value::Bool(false));
        assert_eq!(form.apply(Value::from("maybe"), ScalarType::Bool), Value::from("maybe"));
        assert_eq!(form.apply(Value::from(" 42 "), ScalarType::Int), Value::Int(42));
        assert_eq!(form.apply(Value::from("2.5"), ScalarType::Float), Value::Float(2.5));
    }

    #[test]
    fn test_preset_lookup() {
        assert!(preset(WEB_PRESET, Direction::Input).is_some());
        assert!(preset(FORM_PRESET, Direction::Output).is_some_and(|r| r.is_empty()));
        assert!(preset("xml", Direction::Input).is_none());
        assert!(WebPresets.resolve("web", Direction::Output).is_some());
    }
}
