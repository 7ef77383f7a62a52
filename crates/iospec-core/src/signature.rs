//! # Callable Signatures
//!
//! Derives an input schema from a callable's parameter list. Rust has no
//! runtime reflection, so a callable describes itself through the
//! [`Callable`] trait; [`Signature`] is a ready-made implementation for
//! handlers registered by name.
//!
//! | parameter                         | entry                                  |
//! |-----------------------------------|----------------------------------------|
//! | regular, no default               | `Required(annotation or any)`          |
//! | regular, with default             | `Optional(annotation or any, default)` |
//! | variadic keyword (`**kwargs`)     | mapping becomes unlimited              |
//! | variadic positional (`*args`)     | ignored                                |

use crate::error::SpecDefinitionError;
use crate::normalize::{normalize, RawSpec};
use crate::path::Path;
use crate::spec::{ScalarType, SpecNode};
use crate::value::Value;

/// How a parameter binds arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Bound by position or by name.
    Regular,
    /// Collects extra positional arguments.
    VarPositional,
    /// Collects extra keyword arguments.
    VarKeyword,
}

/// One parameter of a callable.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub default: Option<Value>,
    pub annotation: Option<RawSpec>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Regular,
            default: None,
            annotation: None,
        }
    }

    pub fn var_positional(name: impl Into<String>) -> Self {
        Self {
            kind: ParameterKind::VarPositional,
            ..Self::new(name)
        }
    }

    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self {
            kind: ParameterKind::VarKeyword,
            ..Self::new(name)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn annotated(mut self, annotation: impl Into<RawSpec>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }
}

/// Anything that can report its parameter list.
pub trait Callable {
    fn parameters(&self) -> Vec<Parameter>;
}

/// An explicit parameter list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// A regular parameter with no default and no annotation.
    pub fn required(self, name: impl Into<String>) -> Self {
        self.param(Parameter::new(name))
    }

    /// A regular parameter with a default and no annotation.
    pub fn optional(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.param(Parameter::new(name).with_default(default))
    }
}

impl Callable for Signature {
    fn parameters(&self) -> Vec<Parameter> {
        self.parameters.clone()
    }
}

/// Derive the input mapping schema of `callable`.
pub fn schema_from_callable<C: Callable + ?Sized>(
    callable: &C,
) -> Result<SpecNode, SpecDefinitionError> {
    let mut entries: Vec<(String, RawSpec)> = Vec::new();
    let mut extra: Option<RawSpec> = None;

    for param in callable.parameters() {
        let annotation = param
            .annotation
            .unwrap_or(RawSpec::Type(ScalarType::Any));
        match param.kind {
            ParameterKind::VarPositional => {}
            ParameterKind::VarKeyword => {
                if extra.is_some() {
                    return Err(SpecDefinitionError::InvalidShorthand {
                        path: Path::root().to_string(),
                        reason: format!(
                            "more than one variadic keyword parameter (`{}`)",
                            param.name
                        ),
                    });
                }
                extra = Some(annotation);
            }
            ParameterKind::Regular => {
                let entry = match param.default {
                    Some(default) => RawSpec::Optional {
                        inner: Box::new(annotation),
                        default: Some(default),
                    },
                    None => RawSpec::required(annotation),
                };
                entries.push((param.name, entry));
            }
        }
    }

    // Parameter names are plain keys, so a parameter called `*` is an entry.
    let unlimited = extra.map(|spec| match spec {
        RawSpec::Type(ScalarType::Any) => None,
        other => Some(Box::new(other)),
    });
    normalize(RawSpec::Declared { entries, unlimited })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::MappingSpec;
    use crate::spec::ScalarType::{Any, Int, Str};

    #[test]
    fn test_required_and_optional_parameters() {
        let sig = Signature::new().required("a").optional("b", 2i64);
        let spec = schema_from_callable(&sig).unwrap();
        let expected = SpecNode::from(
            MappingSpec::new()
                .required("a", Any)
                .optional_with_default("b", Any, 2i64),
        );
        assert_eq!(spec, expected);
    }

    #[test]
    fn test_annotations_are_used() {
        let sig = Signature::new()
            .param(Parameter::new("name").annotated(Str))
            .param(Parameter::new("tags").annotated(RawSpec::sequence([Str])))
            .param(Parameter::new("n").annotated(Int).with_default(0i64));
        let SpecNode::Mapping(m) = schema_from_callable(&sig).unwrap() else {
            panic!("expected mapping");
        };
        assert_eq!(m.entry("name"), Some(&SpecNode::required(Str)));
        assert_eq!(m.entry("tags"), Some(&SpecNode::required(SpecNode::list_of(Str))));
        assert!(!m.entry("n").map_or(true, SpecNode::is_required));
        assert!(!m.allows_unlimited());
    }

    #[test]
    fn test_var_keyword_opens_mapping() {
        let sig = Signature::new()
            .required("a")
            .param(Parameter::var_positional("args"))
            .param(Parameter::var_keyword("kwargs"));
        let SpecNode::Mapping(m) = schema_from_callable(&sig).unwrap() else {
            panic!("expected mapping");
        };
        assert!(m.allows_unlimited());
        assert!(m.unlimited_value_spec().is_none());
        assert!(m.entry("args").is_none());
        assert_eq!(m.entries().len(), 1);
    }

    #[test]
    fn test_annotated_var_keyword_types_extras() {
        let sig = Signature::new().param(Parameter::var_keyword("opts").annotated(Int));
        let SpecNode::Mapping(m) = schema_from_callable(&sig).unwrap() else {
            panic!("expected mapping");
        };
        assert_eq!(m.unlimited_value_spec(), Some(&SpecNode::Scalar(Int)));
    }

    #[test]
    fn test_duplicate_parameter() {
        let sig = Signature::new().required("a").required("a");
        assert!(matches!(
            schema_from_callable(&sig),
            Err(SpecDefinitionError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_two_var_keywords_rejected() {
        let sig = Signature::new()
            .param(Parameter::var_keyword("a"))
            .param(Parameter::var_keyword("b"));
        assert!(matches!(
            schema_from_callable(&sig),
            Err(SpecDefinitionError::InvalidShorthand { .. })
        ));
    }

    #[test]
    fn test_star_parameter_is_a_plain_key() {
        let sig = Signature::new()
            .param(Parameter::new("*").annotated(Int))
            .param(Parameter::var_keyword("rest").annotated(Str));
        let SpecNode::Mapping(m) = schema_from_callable(&sig).unwrap() else {
            panic!("expected mapping");
        };
        assert_eq!(m.entry("*"), Some(&SpecNode::required(Int)));
        assert_eq!(m.unlimited_value_spec(), Some(&SpecNode::Scalar(Str)));
    }

    #[test]
    fn test_mistyped_parameter_default() {
        let sig = Signature::new().param(Parameter::new("n").annotated(Int).with_default("zero"));
        assert!(matches!(
            schema_from_callable(&sig),
            Err(SpecDefinitionError::InvalidDefault { ref path, .. }) if path == "n"
        ));
    }

    struct Handler;

    impl Callable for Handler {
        fn parameters(&self) -> Vec<Parameter> {
            vec![Parameter::new("id").annotated(ScalarType::Uuid)]
        }
    }

    #[test]
    fn test_custom_callable() {
        let spec = schema_from_callable(&Handler).unwrap();
        assert_eq!(
            spec,
            SpecNode::from(MappingSpec::new().required("id", ScalarType::Uuid))
        );
    }
}
