//! Forwarder signatures
//!
//! Each forwarder gets a parameter shape. In order of precedence:
//!
//! 1. An explicit signature from the request, shared by every member.
//! 2. Writers: `name=` takes exactly one value, `[]=` takes index arguments
//!    followed by one value.
//! 3. A plain positional signature copied from the capability source, when
//!    every parameter there is required.
//! 4. Generic forwarding of whatever arguments the caller passes.
//!
//! A member missing from an explicit (`as`) capability source is a
//! configuration error; for an inferred source it just means step 4.

use std::fmt;

use relay_core::{parse_parameters, Arity, ParameterInfo};

use crate::error::{ConfigError, ConfigResult};
use crate::resolver::CapabilitySource;

/// Literal meaning "forward everything"
pub const GENERIC: &str = "...";

/// Parameter shape of a forwarder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamShape {
    /// Parameter list given with the request
    Explicit(Vec<ParameterInfo>),
    /// Attribute writer: one value
    Writer,
    /// Index writer: one or more index arguments, then the value
    IndexWriter,
    /// Required positional parameters copied from the target
    Positional(Vec<String>),
    /// Any arguments, passed through unchanged
    Forward,
}

impl ParamShape {
    /// Parse an explicit signature literal
    pub fn parse_explicit(literal: &str) -> ConfigResult<Self> {
        if literal.trim() == GENERIC {
            return Ok(ParamShape::Forward);
        }
        Ok(ParamShape::Explicit(parse_parameters(literal)?))
    }

    /// Parameters declared on the generated member
    pub fn parameters(&self) -> Vec<ParameterInfo> {
        match self {
            ParamShape::Explicit(params) => params.clone(),
            ParamShape::Writer => vec![ParameterInfo::required("arg")],
            ParamShape::IndexWriter => {
                vec![ParameterInfo::rest("index"), ParameterInfo::required("value")]
            }
            ParamShape::Positional(names) => {
                names.iter().map(ParameterInfo::required).collect()
            }
            ParamShape::Forward => vec![ParameterInfo::rest("args")],
        }
    }

    /// Argument counts the generated member accepts
    pub fn arity(&self) -> Arity {
        Arity::of(&self.parameters())
    }

    /// Whether arguments pass through unchecked
    pub fn is_generic(&self) -> bool {
        *self == ParamShape::Forward
    }
}

impl fmt::Display for ParamShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_generic() {
            return write!(f, "({})", GENERIC);
        }
        let params: Vec<String> = self.parameters().iter().map(|p| p.to_string()).collect();
        write!(f, "({})", params.join(", "))
    }
}

/// Kind of writer a member name denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterKind {
    /// `name=`
    Attribute,
    /// `[]=`
    Index,
}

/// Classify `member` as a writer, if it is one
pub fn writer_kind(member: &str) -> Option<WriterKind> {
    if member.ends_with("]=") {
        Some(WriterKind::Index)
    } else if member.len() > 1 && member.ends_with('=') {
        Some(WriterKind::Attribute)
    } else {
        None
    }
}

/// Shape of the forwarder for `member`
pub fn infer(
    member: &str,
    explicit: Option<&ParamShape>,
    capability: Option<&CapabilitySource>,
) -> ConfigResult<ParamShape> {
    if let Some(shape) = explicit {
        return Ok(shape.clone());
    }

    match writer_kind(member) {
        Some(WriterKind::Attribute) => return Ok(ParamShape::Writer),
        Some(WriterKind::Index) => return Ok(ParamShape::IndexWriter),
        None => {}
    }

    let Some(capability) = capability else {
        return Ok(ParamShape::Forward);
    };

    match capability.lookup(member) {
        Ok(info) if info.is_plain_positional() => Ok(ParamShape::Positional(info.required_names())),
        Ok(_) => Ok(ParamShape::Forward),
        Err(source) if capability.is_explicit() => Err(ConfigError::UnknownMember {
            member: member.to_string(),
            class: capability.class().display_name(),
            source,
        }),
        Err(_) => Ok(ParamShape::Forward),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{Class, ClassRef, Method, ParamKind, Runtime, RuntimeError, Value, Visibility};

    fn person(rt: &Runtime) -> ClassRef {
        let stub = |_: &Runtime, _: &Value, _: &[Value]| Ok::<_, RuntimeError>(Value::Null);
        rt.define_class(
            Class::new("Person")
                .with_method(Method::new("name", vec![], stub))
                .with_method(Method::new(
                    "greet",
                    vec![ParameterInfo::required("other"), ParameterInfo::new("blk", ParamKind::Block)],
                    stub,
                ))
                .with_method(Method::new(
                    "log",
                    vec![ParameterInfo::required("msg"), ParameterInfo::optional("level")],
                    stub,
                ))
                .with_method(Method::new("hidden", vec![], stub).with_visibility(Visibility::Private)),
        )
    }

    #[test]
    fn test_writers() {
        assert_eq!(writer_kind("name="), Some(WriterKind::Attribute));
        assert_eq!(writer_kind("[]="), Some(WriterKind::Index));
        assert_eq!(writer_kind("name"), None);
        assert_eq!(writer_kind("="), None);

        assert_eq!(infer("name=", None, None).unwrap(), ParamShape::Writer);
        assert_eq!(ParamShape::Writer.arity(), Arity::exactly(1));
        assert_eq!(infer("[]=", None, None).unwrap(), ParamShape::IndexWriter);
        assert_eq!(ParamShape::IndexWriter.arity(), Arity::at_least(1));
        assert_eq!(ParamShape::IndexWriter.to_string(), "(*index, value)");
    }

    #[test]
    fn test_positional_from_capability() {
        let rt = Runtime::new();
        let capability = CapabilitySource::explicit(&person(&rt));

        assert_eq!(
            infer("name", None, Some(&capability)).unwrap(),
            ParamShape::Positional(vec![])
        );
        // Block parameters do not prevent a positional copy.
        let greet = infer("greet", None, Some(&capability)).unwrap();
        assert_eq!(greet, ParamShape::Positional(vec!["other".into()]));
        assert_eq!(greet.to_string(), "(other)");
        // Optional parameters do.
        assert_eq!(infer("log", None, Some(&capability)).unwrap(), ParamShape::Forward);
    }

    #[test]
    fn test_explicit_capability_requires_member() {
        let rt = Runtime::new();
        let capability = CapabilitySource::explicit(&person(&rt));

        for member in ["fly", "hidden"] {
            let err = infer(member, None, Some(&capability)).unwrap_err();
            assert!(
                matches!(err, ConfigError::UnknownMember { ref class, .. } if class == "Person"),
                "{} should be unknown",
                member
            );
        }
    }

    #[test]
    fn test_inferred_capability_falls_back() {
        let rt = Runtime::new();
        let class = person(&rt);
        let capability = CapabilitySource::of_class(&class);
        // Instance members are not on the static surface.
        assert_eq!(infer("name", None, Some(&capability)).unwrap(), ParamShape::Forward);
        assert_eq!(infer("name", None, None).unwrap(), ParamShape::Forward);
    }

    #[test]
    fn test_explicit_signature_applies_to_everything() {
        let shape = ParamShape::parse_explicit("key, value?").unwrap();
        assert_eq!(infer("name=", Some(&shape), None).unwrap(), shape);
        assert_eq!(infer("fly", Some(&shape), None).unwrap(), shape);
        assert_eq!(shape.arity(), Arity::of(&shape.parameters()));
        assert_eq!(shape.to_string(), "(key, value?)");

        assert_eq!(ParamShape::parse_explicit("...").unwrap(), ParamShape::Forward);
        assert_eq!(ParamShape::Forward.to_string(), "(...)");
        assert!(matches!(
            ParamShape::parse_explicit("a, 1b"),
            Err(ConfigError::InvalidSignature(_))
        ));
    }
}
