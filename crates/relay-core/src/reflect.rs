//! Member introspection
//!
//! Declared parameter lists and method descriptions, queried by the
//! delegation engine to decide how a forwarder accepts its arguments.

use std::fmt;

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::Visibility;

/// How a declared parameter binds arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Required positional (`name`)
    Required,
    /// Optional positional (`name?`)
    Optional,
    /// Variadic positional (`*name`)
    Rest,
    /// Keyword-style (`name:`); bound positionally after the positional params
    Keyword,
    /// Keyword rest (`**name`)
    KeywordRest,
    /// Block parameter (`&name`); never bound from positional arguments
    Block,
}

/// Parameter information for reflection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Parameter kind
    pub kind: ParamKind,
}

impl ParameterInfo {
    /// Create a parameter of the given kind
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a required positional parameter
    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Required)
    }

    /// Create an optional positional parameter
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Optional)
    }

    /// Create a variadic parameter
    pub fn rest(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Rest)
    }
}

impl fmt::Display for ParameterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::Required => write!(f, "{}", self.name),
            ParamKind::Optional => write!(f, "{}?", self.name),
            ParamKind::Rest => write!(f, "*{}", self.name),
            ParamKind::Keyword => write!(f, "{}:", self.name),
            ParamKind::KeywordRest => write!(f, "**{}", self.name),
            ParamKind::Block => write!(f, "&{}", self.name),
        }
    }
}

/// Malformed parameter list literal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid parameter `{param}` in `{list}`")]
pub struct ParamSyntaxError {
    /// Offending parameter text
    pub param: String,
    /// Whole literal
    pub list: String,
}

/// Parse a parameter list literal such as `"key, value?, *rest"`.
///
/// Grammar, comma separated: `name` required, `name?` optional, `*name`
/// rest, `name:` keyword, `**name` keyword rest, `&name` block. An empty or
/// all-whitespace literal is an empty list.
pub fn parse_parameters(list: &str) -> Result<Vec<ParameterInfo>, ParamSyntaxError> {
    let err = |param: &str| ParamSyntaxError {
        param: param.to_string(),
        list: list.to_string(),
    };

    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    list.split(',')
        .map(|raw| {
            let param = raw.trim();
            let (name, kind) = if let Some(name) = param.strip_prefix("**") {
                (name, ParamKind::KeywordRest)
            } else if let Some(name) = param.strip_prefix('*') {
                (name, ParamKind::Rest)
            } else if let Some(name) = param.strip_prefix('&') {
                (name, ParamKind::Block)
            } else if let Some(name) = param.strip_suffix('?') {
                (name, ParamKind::Optional)
            } else if let Some(name) = param.strip_suffix(':') {
                (name, ParamKind::Keyword)
            } else {
                (param, ParamKind::Required)
            };
            if is_identifier(name) {
                Ok(ParameterInfo::new(name, kind))
            } else {
                Err(err(param))
            }
        })
        .collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Number of positional arguments a parameter list accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Arity {
    /// Minimum number of arguments
    pub required: usize,
    /// Additional optional arguments
    pub optional: usize,
    /// Whether any number of further arguments is accepted
    pub rest: bool,
}

impl Arity {
    /// Exactly `n` arguments
    pub const fn exactly(n: usize) -> Self {
        Self {
            required: n,
            optional: 0,
            rest: false,
        }
    }

    /// At least `n` arguments
    pub const fn at_least(n: usize) -> Self {
        Self {
            required: n,
            optional: 0,
            rest: true,
        }
    }

    /// Derive the arity of a declared parameter list
    pub fn of(params: &[ParameterInfo]) -> Self {
        params.iter().fold(Arity::default(), |mut arity, p| {
            match p.kind {
                ParamKind::Required => arity.required += 1,
                ParamKind::Optional | ParamKind::Keyword => arity.optional += 1,
                ParamKind::Rest | ParamKind::KeywordRest => arity.rest = true,
                ParamKind::Block => {}
            }
            arity
        })
    }

    /// Whether `given` arguments are accepted
    pub fn accepts(&self, given: usize) -> bool {
        given >= self.required && (self.rest || given <= self.required + self.optional)
    }

    /// Fail with an arity error naming `member` unless `given` is accepted
    pub fn check(&self, member: &str, given: usize) -> RuntimeResult<()> {
        if self.accepts(given) {
            Ok(())
        } else {
            Err(RuntimeError::Arity {
                name: member.to_string(),
                given,
                expected: self.to_string(),
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rest {
            write!(f, "{}+", self.required)
        } else if self.optional == 0 {
            write!(f, "{}", self.required)
        } else {
            write!(f, "{}..={}", self.required, self.required + self.optional)
        }
    }
}

/// Method information for reflection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Declared parameters
    pub parameters: Vec<ParameterInfo>,
    /// Visibility
    pub visibility: Visibility,
    /// Name of the class that declares the method
    pub declaring_class: String,
    /// Whether this is a class-level (static) method
    pub is_static: bool,
}

impl MethodInfo {
    /// Whether every parameter is a required positional parameter
    /// (block parameters are ignored)
    pub fn is_plain_positional(&self) -> bool {
        self.parameters
            .iter()
            .all(|p| matches!(p.kind, ParamKind::Required | ParamKind::Block))
    }

    /// Names of the required positional parameters, in order
    pub fn required_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParamKind::Required)
            .map(|p| p.name.clone())
            .collect()
    }
}
