//! Receiver expressions
//!
//! The target of a delegation is an expression evaluated against the owning
//! object every time a forwarded member is called:
//!
//! ```text
//! expr    := head ('.' member)*
//! head    := 'self'
//!          | '@' ident               field of the owner
//!          | '::'? Const ('::' Const)*  class bound in the namespace
//!          | ident                   member of the owner, or its field
//! member  := ident | reserved word
//! ident   := [a-z_][A-Za-z0-9_]*[?!]?
//! ```
//!
//! A bare reserved word is not a valid head; it has to be written as
//! `self.<word>` (see [`crate::reserved`]).

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use relay_core::{no_method, RuntimeError, RuntimeResult, Runtime, Value};

use crate::error::ConfigError;
use crate::reserved::ReservedNames;

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][A-Za-z0-9_]*[?!]?$").expect("identifier pattern"));

static CONST_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(::)?[A-Z][A-Za-z0-9_]*(::[A-Z][A-Za-z0-9_]*)*$").expect("constant pattern")
});

/// Whether `text` is a single member name usable as a derived prefix
pub fn is_member_name(text: &str) -> bool {
    IDENT.is_match(text)
}

/// Start of a receiver expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// The owning object itself
    SelfRef,
    /// `@name`: a field of the owner, null when unset
    Field(String),
    /// `name`: a member of the owner, falling back to its field
    Member(String),
    /// `::Name`: a class resolved through the namespace on every evaluation
    Constant(String),
}

/// Parsed receiver expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverExpr {
    source: String,
    head: Head,
    chain: Vec<String>,
}

impl ReceiverExpr {
    /// Parse an expression, rejecting bare reserved words
    pub fn parse(source: &str, reserved: &ReservedNames) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidReceiver {
            expr: source.to_string(),
            reason: reason.to_string(),
        };

        let text = source.trim();
        if text.is_empty() {
            return Err(invalid("expression is empty"));
        }

        // Constant paths contain `::`, so they are split off before the `.` chain.
        let (head_text, rest) = match text.find('.') {
            Some(dot) => (&text[..dot], Some(&text[dot + 1..])),
            None => (text, None),
        };

        let head = if head_text == "self" {
            Head::SelfRef
        } else if let Some(field) = head_text.strip_prefix('@') {
            if !IDENT.is_match(field) {
                return Err(invalid("field name is not an identifier"));
            }
            Head::Field(field.to_string())
        } else if CONST_PATH.is_match(head_text) {
            Head::Constant(head_text.trim_start_matches("::").to_string())
        } else if IDENT.is_match(head_text) {
            if reserved.is_reserved(head_text) {
                return Err(invalid("reserved word must be qualified with `self.`"));
            }
            Head::Member(head_text.to_string())
        } else {
            return Err(invalid("expected `self`, a field, a member or a class name"));
        };

        let mut chain = Vec::new();
        if let Some(rest) = rest {
            for segment in rest.split('.') {
                if !IDENT.is_match(segment) {
                    return Err(invalid("member access is not an identifier"));
                }
                chain.push(segment.to_string());
            }
        }

        Ok(Self {
            source: text.to_string(),
            head,
            chain,
        })
    }

    /// Expression naming a class bound in the namespace
    pub fn constant(name: &str) -> Self {
        Self {
            source: format!("::{}", name),
            head: Head::Constant(name.to_string()),
            chain: Vec::new(),
        }
    }

    /// Source text, as reported in errors
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Start of the expression
    pub fn head(&self) -> &Head {
        &self.head
    }

    /// Members called after the head, in order
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Whether the expression is the owner itself, with nothing called on it
    pub fn is_bare_self(&self) -> bool {
        self.head == Head::SelfRef && self.chain.is_empty()
    }

    /// Whether the expression is the owner's own runtime type (`self.class`)
    pub fn is_self_type(&self) -> bool {
        self.head == Head::SelfRef && self.chain.len() == 1 && self.chain[0] == "class"
    }

    /// Evaluate against `owner`
    pub fn eval(&self, rt: &Runtime, owner: &Value) -> RuntimeResult<Value> {
        let mut current = match &self.head {
            Head::SelfRef => owner.clone(),
            Head::Field(name) => owner
                .as_object()
                .and_then(|object| object.get_field(name))
                .unwrap_or_default(),
            Head::Member(name) => member_or_field(rt, owner, name)?,
            Head::Constant(path) => rt
                .lookup_class(path)
                .map(Value::Class)
                .ok_or_else(|| RuntimeError::UninitializedConstant(path.clone()))?,
        };

        for (i, member) in self.chain.iter().enumerate() {
            // `self.x` is an implicit-self call, so private members are reachable.
            current = if i == 0 && self.head == Head::SelfRef {
                member_or_field(rt, &current, member)?
            } else {
                rt.invoke(&current, member, &[])?
            };
        }
        Ok(current)
    }
}

/// Call `name` on the owner if it defines it, otherwise read the field.
///
/// Used for a bare member and for the first call after `self`. The owner's
/// catch-all is never consulted, so an expression naming a member that does
/// not exist fails instead of re-entering a proxy built on it.
fn member_or_field(rt: &Runtime, owner: &Value, name: &str) -> RuntimeResult<Value> {
    if rt.find_member(owner, name).is_some() {
        return rt.send(owner, name, &[]);
    }
    match owner.as_object().and_then(|object| object.get_field(name)) {
        Some(value) => Ok(value),
        None => Err(no_method(owner, name)),
    }
}

impl fmt::Display for ReceiverExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
