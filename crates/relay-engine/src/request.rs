//! Delegation requests
//!
//! Builders describing what to generate. Nothing is validated here; the
//! [`crate::Delegator`] checks a request when it is planned.

use std::sync::Arc;

use relay_core::{ClassRef, SourceLocation};

/// Where forwarded calls go
#[derive(Debug, Clone)]
pub enum TargetDescriptor {
    /// A class, resolved through the namespace by name
    Type(ClassRef),
    /// A receiver expression evaluated against the owner
    Expr(String),
}

impl TargetDescriptor {
    /// Target as written, for error messages
    pub fn describe(&self) -> String {
        match self {
            TargetDescriptor::Type(class) => class.display_name(),
            TargetDescriptor::Expr(expr) => expr.clone(),
        }
    }
}

impl From<&str> for TargetDescriptor {
    fn from(expr: &str) -> Self {
        TargetDescriptor::Expr(expr.to_string())
    }
}

impl From<String> for TargetDescriptor {
    fn from(expr: String) -> Self {
        TargetDescriptor::Expr(expr)
    }
}

impl From<ClassRef> for TargetDescriptor {
    fn from(class: ClassRef) -> Self {
        TargetDescriptor::Type(class)
    }
}

impl From<&ClassRef> for TargetDescriptor {
    fn from(class: &ClassRef) -> Self {
        TargetDescriptor::Type(Arc::clone(class))
    }
}

/// Public-name prefix for forwarded members
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Prefix {
    /// Forwarders keep the member name
    #[default]
    None,
    /// Prefix with the target expression text
    Target,
    /// Prefix with the given text
    Named(String),
}

impl From<bool> for Prefix {
    fn from(enabled: bool) -> Self {
        if enabled {
            Prefix::Target
        } else {
            Prefix::None
        }
    }
}

impl From<&str> for Prefix {
    fn from(name: &str) -> Self {
        Prefix::Named(name.to_string())
    }
}

impl From<String> for Prefix {
    fn from(name: String) -> Self {
        Prefix::Named(name)
    }
}

/// Request to forward a list of members to one target
#[derive(Debug, Clone)]
pub struct DelegationRequest {
    pub(crate) members: Vec<String>,
    pub(crate) target: Option<TargetDescriptor>,
    pub(crate) prefix: Prefix,
    pub(crate) allow_null: bool,
    pub(crate) nullable: bool,
    pub(crate) private: bool,
    pub(crate) capability: Option<ClassRef>,
    pub(crate) signature: Option<String>,
    pub(crate) location: Option<SourceLocation>,
}

impl DelegationRequest {
    /// Forward `members`
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            target: None,
            prefix: Prefix::None,
            allow_null: false,
            nullable: true,
            private: false,
            capability: None,
            signature: None,
            location: None,
        }
    }

    /// Target of the forwarded calls
    pub fn to(mut self, target: impl Into<TargetDescriptor>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Public-name prefix: `true` derives it from the target
    pub fn prefix(mut self, prefix: impl Into<Prefix>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Return null instead of failing when the target is null
    pub fn allow_null(mut self, allow: bool) -> Self {
        self.allow_null = allow;
        self
    }

    /// Whether the target may be null at all.
    ///
    /// Declaring it `false` skips null handling; a null target then fails with
    /// the plain "no such member" error.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Make the generated members private
    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// Class whose public instance methods describe the target
    pub fn as_class(mut self, class: &ClassRef) -> Self {
        self.capability = Some(Arc::clone(class));
        self
    }

    /// Parameter list shared by every forwarder, `"..."` for generic
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Source location reported by the generated members
    pub fn annotate(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Annotate with the caller's location
    #[track_caller]
    pub fn here(self) -> Self {
        self.annotate(SourceLocation::caller())
    }

    /// Member names
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Target, if given
    pub fn target(&self) -> Option<&TargetDescriptor> {
        self.target.as_ref()
    }
}

/// Serialization hooks a catch-all proxy never claims
pub const SERIALIZATION_HOOKS: &[&str] = &["marshal_dump", "_dump"];

/// Request to install a catch-all proxy
#[derive(Debug, Clone)]
pub struct MissingRequest {
    pub(crate) target: String,
    pub(crate) allow_null: bool,
    pub(crate) excluded: Vec<String>,
    pub(crate) location: Option<SourceLocation>,
}

impl MissingRequest {
    /// Proxy unknown members to the receiver expression `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            allow_null: false,
            excluded: SERIALIZATION_HOOKS.iter().map(|s| s.to_string()).collect(),
            location: None,
        }
    }

    /// Return null instead of failing when the target is null
    pub fn allow_null(mut self, allow: bool) -> Self {
        self.allow_null = allow;
        self
    }

    /// Never claim `name`
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.push(name.into());
        self
    }

    /// Drop the default exclusions
    pub fn without_exclusions(mut self) -> Self {
        self.excluded.clear();
        self
    }

    /// Source location of the declaration
    pub fn annotate(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Names the proxy never claims
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }
}
