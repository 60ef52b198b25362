//! Target resolution
//!
//! Turns a [`TargetDescriptor`] into the receiver expression evaluated on
//! every call, plus the capability source used to infer forwarder signatures.

use std::sync::Arc;

use relay_core::{ClassRef, MethodInfo, Runtime, RuntimeResult};

use crate::error::{ConfigError, ConfigResult};
use crate::receiver::ReceiverExpr;
use crate::request::TargetDescriptor;
use crate::reserved::ReservedNames;

/// Which method table of a class describes the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Public instance methods
    Instance,
    /// Public static methods
    Static,
}

/// Class whose public members describe what the target can do
#[derive(Debug, Clone)]
pub struct CapabilitySource {
    class: ClassRef,
    surface: Surface,
    explicit: bool,
}

impl CapabilitySource {
    /// Instance surface of `class`, as named with `as`
    pub fn explicit(class: &ClassRef) -> Self {
        Self {
            class: Arc::clone(class),
            surface: Surface::Instance,
            explicit: true,
        }
    }

    /// Static surface of a class target
    pub fn of_class(class: &ClassRef) -> Self {
        Self {
            class: Arc::clone(class),
            surface: Surface::Static,
            explicit: false,
        }
    }

    /// Signature of the public member `name`
    pub fn lookup(&self, name: &str) -> RuntimeResult<MethodInfo> {
        match self.surface {
            Surface::Instance => self.class.public_instance_method(name),
            Surface::Static => self.class.public_static_method(name),
        }
    }

    /// Described class
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Described surface
    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Whether a failed lookup is a configuration error
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }
}

/// Outcome of resolving a target
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Expression evaluated on every call
    pub receiver: ReceiverExpr,
    /// Where signatures come from, if anywhere
    pub capability: Option<CapabilitySource>,
    /// The target can never be null, so null handling is skipped
    pub never_null: bool,
}

/// Resolve `target`, with `explicit` naming the capability class if given
pub fn resolve(
    rt: &Runtime,
    target: &TargetDescriptor,
    explicit: Option<&ClassRef>,
    reserved: &ReservedNames,
) -> ConfigResult<ResolvedTarget> {
    let mut resolved = match target {
        TargetDescriptor::Type(class) => resolve_class(rt, class)?,
        TargetDescriptor::Expr(text) => {
            let receiver = ReceiverExpr::parse(&reserved.qualify(text.trim()), reserved)?;
            let never_null = receiver.is_self_type();
            ResolvedTarget {
                receiver,
                capability: None,
                never_null,
            }
        }
    };

    if let Some(class) = explicit {
        resolved.capability = Some(CapabilitySource::explicit(class));
    }
    Ok(resolved)
}

fn resolve_class(rt: &Runtime, class: &ClassRef) -> ConfigResult<ResolvedTarget> {
    let name = class
        .name()
        .ok_or_else(|| ConfigError::AnonymousTarget(class.display_name()))?;

    let attached = rt
        .lookup_class(name)
        .is_some_and(|bound| bound.id() == class.id());
    if !attached {
        return Err(ConfigError::DetachedTarget(name.to_string()));
    }

    Ok(ResolvedTarget {
        receiver: ReceiverExpr::constant(name),
        capability: Some(CapabilitySource::of_class(class)),
        never_null: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{Class, Method, ParameterInfo};

    fn config_class(rt: &Runtime) -> ClassRef {
        rt.define_class(Class::new("Config").with_static_method(Method::new(
            "fetch",
            vec![ParameterInfo::required("key")],
            |_, _, _| Ok(relay_core::Value::Null),
        )))
    }

    #[test]
    fn test_class_target() {
        let rt = Runtime::new();
        let config = config_class(&rt);
        let resolved = resolve(
            &rt,
            &TargetDescriptor::from(&config),
            None,
            &ReservedNames::default(),
        )
        .unwrap();

        assert_eq!(resolved.receiver.source(), "::Config");
        let capability = resolved.capability.unwrap();
        assert_eq!(capability.surface(), Surface::Static);
        assert!(!capability.is_explicit());
        assert_eq!(capability.lookup("fetch").unwrap().required_names(), ["key"]);
    }

    #[test]
    fn test_anonymous_class_rejected() {
        let rt = Runtime::new();
        let anon = rt.define_class(Class::anonymous());
        let err = resolve(&rt, &TargetDescriptor::from(anon), None, &ReservedNames::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::AnonymousTarget(_)));
    }

    #[test]
    fn test_detached_class_rejected() {
        let rt = Runtime::new();
        let stale = config_class(&rt);
        rt.define_class(Class::new("Config"));
        let err = resolve(&rt, &TargetDescriptor::from(stale), None, &ReservedNames::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::DetachedTarget("Config".into()));

        // Never bound at all.
        let unbound = Arc::new(Class::new("Ghost"));
        let err = resolve(&rt, &TargetDescriptor::from(unbound), None, &ReservedNames::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::DetachedTarget("Ghost".into()));
    }

    #[test]
    fn test_reserved_expression_is_qualified() {
        let rt = Runtime::new();
        let resolved =
            resolve(&rt, &TargetDescriptor::from("class"), None, &ReservedNames::default()).unwrap();
        assert_eq!(resolved.receiver.source(), "self.class");
        assert!(resolved.never_null);
        assert!(resolved.capability.is_none());
    }

    #[test]
    fn test_explicit_capability_wins() {
        let rt = Runtime::new();
        let config = config_class(&rt);
        let person = rt.define_class(Class::new("Person"));
        let resolved = resolve(
            &rt,
            &TargetDescriptor::from(&config),
            Some(&person),
            &ReservedNames::default(),
        )
        .unwrap();
        let capability = resolved.capability.unwrap();
        assert_eq!(capability.class().id(), person.id());
        assert_eq!(capability.surface(), Surface::Instance);
        assert!(capability.is_explicit());
    }
}
