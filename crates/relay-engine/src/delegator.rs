//! Delegation entry points
//!
//! [`Delegator::plan`] validates a request and builds every forwarder before
//! anything is attached, so a request that fails leaves the owner untouched.

use std::sync::Arc;

use relay_core::{ClassRef, MissingHandler, Runtime, SourceLocation, Visibility};

use crate::error::{ConfigError, ConfigResult};
use crate::forwarder::{ForwardedMember, Forwarder, NullPolicy};
use crate::proxy::MissingProxy;
use crate::receiver::{is_member_name, ReceiverExpr};
use crate::request::{DelegationRequest, MissingRequest, Prefix, TargetDescriptor};
use crate::reserved::ReservedNames;
use crate::resolver;
use crate::signature::{self, ParamShape};

/// Generates forwarding members and catch-all proxies
#[derive(Debug)]
pub struct Delegator<'rt> {
    rt: &'rt Runtime,
    reserved: ReservedNames,
}

impl<'rt> Delegator<'rt> {
    /// Delegator for classes of `rt`, with the default reserved names
    pub fn new(rt: &'rt Runtime) -> Self {
        Self {
            rt,
            reserved: ReservedNames::default(),
        }
    }

    /// Replace the reserved-name set
    pub fn with_reserved(mut self, reserved: ReservedNames) -> Self {
        self.reserved = reserved;
        self
    }

    /// Reserved-name set in use
    pub fn reserved(&self) -> &ReservedNames {
        &self.reserved
    }

    /// Validate `request` and build its forwarders without attaching them
    pub fn plan(&self, owner: &ClassRef, request: DelegationRequest) -> ConfigResult<DelegationPlan> {
        if request.members.is_empty() {
            return Err(ConfigError::NoMembers);
        }
        if let Some(bad) = request.members.iter().find(|m| m.trim().is_empty()) {
            return Err(ConfigError::InvalidMember(bad.clone()));
        }
        let target = request.target.as_ref().ok_or(ConfigError::MissingTarget)?;
        let prefix = method_prefix(&request.prefix, target)?;

        let resolved = resolver::resolve(self.rt, target, request.capability.as_ref(), &self.reserved)?;
        let explicit = request
            .signature
            .as_deref()
            .map(ParamShape::parse_explicit)
            .transpose()?;

        let policy = if resolved.never_null {
            NullPolicy::Strict
        } else {
            NullPolicy::select(request.allow_null, request.nullable)
        };
        let visibility = if request.private {
            Visibility::Private
        } else {
            Visibility::Public
        };
        let receiver = Arc::new(resolved.receiver);

        let forwarders = request
            .members
            .iter()
            .map(|member| {
                let shape = signature::infer(member, explicit.as_ref(), resolved.capability.as_ref())?;
                let public_name = match &prefix {
                    Some(prefix) => format!("{}{}", prefix, member),
                    None => member.clone(),
                };
                Ok(Forwarder::new(
                    ForwardedMember {
                        member: member.clone(),
                        public_name,
                        shape,
                        policy,
                        visibility,
                    },
                    Arc::clone(&receiver),
                ))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(DelegationPlan {
            owner: Arc::clone(owner),
            forwarders,
            location: request.location,
        })
    }

    /// Generate forwarders for `request` on `owner`, returning their public names
    pub fn delegate(&self, owner: &ClassRef, request: DelegationRequest) -> ConfigResult<Vec<String>> {
        Ok(self.plan(owner, request)?.apply())
    }

    /// Install a catch-all proxy on `owner`, replacing any it already has
    pub fn delegate_missing_to(
        &self,
        owner: &ClassRef,
        request: MissingRequest,
    ) -> ConfigResult<Arc<MissingProxy>> {
        let text = self.reserved.qualify(request.target.trim());
        let receiver = ReceiverExpr::parse(&text, &self.reserved)?;
        if receiver.is_bare_self() {
            return Err(ConfigError::InvalidReceiver {
                expr: receiver.source().to_string(),
                reason: "a catch-all cannot forward to the object it is installed on".to_string(),
            });
        }
        let proxy = Arc::new(MissingProxy::new(receiver, request.allow_null, request.excluded));

        tracing::debug!(
            owner = %owner.display_name(),
            proxy = %proxy,
            location = ?request.location.as_ref().map(ToString::to_string),
            "installed catch-all proxy"
        );
        owner.set_missing_handler(Arc::clone(&proxy) as Arc<dyn MissingHandler>);
        Ok(proxy)
    }
}

/// `<prefix>_` for the request, if it asks for one
fn method_prefix(prefix: &Prefix, target: &TargetDescriptor) -> ConfigResult<Option<String>> {
    match prefix {
        Prefix::None => Ok(None),
        Prefix::Target => match target {
            TargetDescriptor::Expr(text) if is_member_name(text.trim()) => {
                Ok(Some(format!("{}_", text.trim())))
            }
            other => Err(ConfigError::InvalidPrefix {
                to: other.describe(),
            }),
        },
        Prefix::Named(name) if is_prefix_word(name) => Ok(Some(format!("{}_", name))),
        Prefix::Named(name) => Err(ConfigError::InvalidPrefix { to: name.clone() }),
    }
}

fn is_prefix_word(name: &str) -> bool {
    is_member_name(name) && !name.ends_with(['?', '!'])
}

/// Validated forwarders for one request, not yet attached
#[derive(Debug)]
pub struct DelegationPlan {
    owner: ClassRef,
    forwarders: Vec<Forwarder>,
    location: Option<SourceLocation>,
}

impl DelegationPlan {
    /// Class the forwarders will be attached to
    pub fn owner(&self) -> &ClassRef {
        &self.owner
    }

    /// Forwarders, in request order
    pub fn forwarders(&self) -> &[Forwarder] {
        &self.forwarders
    }

    /// Public names, in request order
    pub fn public_names(&self) -> Vec<String> {
        self.forwarders
            .iter()
            .map(|f| f.public_name().to_string())
            .collect()
    }

    /// Source location the forwarders report
    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Attach every forwarder to the owner, returning the public names
    pub fn apply(self) -> Vec<String> {
        let names = self.public_names();
        for forwarder in self.forwarders {
            tracing::debug!(
                owner = %self.owner.display_name(),
                forwarder = %forwarder,
                "generated forwarder"
            );
            self.owner
                .define_method(forwarder.into_method(self.location.clone()));
        }
        tracing::debug!(
            owner = %self.owner.display_name(),
            count = names.len(),
            "delegation applied"
        );
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Class;

    #[test]
    fn test_prefix_derivation() {
        let expr = TargetDescriptor::from("client");
        assert_eq!(method_prefix(&Prefix::None, &expr).unwrap(), None);
        assert_eq!(
            method_prefix(&Prefix::Target, &expr).unwrap(),
            Some("client_".to_string())
        );
        assert_eq!(
            method_prefix(&Prefix::from("customer"), &expr).unwrap(),
            Some("customer_".to_string())
        );

        for text in ["@client", "self.client", "Client"] {
            let err = method_prefix(&Prefix::Target, &TargetDescriptor::from(text)).unwrap_err();
            assert_eq!(err, ConfigError::InvalidPrefix { to: text.to_string() });
        }
        assert!(method_prefix(&Prefix::from(""), &expr).is_err());
        assert!(method_prefix(&Prefix::from("a.b"), &expr).is_err());
        for bad in ["1x", "x?", "Customer"] {
            let err = method_prefix(&Prefix::from(bad), &expr).unwrap_err();
            assert_eq!(err, ConfigError::InvalidPrefix { to: bad.to_string() });
        }
        assert_eq!(
            method_prefix(&Prefix::from("_x1"), &expr).unwrap(),
            Some("_x1_".to_string())
        );
    }

    #[test]
    fn test_prefix_with_class_target() {
        let rt = Runtime::new();
        let config = rt.define_class(Class::new("Config"));
        let err = method_prefix(&Prefix::Target, &TargetDescriptor::from(&config)).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPrefix { to: "Config".into() });
    }

    #[test]
    fn test_plan_does_not_attach() {
        let rt = Runtime::new();
        let owner = rt.define_class(Class::new("Owner"));
        let plan = Delegator::new(&rt)
            .plan(&owner, DelegationRequest::new(["size"]).to("items").prefix(true))
            .unwrap();
        assert_eq!(plan.public_names(), ["items_size"]);
        assert!(!owner.defines_method("items_size"));

        plan.apply();
        assert!(owner.defines_method("items_size"));
    }
}
