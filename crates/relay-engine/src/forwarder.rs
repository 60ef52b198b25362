//! Generated forwarding members
//!
//! A forwarder evaluates its receiver expression once per call and invokes
//! the member on the result with the caller's arguments. What happens when
//! the receiver is null depends on the [`NullPolicy`].

use std::fmt;
use std::sync::Arc;

use relay_core::{
    DelegationError, Method, Runtime, RuntimeResult, SourceLocation, Value, Visibility,
};

use crate::receiver::ReceiverExpr;
use crate::signature::ParamShape;

/// Behavior when the receiver evaluates to null
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// No null handling; the null value's own "no such member" error surfaces
    Strict,
    /// A null receiver yields null without invoking anything, unless the
    /// null value itself responds to the member
    BestEffort,
    /// A "no such member" failure for exactly this member on a null receiver
    /// becomes a [`DelegationError`]
    Guarded,
}

impl NullPolicy {
    /// Policy for a request's null options
    pub fn select(allow_null: bool, nullable: bool) -> Self {
        if !nullable {
            NullPolicy::Strict
        } else if allow_null {
            NullPolicy::BestEffort
        } else {
            NullPolicy::Guarded
        }
    }
}

impl fmt::Display for NullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NullPolicy::Strict => "strict",
            NullPolicy::BestEffort => "allow-null",
            NullPolicy::Guarded => "guarded",
        })
    }
}

/// Description of one forwarding member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedMember {
    /// Member invoked on the receiver
    pub member: String,
    /// Name the member is attached under
    pub public_name: String,
    /// Parameter shape
    pub shape: ParamShape,
    /// Null handling
    pub policy: NullPolicy,
    /// Visibility of the attached member
    pub visibility: Visibility,
}

/// A forwarding member ready to attach
#[derive(Debug, Clone)]
pub struct Forwarder {
    forwarded: ForwardedMember,
    receiver: Arc<ReceiverExpr>,
}

impl Forwarder {
    /// Forward `forwarded` through `receiver`
    pub fn new(forwarded: ForwardedMember, receiver: Arc<ReceiverExpr>) -> Self {
        Self { forwarded, receiver }
    }

    /// What this forwarder does
    pub fn forwarded(&self) -> &ForwardedMember {
        &self.forwarded
    }

    /// Expression the receiver is taken from
    pub fn receiver(&self) -> &ReceiverExpr {
        &self.receiver
    }

    /// Name the member is attached under
    pub fn public_name(&self) -> &str {
        &self.forwarded.public_name
    }

    /// Run the forwarder; `args` have already been checked against the shape.
    pub(crate) fn call(&self, rt: &Runtime, owner: &Value, args: &[Value]) -> RuntimeResult<Value> {
        let member = &self.forwarded.member;
        let target = self.receiver.eval(rt, owner)?;

        match self.forwarded.policy {
            NullPolicy::Strict => rt.invoke(&target, member, args),
            NullPolicy::BestEffort => {
                if target.is_null() && !rt.responds_to(&target, member)? {
                    Ok(Value::Null)
                } else {
                    rt.invoke(&target, member, args)
                }
            }
            NullPolicy::Guarded => rt.invoke(&target, member, args).map_err(|err| {
                // Only the miss on the null target itself is rewritten; failures
                // raised inside the member body pass through.
                if target.is_null() && err.is_null_receiver_miss(member) {
                    tracing::trace!(
                        member = %self.forwarded.public_name,
                        target = %self.receiver,
                        "delegation target is null"
                    );
                    DelegationError::nil_target(&self.forwarded.public_name, self.receiver.source())
                        .into()
                } else {
                    err
                }
            }),
        }
    }

    /// Wrap as a runtime method
    pub fn into_method(self, location: Option<SourceLocation>) -> Method {
        let name = self.forwarded.public_name.clone();
        let parameters = self.forwarded.shape.parameters();
        let visibility = self.forwarded.visibility;
        Method::new(name, parameters, move |rt, owner, args| self.call(rt, owner, args))
            .with_visibility(visibility)
            .with_location(location)
    }
}

impl fmt::Display for Forwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} -> {}.{} [{}]",
            self.forwarded.public_name, self.forwarded.shape, self.receiver, self.forwarded.member, self.forwarded.policy
        )?;
        if self.forwarded.visibility == Visibility::Private {
            f.write_str(" private")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reserved::ReservedNames;
    use relay_core::{Class, RuntimeError};

    fn forwarder(member: &str, to: &str, policy: NullPolicy) -> Forwarder {
        Forwarder::new(
            ForwardedMember {
                member: member.to_string(),
                public_name: member.to_string(),
                shape: ParamShape::Forward,
                policy,
                visibility: Visibility::Public,
            },
            Arc::new(ReceiverExpr::parse(to, &ReservedNames::default()).unwrap()),
        )
    }

    #[test]
    fn test_policy_selection() {
        assert_eq!(NullPolicy::select(false, true), NullPolicy::Guarded);
        assert_eq!(NullPolicy::select(true, true), NullPolicy::BestEffort);
        assert_eq!(NullPolicy::select(true, false), NullPolicy::Strict);
        assert_eq!(NullPolicy::select(false, false), NullPolicy::Strict);
    }

    #[test]
    fn test_null_target_per_policy() {
        let rt = Runtime::new();
        let class = rt.define_class(Class::new("Holder"));
        let owner = rt.instantiate(&class, [("inner", Value::Null)]);

        let err = forwarder("size", "@inner", NullPolicy::Guarded)
            .call(&rt, &owner, &[])
            .unwrap_err();
        match err {
            RuntimeError::Delegation(err) => {
                assert_eq!(err.method(), "size");
                assert_eq!(err.target(), "@inner");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = forwarder("size", "@inner", NullPolicy::Strict)
            .call(&rt, &owner, &[])
            .unwrap_err();
        assert!(err.is_null_receiver_miss("size"));

        let value = forwarder("size", "@inner", NullPolicy::BestEffort)
            .call(&rt, &owner, &[])
            .unwrap();
        assert!(value.is_null());

        let value = forwarder("is_null", "@inner", NullPolicy::BestEffort)
            .call(&rt, &owner, &[])
            .unwrap();
        assert_eq!(value, Value::Bool(true));

        // Members the null value has still run under the guard.
        let value = forwarder("to_s", "@inner", NullPolicy::Guarded)
            .call(&rt, &owner, &[])
            .unwrap();
        assert_eq!(value, Value::str(""));
    }

    #[test]
    fn test_display() {
        let fw = forwarder("size", "@inner", NullPolicy::BestEffort);
        assert_eq!(fw.to_string(), "size(...) -> @inner.size [allow-null]");
    }
}
