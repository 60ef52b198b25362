//! Catch-all proxy
//!
//! Installed as a class's [`MissingHandler`], so it only sees calls that
//! normal member resolution could not satisfy. Calls the target responds to
//! are forwarded; everything else continues down the handler chain.

use std::fmt;

use relay_core::{DelegationError, MissingHandler, Next, RuntimeResult, Value};

use crate::forwarder::NullPolicy;
use crate::receiver::ReceiverExpr;

/// Forwards unresolved calls to a receiver expression
pub struct MissingProxy {
    receiver: ReceiverExpr,
    policy: NullPolicy,
    excluded: Vec<String>,
}

impl MissingProxy {
    /// Proxy to `receiver`; `allow_null` selects best-effort over guarded
    pub fn new(receiver: ReceiverExpr, allow_null: bool, excluded: Vec<String>) -> Self {
        let policy = NullPolicy::select(allow_null, true);
        Self {
            receiver,
            policy,
            excluded,
        }
    }

    /// Expression calls are forwarded to
    pub fn receiver(&self) -> &ReceiverExpr {
        &self.receiver
    }

    /// Null handling
    pub fn policy(&self) -> NullPolicy {
        self.policy
    }

    /// Whether `name` is never claimed
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|excluded| excluded == name)
    }
}

impl MissingHandler for MissingProxy {
    fn can_handle(&self, next: Next<'_>, receiver: &Value, name: &str) -> RuntimeResult<bool> {
        if self.is_excluded(name) {
            return Ok(false);
        }
        let rt = next.runtime();
        let target = self.receiver.eval(rt, receiver)?;
        Ok(rt.responds_to(&target, name)? || next.can_handle(receiver, name)?)
    }

    fn invoke(
        &self,
        next: Next<'_>,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> RuntimeResult<Value> {
        if self.is_excluded(name) {
            return next.invoke(receiver, name, args);
        }
        let rt = next.runtime();
        let target = self.receiver.eval(rt, receiver)?;

        if rt.responds_to(&target, name)? {
            return rt.invoke(&target, name, args);
        }
        if target.is_null() {
            tracing::trace!(name, target = %self.receiver, "catch-all target is null");
            return match self.policy {
                NullPolicy::BestEffort => Ok(Value::Null),
                _ => Err(DelegationError::nil_target(name, self.receiver.source()).into()),
            };
        }
        next.invoke(receiver, name, args)
    }
}

impl fmt::Debug for MissingProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MissingProxy")
            .field("receiver", &self.receiver.source())
            .field("policy", &self.policy)
            .field("excluded", &self.excluded)
            .finish()
    }
}

impl fmt::Display for MissingProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "* -> {} [{}]", self.receiver, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reserved::ReservedNames;
    use relay_core::{Class, Runtime, RuntimeError};
    use std::sync::Arc;

    fn proxy(to: &str, allow_null: bool) -> MissingProxy {
        MissingProxy::new(
            ReceiverExpr::parse(to, &ReservedNames::default()).unwrap(),
            allow_null,
            vec!["_dump".to_string()],
        )
    }

    #[test]
    fn test_forwards_what_target_handles() {
        let rt = Runtime::new();
        let class = rt.define_class(Class::new("Wrapper"));
        class.set_missing_handler(Arc::new(proxy("@inner", false)));
        let wrapper = rt.instantiate(&class, [("inner", Value::from("abc"))]);

        assert_eq!(rt.invoke(&wrapper, "upcase", &[]).unwrap(), Value::from("ABC"));
        assert!(rt.responds_to(&wrapper, "size").unwrap());
        assert!(!rt.responds_to(&wrapper, "_dump").unwrap());
        assert!(!rt.responds_to(&wrapper, "fly").unwrap());

        let err = rt.invoke(&wrapper, "fly", &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::NoMethod { ref name, receiver_null: false, .. } if name == "fly"));
    }

    #[test]
    fn test_null_target() {
        let rt = Runtime::new();
        let guarded = rt.define_class(Class::new("Guarded"));
        guarded.set_missing_handler(Arc::new(proxy("@inner", false)));
        let obj = rt.new_object(&guarded);

        let err = rt.invoke(&obj, "size", &[]).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::Delegation(DelegationError::nil_target("size", "@inner"))
        );
        // The null value's own members are still reachable.
        assert_eq!(rt.invoke(&obj, "to_a", &[]).unwrap(), Value::list(vec![]));

        let lenient = rt.define_class(Class::new("Lenient"));
        lenient.set_missing_handler(Arc::new(proxy("@inner", true)));
        let obj = rt.new_object(&lenient);
        assert!(rt.invoke(&obj, "size", &[]).unwrap().is_null());

        // Excluded names are never claimed, even when nulls are allowed.
        let err = rt.invoke(&obj, "_dump", &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::NoMethod { ref name, .. } if name == "_dump"));
    }

    #[test]
    fn test_display() {
        assert_eq!(proxy("@inner", true).to_string(), "* -> @inner [allow-null]");
    }
}
