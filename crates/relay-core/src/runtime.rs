//! Member dispatch
//!
//! A call resolves in two stages:
//!
//! 1. Normal resolution: the receiver's class chain (instance methods), or for
//!    class values the static method chain, then the `Object` kernel.
//! 2. Catch-all: the `MissingHandler`s installed on the receiver's class and
//!    its ancestors, nearest first. Each handler gets a [`Next`] that continues
//!    the chain, so a handler can defer exactly like calling `super`. The end
//!    of the chain is a `NoMethod` error.
//!
//! Stage 2 only runs when stage 1 finds nothing, so members defined on a class
//! always take precedence over its catch-all.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::builtins::Builtins;
use crate::error::{RuntimeError, RuntimeResult};
use crate::namespace::Namespace;
use crate::object::{Class, ClassRef, Method, Object};
use crate::value::Value;

/// Catch-all behavior consulted after normal member resolution fails
pub trait MissingHandler: Send + Sync {
    /// Whether this handler can take calls to `name` on `receiver`.
    ///
    /// Call `next.can_handle(..)` to defer to the handlers further up the chain.
    fn can_handle(&self, next: Next<'_>, receiver: &Value, name: &str) -> RuntimeResult<bool>;

    /// Handle a call to `name` on `receiver`.
    ///
    /// Call `next.invoke(..)` to defer to the handlers further up the chain.
    fn invoke(
        &self,
        next: Next<'_>,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> RuntimeResult<Value>;
}

/// Continuation of the catch-all chain
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rt: &'a Runtime,
    rest: &'a [Arc<dyn MissingHandler>],
}

impl<'a> Next<'a> {
    /// Runtime the call is executing in
    pub fn runtime(&self) -> &'a Runtime {
        self.rt
    }

    /// Ask the remaining handlers; `false` when none is left
    pub fn can_handle(self, receiver: &Value, name: &str) -> RuntimeResult<bool> {
        match self.rest.split_first() {
            Some((handler, rest)) => handler.can_handle(
                Next { rt: self.rt, rest },
                receiver,
                name,
            ),
            None => Ok(false),
        }
    }

    /// Pass the call to the remaining handlers; `NoMethod` when none is left
    pub fn invoke(self, receiver: &Value, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        match self.rest.split_first() {
            Some((handler, rest)) => handler.invoke(
                Next { rt: self.rt, rest },
                receiver,
                name,
                args,
            ),
            None => Err(no_method(receiver, name)),
        }
    }
}

/// Build the "no such member" error for `name` on `receiver`
pub fn no_method(receiver: &Value, name: &str) -> RuntimeError {
    RuntimeError::NoMethod {
        name: name.to_string(),
        receiver: receiver.describe(),
        receiver_null: receiver.is_null(),
    }
}

/// Object runtime: namespace, builtin classes and dispatch
pub struct Runtime {
    namespace: RwLock<Namespace>,
    builtins: Builtins,
}

impl Runtime {
    /// Create a runtime with the builtin classes bound
    pub fn new() -> Self {
        let builtins = Builtins::new();
        let mut namespace = Namespace::new();
        for class in builtins.all() {
            namespace.bind(class);
        }
        Self {
            namespace: RwLock::new(namespace),
            builtins,
        }
    }

    /// Builtin classes
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    // ========================================================================
    // Namespace
    // ========================================================================

    /// Wrap `class`, bind it under its name (if it has one) and return the handle
    pub fn define_class(&self, class: Class) -> ClassRef {
        let class = Arc::new(class);
        self.bind_class(&class);
        class
    }

    /// Bind an existing class under its name, returning the previous binding
    pub fn bind_class(&self, class: &ClassRef) -> Option<ClassRef> {
        let previous = self.namespace.write().bind(class);
        if let Some(previous) = &previous {
            tracing::debug!(
                name = %class.display_name(),
                previous = %previous.id(),
                current = %class.id(),
                "class name rebound"
            );
        }
        previous
    }

    /// Resolve a class by name
    pub fn lookup_class(&self, name: &str) -> Option<ClassRef> {
        self.namespace.read().resolve(name)
    }

    /// Whether `class` is reachable through its own declared name
    pub fn is_bound(&self, class: &Class) -> bool {
        self.namespace.read().is_bound(class)
    }

    /// All bound class names, sorted
    pub fn class_names(&self) -> Vec<String> {
        self.namespace.read().names()
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Create an instance of `class` with the given fields
    pub fn instantiate<I, K>(&self, class: &ClassRef, fields: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let object = Object::new(class);
        for (name, value) in fields {
            object.set_field(name, value);
        }
        Value::object(object)
    }

    /// Create an instance of `class` with no fields set
    pub fn new_object(&self, class: &ClassRef) -> Value {
        Value::object(Object::new(class))
    }

    /// Class of a value
    pub fn class_of(&self, value: &Value) -> ClassRef {
        let b = &self.builtins;
        let class = match value {
            Value::Null => &b.null,
            Value::Bool(_) => &b.bool,
            Value::Int(_) => &b.int,
            Value::Float(_) => &b.float,
            Value::Str(_) => &b.string,
            Value::List(_) => &b.list,
            Value::Object(object) => object.class(),
            Value::Class(_) => &b.class,
        };
        Arc::clone(class)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Resolve `name` on `receiver` without consulting catch-all handlers
    pub fn find_member(&self, receiver: &Value, name: &str) -> Option<Arc<Method>> {
        let statics = match receiver {
            Value::Class(class) => class.find_static_method(name),
            _ => None,
        };
        statics
            .or_else(|| self.class_of(receiver).find_method(name))
            .or_else(|| self.builtins.object.find_method(name))
    }

    /// Call a public member
    pub fn invoke(&self, receiver: &Value, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        self.dispatch(receiver, name, args, false)
    }

    /// Call a member with `receiver` as the implicit self; private members are allowed
    pub fn send(&self, receiver: &Value, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        self.dispatch(receiver, name, args, true)
    }

    /// Whether a public call to `name` on `receiver` would be handled
    pub fn responds_to(&self, receiver: &Value, name: &str) -> RuntimeResult<bool> {
        if self
            .find_member(receiver, name)
            .is_some_and(|method| method.is_public())
        {
            return Ok(true);
        }
        let handlers = self.missing_chain(receiver);
        Next {
            rt: self,
            rest: &handlers,
        }
        .can_handle(receiver, name)
    }

    fn dispatch(
        &self,
        receiver: &Value,
        name: &str,
        args: &[Value],
        allow_private: bool,
    ) -> RuntimeResult<Value> {
        if let Some(method) = self.find_member(receiver, name) {
            if !allow_private && !method.is_public() {
                return Err(RuntimeError::PrivateMethod {
                    name: name.to_string(),
                    receiver: receiver.describe(),
                });
            }
            return method.call(self, receiver, args);
        }

        let handlers = self.missing_chain(receiver);
        if !handlers.is_empty() {
            tracing::trace!(
                name,
                receiver = %receiver.describe(),
                handlers = handlers.len(),
                "no member found, consulting catch-all"
            );
        }
        Next {
            rt: self,
            rest: &handlers,
        }
        .invoke(receiver, name, args)
    }

    fn missing_chain(&self, receiver: &Value) -> Vec<Arc<dyn MissingHandler>> {
        match receiver {
            // Catch-all handlers apply to instances, not to class values.
            Value::Class(_) => Vec::new(),
            other => self.class_of(other).missing_handlers(),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("classes", &self.class_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Visibility;
    use crate::reflect::ParameterInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn person_class(rt: &Runtime) -> ClassRef {
        rt.define_class(
            Class::new("Person")
                .with_method(Method::new("name", vec![], |_, this, _| {
                    Ok(this
                        .as_object()
                        .and_then(|o| o.get_field("name"))
                        .unwrap_or_default())
                }))
                .with_method(
                    Method::new("secret", vec![], |_, _, _| Ok(Value::from("s3cret")))
                        .with_visibility(Visibility::Private),
                )
                .with_static_method(Method::new("count", vec![], |_, _, _| Ok(Value::Int(3)))),
        )
    }

    /// Answers `can_handle` for one name, records how often it was asked to invoke
    struct Catcher {
        name: &'static str,
        calls: AtomicUsize,
    }

    impl MissingHandler for Catcher {
        fn can_handle(&self, next: Next<'_>, receiver: &Value, name: &str) -> RuntimeResult<bool> {
            Ok(name == self.name || next.can_handle(receiver, name)?)
        }

        fn invoke(
            &self,
            next: Next<'_>,
            receiver: &Value,
            name: &str,
            args: &[Value],
        ) -> RuntimeResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if name == self.name {
                Ok(Value::from(self.name))
            } else {
                next.invoke(receiver, name, args)
            }
        }
    }

    #[test]
    fn test_invoke_instance_method() {
        let rt = Runtime::new();
        let person = person_class(&rt);
        let ada = rt.instantiate(&person, [("name", Value::from("Ada"))]);
        assert_eq!(rt.invoke(&ada, "name", &[]).unwrap(), Value::from("Ada"));
    }

    #[test]
    fn test_invoke_static_method() {
        let rt = Runtime::new();
        let person = person_class(&rt);
        let class_value = Value::Class(person);
        assert_eq!(rt.invoke(&class_value, "count", &[]).unwrap(), Value::Int(3));
        assert!(rt.invoke(&class_value, "name", &[]).unwrap().as_str() == Some("Person"));
    }

    #[test]
    fn test_private_requires_send() {
        let rt = Runtime::new();
        let person = person_class(&rt);
        let ada = rt.new_object(&person);

        assert!(matches!(
            rt.invoke(&ada, "secret", &[]),
            Err(RuntimeError::PrivateMethod { .. })
        ));
        assert_eq!(rt.send(&ada, "secret", &[]).unwrap(), Value::from("s3cret"));
        assert!(!rt.responds_to(&ada, "secret").unwrap());
    }

    #[test]
    fn test_no_method_on_null() {
        let rt = Runtime::new();
        let err = rt.invoke(&Value::Null, "name", &[]).unwrap_err();
        assert!(err.is_null_receiver_miss("name"));
        assert_eq!(err.to_string(), "undefined method `name` for null");
    }

    #[test]
    fn test_kernel_methods_on_every_value() {
        let rt = Runtime::new();
        let person = person_class(&rt);
        let ada = rt.new_object(&person);

        let class = rt.invoke(&ada, "class", &[]).unwrap();
        assert_eq!(class.as_class().unwrap().id(), person.id());
        assert!(rt.responds_to(&Value::Null, "to_s").unwrap());
        assert!(!rt.responds_to(&Value::Null, "name").unwrap());
    }

    #[test]
    fn test_catch_all_after_normal_resolution() {
        let rt = Runtime::new();
        let person = person_class(&rt);
        let catcher = Arc::new(Catcher {
            name: "name",
            calls: AtomicUsize::new(0),
        });
        person.set_missing_handler(catcher.clone());
        let ada = rt.instantiate(&person, [("name", Value::from("Ada"))]);

        // Defined member wins; the catch-all is never consulted.
        assert_eq!(rt.invoke(&ada, "name", &[]).unwrap(), Value::from("Ada"));
        assert_eq!(catcher.calls.load(Ordering::SeqCst), 0);

        // Unknown member reaches the catch-all, which defers to the end of the chain.
        let err = rt.invoke(&ada, "age", &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::NoMethod { ref name, .. } if name == "age"));
        assert_eq!(catcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_catch_all_chain_walks_ancestors() {
        let rt = Runtime::new();
        let base = rt.define_class(Class::new("Base"));
        let derived = rt.define_class(Class::new("Derived").extends(&base));
        base.set_missing_handler(Arc::new(Catcher {
            name: "outer",
            calls: AtomicUsize::new(0),
        }));
        derived.set_missing_handler(Arc::new(Catcher {
            name: "inner",
            calls: AtomicUsize::new(0),
        }));

        let obj = rt.new_object(&derived);
        assert_eq!(rt.invoke(&obj, "inner", &[]).unwrap(), Value::from("inner"));
        assert_eq!(rt.invoke(&obj, "outer", &[]).unwrap(), Value::from("outer"));
        assert!(rt.responds_to(&obj, "outer").unwrap());
        assert!(!rt.responds_to(&obj, "nothing").unwrap());
    }

    #[test]
    fn test_rebinding_detaches() {
        let rt = Runtime::new();
        let first = person_class(&rt);
        assert!(rt.is_bound(&first));
        let second = rt.define_class(Class::new("Person"));
        assert!(!rt.is_bound(&first));
        assert_eq!(rt.lookup_class("Person").unwrap().id(), second.id());
    }

    #[test]
    fn test_arity_error_from_dispatch() {
        let rt = Runtime::new();
        let class = rt.define_class(Class::new("Calc").with_method(Method::new(
            "double",
            vec![ParameterInfo::required("x")],
            |_, _, args| Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2)),
        )));
        let calc = rt.new_object(&class);
        assert_eq!(
            rt.invoke(&calc, "double", &[Value::Int(4)]).unwrap(),
            Value::Int(8)
        );
        assert!(matches!(
            rt.invoke(&calc, "double", &[]),
            Err(RuntimeError::Arity { .. })
        ));
    }
}
