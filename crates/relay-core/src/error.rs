//! Error types raised while invoking members at runtime

/// Result type for runtime calls
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// A forwarded member was called while its delegation target was null.
///
/// Carries the public (possibly prefixed) member name and the receiver
/// expression the forwarder evaluated, so the message reads as
/// "what was delegated to what".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{method} delegated to {target}, but {target} is null")]
pub struct DelegationError {
    method: String,
    target: String,
}

impl DelegationError {
    /// Build the error for a null delegation target
    pub fn nil_target(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
        }
    }

    /// Public name of the member that was called
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Receiver expression that evaluated to null
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Runtime errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// No member with this name on the receiver
    #[error("undefined method `{name}` for {receiver}")]
    NoMethod {
        /// Member name that was looked up
        name: String,
        /// Description of the receiver (`null`, `instance of Person`, ...)
        receiver: String,
        /// Whether the receiver was the null value
        receiver_null: bool,
    },

    /// Member exists but is private and was called from outside
    #[error("private method `{name}` called for {receiver}")]
    PrivateMethod {
        /// Member name
        name: String,
        /// Description of the receiver
        receiver: String,
    },

    /// Wrong number of arguments
    #[error("wrong number of arguments for `{name}` (given {given}, expected {expected})")]
    Arity {
        /// Member name
        name: String,
        /// Number of arguments supplied
        given: usize,
        /// Accepted argument count, e.g. `2` or `1..=3` or `1+`
        expected: String,
    },

    /// Introspection lookup found no public member with this name
    #[error("undefined method `{name}` for class `{class}`")]
    UndefinedMember {
        /// Member name
        name: String,
        /// Class that was inspected
        class: String,
    },

    /// Constant (class name) not bound in the namespace
    #[error("uninitialized constant {0}")]
    UninitializedConstant(String),

    /// Value had the wrong type for the operation
    #[error("type error: {0}")]
    Type(String),

    /// Index out of range
    #[error("index {index} out of range for length {len}")]
    Index {
        /// Requested index
        index: i64,
        /// Length of the collection
        len: usize,
    },

    /// Delegated call on a null target
    #[error(transparent)]
    Delegation(#[from] DelegationError),

    /// Error raised by a method body
    #[error("{0}")]
    Raised(String),
}

impl RuntimeError {
    /// Shorthand for an error raised by a native method body
    pub fn raised(message: impl Into<String>) -> Self {
        RuntimeError::Raised(message.into())
    }

    /// Whether this is a "no such member" failure for exactly `name` on a null receiver
    pub fn is_null_receiver_miss(&self, member: &str) -> bool {
        matches!(
            self,
            RuntimeError::NoMethod { name, receiver_null: true, .. } if name == member
        )
    }
}

impl From<String> for RuntimeError {
    fn from(s: String) -> Self {
        RuntimeError::Raised(s)
    }
}

impl From<&str> for RuntimeError {
    fn from(s: &str) -> Self {
        RuntimeError::Raised(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegation_error_message() {
        let err = DelegationError::nil_target("name", "person");
        assert_eq!(err.to_string(), "name delegated to person, but person is null");
        assert_eq!(err.method(), "name");
        assert_eq!(err.target(), "person");
    }

    #[test]
    fn test_null_receiver_miss() {
        let miss = RuntimeError::NoMethod {
            name: "name".to_string(),
            receiver: "null".to_string(),
            receiver_null: true,
        };
        assert!(miss.is_null_receiver_miss("name"));
        assert!(!miss.is_null_receiver_miss("age"));

        let other = RuntimeError::NoMethod {
            name: "name".to_string(),
            receiver: "instance of Person".to_string(),
            receiver_null: false,
        };
        assert!(!other.is_null_receiver_miss("name"));
    }
}
