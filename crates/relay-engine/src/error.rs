//! Configuration errors
//!
//! Raised while a delegation is being generated, never while a generated
//! member runs. Call-time failures are [`relay_core::RuntimeError`]s.

use relay_core::{ParamSyntaxError, RuntimeError};

/// Invalid delegation request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// No member names were given
    #[error("delegation needs at least one member name")]
    NoMembers,

    /// A member name is empty
    #[error("invalid member name `{0}`")]
    InvalidMember(String),

    /// No target was given
    #[error(
        "delegation needs a target: supply `to` with the name of a field, a method, or a class"
    )]
    MissingTarget,

    /// A derived prefix was requested for a target that is not a plain member
    #[error("can only derive a prefix when delegating to a member, not to `{to}`")]
    InvalidPrefix {
        /// Target as written
        to: String,
    },

    /// Target class has no name
    #[error("can't delegate to anonymous class {0}")]
    AnonymousTarget(String),

    /// Target class name is not bound to the class itself
    #[error("can't delegate to detached class {0}")]
    DetachedTarget(String),

    /// Receiver expression does not parse
    #[error("invalid receiver `{expr}`: {reason}")]
    InvalidReceiver {
        /// Expression as written
        expr: String,
        /// What is wrong with it
        reason: String,
    },

    /// Explicit signature does not parse
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] ParamSyntaxError),

    /// Member is not on the capability surface named with `as`
    #[error("`{member}` is not a public method of {class}")]
    UnknownMember {
        /// Member that was looked up
        member: String,
        /// Capability class
        class: String,
        /// Lookup failure
        #[source]
        source: RuntimeError,
    },
}

/// Result alias for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
