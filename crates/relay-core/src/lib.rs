//! Relay Core
//!
//! A small dynamic object runtime used as the host for generated delegation:
//! - Values, classes with instance and static method tables, objects with
//!   named fields (`value`, `object`)
//! - A namespace binding class names to classes (`namespace`)
//! - Member introspection (`reflect`)
//! - Dispatch with a catch-all handler chain (`runtime`)
//! - Builtin classes, including the class of the null value (`builtins`)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builtins;
pub mod error;
pub mod namespace;
pub mod object;
pub mod reflect;
pub mod runtime;
pub mod value;

pub use error::{DelegationError, RuntimeError, RuntimeResult};
pub use namespace::Namespace;
pub use object::{Class, ClassId, ClassRef, Method, NativeFn, Object, ObjectRef, SourceLocation, Visibility};
pub use reflect::{parse_parameters, Arity, MethodInfo, ParamKind, ParamSyntaxError, ParameterInfo};
pub use runtime::{no_method, MissingHandler, Next, Runtime};
pub use value::{ListRef, Value};
