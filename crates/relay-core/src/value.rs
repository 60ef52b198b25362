//! Runtime values
//!
//! Primitives are stored inline. Lists, objects and classes are shared
//! handles: cloning a `Value` clones the handle, not the referent.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::object::{ClassRef, Object, ObjectRef};

/// Shared, mutable list storage
pub type ListRef = Arc<RwLock<Vec<Value>>>;

/// A runtime value
#[derive(Clone, Default)]
pub enum Value {
    /// The null value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Shared list
    List(ListRef),
    /// Class instance
    Object(ObjectRef),
    /// A class used as a value (receiver of class-level methods)
    Class(ClassRef),
}

impl Value {
    /// The null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Create a string value
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Create a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    /// Wrap an object
    pub fn object(object: Object) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Check if value is null
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Get the list handle if this is a list
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get the object handle if this is an object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the class handle if this is a class value
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Short description of the value's kind, used in error messages
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "an instance of Bool".to_string(),
            Value::Int(_) => "an instance of Int".to_string(),
            Value::Float(_) => "an instance of Float".to_string(),
            Value::Str(_) => "an instance of String".to_string(),
            Value::List(_) => "an instance of List".to_string(),
            Value::Object(o) => format!("an instance of {}", o.class().display_name()),
            Value::Class(c) => format!("class {}", c.display_name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Arc::ptr_eq(a, b) || *a.read() == *b.read()
            }
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(l) => f.debug_tuple("List").field(&*l.read()).finish(),
            Value::Object(o) => write!(
                f,
                "Object(#{} {})",
                o.object_id(),
                o.class().display_name()
            ),
            Value::Class(c) => write!(f, "Class({})", c.display_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, item) in l.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(o) => write!(f, "#<{}>", o.class().display_name()),
            Value::Class(c) => write!(f, "{}", c.display_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<ClassRef> for Value {
    fn from(class: ClassRef) -> Self {
        Value::Class(class)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null() {
        assert!(Value::null().is_null());
        assert!(Value::default().is_null());
        assert!(!Value::Int(0).is_null());
        assert_eq!(Value::null().describe(), "null");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(42).as_int(), Some(42));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("Ada").as_str(), Some("Ada"));
        assert_eq!(Value::from(1.5).as_float(), Some(1.5));
        assert_eq!(Value::from("Ada").as_int(), None);
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::from("a"), Value::from("a".to_string()));
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::from("2"));
        assert_eq!(
            Value::list(vec![Value::Int(1)]),
            Value::list(vec![Value::Int(1)])
        );
    }

    #[test]
    fn test_list_is_shared() {
        let list = Value::list(vec![]);
        let alias = list.clone();
        alias.as_list().unwrap().write().push(Value::Int(7));
        assert_eq!(list.as_list().unwrap().read().len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::null().to_string(), "");
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(
            Value::list(vec![Value::from(1), Value::from("x")]).to_string(),
            "[1, x]"
        );
    }
}
