//! Builtin classes
//!
//! Every value has a class. `Object` is the kernel consulted after a
//! receiver's own class chain, so its members (`class`, `inspect`, `to_s`,
//! `is_null`, `==`, `responds_to`) are available on every value, null
//! included. `Null` adds the few members that are meaningful on the null
//! value.

use std::sync::Arc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::{Class, ClassRef, Method};
use crate::reflect::ParameterInfo;
use crate::value::Value;

/// Handles to the builtin classes
#[derive(Debug)]
pub struct Builtins {
    /// Kernel, ancestor of every builtin
    pub object: ClassRef,
    /// Class of the null value
    pub null: ClassRef,
    /// Class of booleans
    pub bool: ClassRef,
    /// Class of integers
    pub int: ClassRef,
    /// Class of floats
    pub float: ClassRef,
    /// Class of strings
    pub string: ClassRef,
    /// Class of lists
    pub list: ClassRef,
    /// Class of class values
    pub class: ClassRef,
}

impl Builtins {
    pub(crate) fn new() -> Self {
        let object: ClassRef = Arc::new(kernel());
        Self {
            null: Arc::new(null_class(&object)),
            bool: Arc::new(Class::new("Bool").extends(&object)),
            int: Arc::new(int_class(&object)),
            float: Arc::new(Class::new("Float").extends(&object)),
            string: Arc::new(string_class(&object)),
            list: Arc::new(list_class(&object)),
            class: Arc::new(class_class(&object)),
            object,
        }
    }

    /// All builtin classes
    pub fn all(&self) -> [&ClassRef; 8] {
        [
            &self.object,
            &self.null,
            &self.bool,
            &self.int,
            &self.float,
            &self.string,
            &self.list,
            &self.class,
        ]
    }
}

/// Debug-style rendering used by `inspect`
pub fn inspect(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Str(s) => format!("{:?}", s),
        Value::List(items) => {
            let parts: Vec<String> = items.read().iter().map(inspect).collect();
            format!("[{}]", parts.join(", "))
        }
        other => other.to_string(),
    }
}

fn unary<F>(name: &str, body: F) -> Method
where
    F: Fn(&Value) -> RuntimeResult<Value> + Send + Sync + 'static,
{
    Method::new(name, vec![], move |_, this, _| body(this))
}

fn binary<F>(name: &str, param: &str, body: F) -> Method
where
    F: Fn(&Value, &Value) -> RuntimeResult<Value> + Send + Sync + 'static,
{
    Method::new(
        name,
        vec![ParameterInfo::required(param)],
        move |_, this, args| body(this, &args[0]),
    )
}

fn coerce_int(value: &Value) -> RuntimeResult<i64> {
    value
        .as_int()
        .ok_or_else(|| RuntimeError::Type(format!("{} can't be coerced into Int", value.describe())))
}

fn kernel() -> Class {
    Class::new("Object")
        .with_method(Method::new("class", vec![], |rt, this, _| {
            Ok(Value::Class(rt.class_of(this)))
        }))
        .with_method(unary("inspect", |this| Ok(Value::str(inspect(this)))))
        .with_method(unary("to_s", |this| Ok(Value::str(this.to_string()))))
        .with_method(unary("is_null", |_| Ok(Value::Bool(false))))
        .with_method(binary("==", "other", |this, other| {
            Ok(Value::Bool(this == other))
        }))
        .with_method(Method::new(
            "responds_to",
            vec![ParameterInfo::required("name")],
            |rt, this, args| {
                let name = args[0].as_str().ok_or_else(|| {
                    RuntimeError::Type(format!("{} is not a member name", args[0].describe()))
                })?;
                Ok(Value::Bool(rt.responds_to(this, name)?))
            },
        ))
}

fn null_class(object: &ClassRef) -> Class {
    Class::new("Null")
        .extends(object)
        .with_method(unary("to_s", |_| Ok(Value::str(""))))
        .with_method(unary("to_a", |_| Ok(Value::list(Vec::new()))))
        .with_method(unary("is_null", |_| Ok(Value::Bool(true))))
}

fn int_class(object: &ClassRef) -> Class {
    Class::new("Int")
        .extends(object)
        .with_method(binary("+", "other", |a, b| {
            Ok(Value::Int(coerce_int(a)?.wrapping_add(coerce_int(b)?)))
        }))
        .with_method(binary("-", "other", |a, b| {
            Ok(Value::Int(coerce_int(a)?.wrapping_sub(coerce_int(b)?)))
        }))
        .with_method(binary("*", "other", |a, b| {
            Ok(Value::Int(coerce_int(a)?.wrapping_mul(coerce_int(b)?)))
        }))
        .with_method(unary("abs", |a| Ok(Value::Int(coerce_int(a)?.wrapping_abs()))))
}

fn string_class(object: &ClassRef) -> Class {
    fn text(value: &Value) -> RuntimeResult<&str> {
        value
            .as_str()
            .ok_or_else(|| RuntimeError::Type(format!("no implicit conversion of {} into String", value.describe())))
    }

    Class::new("String")
        .extends(object)
        .with_method(unary("size", |s| Ok(Value::Int(text(s)?.chars().count() as i64))))
        .with_method(unary("upcase", |s| Ok(Value::str(text(s)?.to_uppercase()))))
        .with_method(unary("downcase", |s| Ok(Value::str(text(s)?.to_lowercase()))))
        .with_method(binary("+", "other", |a, b| {
            Ok(Value::from(format!("{}{}", text(a)?, text(b)?)))
        }))
}

fn list_class(object: &ClassRef) -> Class {
    fn items(value: &Value) -> RuntimeResult<&crate::value::ListRef> {
        value
            .as_list()
            .ok_or_else(|| RuntimeError::Type(format!("{} is not a List", value.describe())))
    }

    /// Resolve a possibly negative index against `len`
    fn position(index: i64, len: usize) -> Option<usize> {
        if index < 0 {
            let from_end = index.unsigned_abs() as usize;
            len.checked_sub(from_end)
        } else {
            Some(index as usize)
        }
    }

    Class::new("List")
        .extends(object)
        .with_method(unary("size", |l| Ok(Value::Int(items(l)?.read().len() as i64))))
        .with_method(unary("first", |l| {
            Ok(items(l)?.read().first().cloned().unwrap_or_default())
        }))
        .with_method(binary("push", "item", |l, item| {
            items(l)?.write().push(item.clone());
            Ok(l.clone())
        }))
        .with_method(binary("[]", "index", |l, index| {
            let list = items(l)?.read();
            Ok(position(coerce_int(index)?, list.len())
                .and_then(|i| list.get(i).cloned())
                .unwrap_or_default())
        }))
        .with_method(Method::new(
            "[]=",
            vec![ParameterInfo::required("index"), ParameterInfo::required("value")],
            |_, l, args| {
                let mut list = items(l)?.write();
                let index = coerce_int(&args[0])?;
                let len = list.len();
                let out_of_range = RuntimeError::Index { index, len };
                let i = position(index, len).ok_or_else(|| out_of_range.clone())?;
                if i >= len {
                    if i - len > MAX_LIST_GAP {
                        return Err(out_of_range);
                    }
                    list.try_reserve(i + 1 - len).map_err(|_| out_of_range)?;
                    list.resize(i + 1, Value::Null);
                }
                list[i] = args[1].clone();
                Ok(args[1].clone())
            },
        ))
}

/// Most null slots a single `[]=` past the end may add
const MAX_LIST_GAP: usize = 1 << 16;

fn class_class(object: &ClassRef) -> Class {
    Class::new("Class")
        .extends(object)
        .with_method(Method::new("name", vec![], |_, this, _| {
            Ok(this
                .as_class()
                .and_then(|c| c.name())
                .map(Value::str)
                .unwrap_or_default())
        }))
        .with_method(Method::new("new", vec![], |rt, this, _| match this {
            Value::Class(class) => Ok(rt.new_object(class)),
            other => Err(RuntimeError::Type(format!("{} is not a class", other.describe()))),
        }))
}
