//! Object model and class system
//!
//! Classes own two method tables: instance methods (dispatched on objects
//! of the class) and static methods (dispatched on the class value itself).
//! Both tables are mutable after creation so generated behavior can be
//! attached to a class that is already in use.

use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{RuntimeError, RuntimeResult};
use crate::reflect::{Arity, MethodInfo, ParameterInfo};
use crate::runtime::{MissingHandler, Runtime};
use crate::value::Value;

/// Shared class handle
pub type ClassRef = Arc<Class>;

/// Shared object handle
pub type ObjectRef = Arc<Object>;

/// Native method body: `(runtime, self, args) -> result`
pub type NativeFn = Arc<dyn Fn(&Runtime, &Value, &[Value]) -> RuntimeResult<Value> + Send + Sync>;

/// Global counter for generating unique class IDs
static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a class, independent of the name it is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Callable from anywhere
    #[default]
    Public,
    /// Callable only with `self` as the implicit receiver
    Private,
}

/// Where a member was declared. Stored for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Source file
    pub file: String,
    /// 1-based line
    pub line: u32,
}

impl SourceLocation {
    /// Create a location
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the caller of the function this is invoked from
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&Location<'_>> for SourceLocation {
    fn from(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

// ============================================================================
// Method
// ============================================================================

/// A named, callable member
#[derive(Clone)]
pub struct Method {
    name: String,
    parameters: Vec<ParameterInfo>,
    arity: Arity,
    visibility: Visibility,
    body: NativeFn,
    location: Option<SourceLocation>,
}

impl Method {
    /// Create a public method; its arity is derived from `parameters`
    pub fn new<F>(name: impl Into<String>, parameters: Vec<ParameterInfo>, body: F) -> Self
    where
        F: Fn(&Runtime, &Value, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        let arity = Arity::of(&parameters);
        Self {
            name: name.into(),
            parameters,
            arity,
            visibility: Visibility::Public,
            body: Arc::new(body),
            location: None,
        }
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach a declaration location
    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    /// Accepted argument count
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the method is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Declaration location, if one was recorded
    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Check arity, then run the body
    pub fn call(&self, rt: &Runtime, receiver: &Value, args: &[Value]) -> RuntimeResult<Value> {
        self.arity.check(&self.name, args.len())?;
        (self.body)(rt, receiver, args)
    }

    /// Reflection view of this method
    pub fn info(&self, declaring_class: &str, is_static: bool) -> MethodInfo {
        MethodInfo {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            visibility: self.visibility,
            declaring_class: declaring_class.to_string(),
            is_static,
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("arity", &self.arity)
            .field("visibility", &self.visibility)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Class
// ============================================================================

type MethodTable = RwLock<FxHashMap<String, Arc<Method>>>;

/// Runtime class
pub struct Class {
    id: ClassId,
    name: Option<String>,
    parent: Option<ClassRef>,
    methods: MethodTable,
    static_methods: MethodTable,
    missing: RwLock<Option<Arc<dyn MissingHandler>>>,
}

impl Class {
    /// Create a named class
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()))
    }

    /// Create a class without a name
    pub fn anonymous() -> Self {
        Self::build(None)
    }

    fn build(name: Option<String>) -> Self {
        Self {
            id: ClassId::next(),
            name,
            parent: None,
            methods: RwLock::new(FxHashMap::default()),
            static_methods: RwLock::new(FxHashMap::default()),
            missing: RwLock::new(None),
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: &ClassRef) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Add an instance method (builder form)
    pub fn with_method(self, method: Method) -> Self {
        self.define_method(method);
        self
    }

    /// Add a static method (builder form)
    pub fn with_static_method(self, method: Method) -> Self {
        self.define_static_method(method);
        self
    }

    /// Class identity
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Declared name, `None` for anonymous classes
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for messages; anonymous classes render as `#<Class:0x..>`
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#<Class:{}>", self.id),
        }
    }

    /// Parent class
    pub fn parent(&self) -> Option<&ClassRef> {
        self.parent.as_ref()
    }

    /// This class followed by its ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(Some(self), |class| class.parent.as_deref())
    }

    /// Check if this class is `other` or inherits from it
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.ancestors().any(|class| class.id == other.id)
    }

    // ========================================================================
    // Method tables
    // ========================================================================

    /// Define (or replace) an instance method
    pub fn define_method(&self, method: Method) -> Arc<Method> {
        let method = Arc::new(method);
        self.methods
            .write()
            .insert(method.name().to_string(), Arc::clone(&method));
        method
    }

    /// Define (or replace) a static method
    pub fn define_static_method(&self, method: Method) -> Arc<Method> {
        let method = Arc::new(method);
        self.static_methods
            .write()
            .insert(method.name().to_string(), Arc::clone(&method));
        method
    }

    /// Check if this class itself (not an ancestor) defines an instance method
    pub fn defines_method(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    /// Look up an instance method on this class or its ancestors
    pub fn find_method(&self, name: &str) -> Option<Arc<Method>> {
        self.ancestors()
            .find_map(|class| class.methods.read().get(name).cloned())
    }

    /// Look up a static method on this class or its ancestors
    pub fn find_static_method(&self, name: &str) -> Option<Arc<Method>> {
        self.ancestors()
            .find_map(|class| class.static_methods.read().get(name).cloned())
    }

    /// Public instance method signature, or `UndefinedMember`
    pub fn public_instance_method(&self, name: &str) -> RuntimeResult<MethodInfo> {
        self.public_member(name, false)
    }

    /// Public static method signature, or `UndefinedMember`
    pub fn public_static_method(&self, name: &str) -> RuntimeResult<MethodInfo> {
        self.public_member(name, true)
    }

    fn public_member(&self, name: &str, is_static: bool) -> RuntimeResult<MethodInfo> {
        let found = self.ancestors().find_map(|class| {
            let table = if is_static {
                class.static_methods.read()
            } else {
                class.methods.read()
            };
            table
                .get(name)
                .map(|method| (class.display_name(), Arc::clone(method)))
        });
        match found {
            Some((declaring, method)) if method.is_public() => {
                Ok(method.info(&declaring, is_static))
            }
            _ => Err(RuntimeError::UndefinedMember {
                name: name.to_string(),
                class: self.display_name(),
            }),
        }
    }

    /// Names of all instance methods, including inherited ones, sorted
    pub fn instance_method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .ancestors()
            .flat_map(|class| class.methods.read().keys().cloned().collect::<Vec<_>>())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    // ========================================================================
    // Catch-all handler
    // ========================================================================

    /// Install the catch-all handler consulted when no method matches
    pub fn set_missing_handler(&self, handler: Arc<dyn MissingHandler>) {
        *self.missing.write() = Some(handler);
    }

    /// Catch-all handler installed on this class itself
    pub fn missing_handler(&self) -> Option<Arc<dyn MissingHandler>> {
        self.missing.read().clone()
    }

    /// Catch-all handlers of this class and its ancestors, nearest first
    pub fn missing_handlers(&self) -> Vec<Arc<dyn MissingHandler>> {
        self.ancestors()
            .filter_map(|class| class.missing_handler())
            .collect()
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.display_name()))
            .field("methods", &self.instance_method_names())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Object
// ============================================================================

/// Class instance with named fields
pub struct Object {
    object_id: u64,
    class: ClassRef,
    fields: RwLock<FxHashMap<String, Value>>,
}

impl Object {
    /// Create an instance with no fields set
    pub fn new(class: &ClassRef) -> Self {
        Self {
            object_id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class: Arc::clone(class),
            fields: RwLock::new(FxHashMap::default()),
        }
    }

    /// Set a field (builder form)
    pub fn with_field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.write().insert(name.into(), value.into());
        self
    }

    /// Unique object id
    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    /// Class of this object
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Read a field
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    /// Write a field
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.write().insert(name.into(), value.into());
    }

    /// Check if a field has been set
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.read().contains_key(name)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("object_id", &self.object_id)
            .field("class", &self.class.display_name())
            .field("fields", &*self.fields.read())
            .finish()
    }
}
