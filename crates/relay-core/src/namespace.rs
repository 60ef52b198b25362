//! Global namespace of named classes

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::object::{Class, ClassRef};

/// Name to class bindings
///
/// Binding a name that is already bound replaces the binding. Handles to the
/// previous class stay valid but no longer resolve through their own name.
#[derive(Debug, Default)]
pub struct Namespace {
    /// Class name to class mapping
    by_name: FxHashMap<String, ClassRef>,
}

impl Namespace {
    /// Create a new empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a class under its own name. Anonymous classes are not bound.
    ///
    /// Returns the class previously bound to that name, if any.
    pub fn bind(&mut self, class: &ClassRef) -> Option<ClassRef> {
        let name = class.name()?;
        self.by_name.insert(name.to_string(), Arc::clone(class))
    }

    /// Resolve a name
    pub fn resolve(&self, name: &str) -> Option<ClassRef> {
        self.by_name.get(name).cloned()
    }

    /// Check whether `class` is reachable through its own declared name
    pub fn is_bound(&self, class: &Class) -> bool {
        class
            .name()
            .and_then(|name| self.by_name.get(name))
            .is_some_and(|bound| bound.id() == class.id())
    }

    /// Remove a binding
    pub fn unbind(&mut self, name: &str) -> Option<ClassRef> {
        self.by_name.remove(name)
    }

    /// All bound names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Check if the namespace is empty
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
