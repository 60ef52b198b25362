//! Delegation manifests
//!
//! A manifest is a TOML file declaring classes and the delegations applied to
//! them:
//!
//! ```toml
//! reserved = ["target"]
//!
//! [[class]]
//! name = "Post"
//! fields = ["person"]
//!
//! [[class.delegate]]
//! members = ["name"]
//! to = "person"
//! prefix = true
//!
//! [class.missing]
//! to = "person"
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Top-level manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Extra reserved receiver names
    #[serde(default)]
    pub reserved: Vec<String>,
    /// Declared classes, in order
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassDecl>,
}

/// One class and its delegations
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDecl {
    /// Manifest-local name; also the bound name unless `anonymous`
    pub name: String,
    /// Create the class without a name
    #[serde(default)]
    pub anonymous: bool,
    /// Parent class, by manifest name
    #[serde(default)]
    pub parent: Option<String>,
    /// Fields, each with a public reader
    #[serde(default)]
    pub fields: Vec<String>,
    /// Instance methods
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    /// Class-level methods
    #[serde(default)]
    pub static_methods: Vec<MethodDecl>,
    /// Forwarding declarations, applied in order
    #[serde(default, rename = "delegate")]
    pub delegations: Vec<DelegateDecl>,
    /// Catch-all proxy
    #[serde(default)]
    pub missing: Option<MissingDecl>,
}

/// Declared method; the body is a stub
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Parameter list literal
    #[serde(default)]
    pub params: String,
    /// Declare the method private
    #[serde(default)]
    pub private: bool,
}

/// `prefix = true` or `prefix = "name"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PrefixDecl {
    /// Derive the prefix from the target
    Flag(bool),
    /// Explicit prefix
    Name(String),
}

impl Default for PrefixDecl {
    fn default() -> Self {
        PrefixDecl::Flag(false)
    }
}

/// A `[[class.delegate]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegateDecl {
    /// Members to forward
    pub members: Vec<String>,
    /// Receiver expression
    #[serde(default)]
    pub to: Option<String>,
    /// Class target, by manifest name
    #[serde(default)]
    pub to_class: Option<String>,
    /// Public-name prefix
    #[serde(default)]
    pub prefix: PrefixDecl,
    /// Return null on a null target
    #[serde(default)]
    pub allow_null: bool,
    /// Whether the target may be null
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Generate private members
    #[serde(default)]
    pub private: bool,
    /// Capability class, by manifest name
    #[serde(default, rename = "as")]
    pub as_class: Option<String>,
    /// Explicit signature literal
    #[serde(default)]
    pub signature: Option<String>,
}

/// A `[class.missing]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissingDecl {
    /// Receiver expression
    pub to: String,
    /// Return null on a null target
    #[serde(default)]
    pub allow_null: bool,
    /// Replaces the default excluded names when given
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl Manifest {
    /// Parse manifest text
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid manifest")
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}
