//! Reserved receiver names
//!
//! A receiver expression that is exactly a reserved word would parse as the
//! keyword rather than as a member access. Such expressions are qualified with
//! `self.` before use, so `class` is read as `self.class`.

use std::borrow::Cow;

use rustc_hash::FxHashSet;

/// Keywords of the receiver-expression grammar
pub const RECEIVER_KEYWORDS: &[&str] = &[
    "alias", "and", "begin", "break", "case", "class", "def", "defined", "do", "else", "elsif",
    "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not", "null", "or",
    "redo", "rescue", "retry", "return", "super", "then", "true", "undef", "unless", "until",
    "when", "while", "yield",
];

/// Names bound inside generated members
pub const GENERATED_LOCALS: &[&str] = &["_", "arg", "args", "block"];

/// Set of receiver expressions that must be qualified with `self.`
#[derive(Debug, Clone)]
pub struct ReservedNames {
    words: FxHashSet<String>,
}

impl Default for ReservedNames {
    fn default() -> Self {
        let words = RECEIVER_KEYWORDS
            .iter()
            .chain(GENERATED_LOCALS)
            .map(|w| w.to_string())
            .collect();
        Self { words }
    }
}

impl ReservedNames {
    /// A set with no reserved words
    pub fn empty() -> Self {
        Self {
            words: FxHashSet::default(),
        }
    }

    /// Add a reserved word
    pub fn with_word(mut self, word: impl Into<String>) -> Self {
        self.words.insert(word.into());
        self
    }

    /// Whether `expr` is exactly a reserved word
    pub fn is_reserved(&self, expr: &str) -> bool {
        self.words.contains(expr)
    }

    /// Qualify `expr` with `self.` if it is reserved
    pub fn qualify<'a>(&self, expr: &'a str) -> Cow<'a, str> {
        if self.is_reserved(expr) {
            Cow::Owned(format!("self.{}", expr))
        } else {
            Cow::Borrowed(expr)
        }
    }

    /// All reserved words, sorted
    pub fn words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.words.iter().map(String::as_str).collect();
        words.sort_unstable();
        words
    }
}
