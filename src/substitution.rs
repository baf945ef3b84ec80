//! Map class names to tokens.

use std::collections::{HashMap, HashSet};

use crate::token::TokenGenerator;

/// Position of a class name inside a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorContext {
    /// The class must match (e.g. `.foo`, `:is(.foo)`).
    Positive,
    /// The class appears inside a negation (e.g. `:not(.foo)`).
    Negated,
}

/// Substitution table and token allocator of a run.
///
/// Once a class name is assigned a token, the token never changes. Two class
/// names never share a token since every token comes from the same
/// [`TokenGenerator`].
#[derive(Debug, Default)]
pub struct Substitutions {
    /// Token generator.
    generator: TokenGenerator,

    /// Tokens by class name.
    table: HashMap<String, String>,

    /// Class names in assignment order.
    order: Vec<String>,

    /// Tokens in use.
    tokens: HashSet<String>,

    /// Number of substitutions performed.
    count: u64,
}

impl Substitutions {
    /// Create an empty table whose tokens avoid the class names of `css`.
    pub fn new(css: impl AsRef<str>) -> Self {
        Self {
            generator: TokenGenerator::new(css),
            ..Default::default()
        }
    }

    /// Return the token of a class name, if assigned.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.table.get(name).map(String::as_str)
    }

    /// Check whether a class name has a token.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Return the token of a class name, assigning a new one if needed.
    pub fn assign(&mut self, name: &str) -> &str {
        if !self.table.contains_key(name) {
            let token = loop {
                let token = self.generator.succ();
                if !self.tokens.contains(&token) {
                    break token;
                }
            };
            log::trace!("{name} -> {token}");
            self.register(name, token);
        }
        &self.table[name]
    }

    /// Map a class name to a given token.
    ///
    /// Returns `false`, leaving the table unchanged, if the class name already
    /// has a token or if the token is used by another class name.
    pub fn insert(&mut self, name: &str, token: &str) -> bool {
        if self.table.contains_key(name) || self.tokens.contains(token) {
            return false;
        }
        log::trace!("{name} -> {token}");
        self.register(name, token.to_owned());
        true
    }

    /// Record a new mapping.
    fn register(&mut self, name: &str, token: String) {
        self.order.push(name.to_owned());
        self.tokens.insert(token.clone());
        self.table.insert(name.to_owned(), token);
    }

    /// Resolve the token of a class name found in a selector.
    ///
    /// Negated classes are legitimately absent from scripts, so a token is
    /// minted for them. Returns `None` for unknown classes in any other
    /// position.
    pub fn resolve_or_mint(&mut self, name: &str, context: SelectorContext) -> Option<String> {
        if let Some(token) = self.table.get(name) {
            return Some(token.clone());
        }

        match context {
            SelectorContext::Negated => {
                log::debug!("Minting a token for negated class `{name}`");
                Some(self.assign(name).to_owned())
            },
            SelectorContext::Positive => None,
        }
    }

    /// Record `n` substitutions.
    pub fn add_count(&mut self, n: u64) {
        self.count += n;
    }

    /// Return the number of substitutions performed.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Iterate over `(class name, token)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.table[name].as_str()))
    }

    /// Return the number of assigned class names.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether no class name has been assigned.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
