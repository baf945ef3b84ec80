//! Extract class names from a stylesheet.
//!
//! The catalog is the ordered set of class names that may be substituted. It
//! is sorted from the longest name to the shortest so that, when the names are
//! combined into an alternation, a name is always tried before its prefixes.

use std::{collections::HashSet, ops::Range};

use lightningcss::{
    rules::{style::StyleRule, CssRule},
    selector::{Component, PseudoElement, Selector},
};
use regex::Regex;
use thiserror::Error;

use crate::style::{block_rules, compounds};

/// List of errors for this module.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The configured pattern is not a valid regular expression.
    #[error("invalid class name pattern `{pattern}`")]
    Pattern {
        /// Source error.
        source: regex::Error,
        /// Pattern as configured.
        pattern: String,
    },
}

/// Characters allowed in class names matched by the default patterns.
const CLASS_CHARS: &str = "[A-Za-z0-9_-]";

/// Pattern selecting the class names eligible for substitution.
///
/// The pattern is matched against the whole class selector, leading `.`
/// included.
#[derive(Debug, Clone)]
pub struct ClassPattern(Regex);

impl ClassPattern {
    /// Derive the pattern from the configuration.
    ///
    /// A prefix takes precedence over an explicit pattern. Without either,
    /// every class name is eligible.
    pub fn new(prefix: Option<&str>, pattern: Option<&str>) -> Result<Self, CatalogError> {
        let source = match (prefix, pattern) {
            (Some(prefix), _) => format!(r"^\.{}{CLASS_CHARS}+$", regex::escape(prefix)),
            (None, Some(pattern)) => format!(r"^\.(?:{})$", strip_anchors(pattern)),
            (None, None) => format!(r"^\.{CLASS_CHARS}+$"),
        };

        let re = Regex::new(&source).map_err(|source| CatalogError::Pattern {
            source,
            pattern: pattern.or(prefix).unwrap_or_default().to_owned(),
        })?;

        Ok(Self(re))
    }

    /// Check whether a class name (without `.`) is eligible.
    pub fn is_match(&self, name: &str) -> bool {
        self.0.is_match(&format!(".{name}"))
    }
}

/// Remove the anchors of a user pattern, which is anchored anyway.
fn strip_anchors(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);

    match pattern.strip_suffix('$') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => pattern,
    }
}

impl Default for ClassPattern {
    fn default() -> Self {
        // The default pattern is a valid constant
        Self::new(None, None).unwrap()
    }
}

/// Ordered, deduplicated list of class names found in a stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCatalog(Vec<String>);

impl ClassCatalog {
    /// Extract the class names referenced by the selectors of style rules.
    ///
    /// When `nested` is `false`, rules inside conditional blocks and nested
    /// style rules are not scanned.
    pub fn extract(rules: &[CssRule<'_>], pattern: &ClassPattern, nested: bool) -> Self {
        let mut names = Vec::new();
        collect_rules(rules, pattern, nested, &mut names);
        Self::from_names(names)
    }

    /// Order class names by decreasing length, then by first appearance.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();

        // `sort_by_key` is stable: equal lengths keep their source order
        names.sort_by_key(|name| std::cmp::Reverse(name.chars().count()));

        let mut seen = HashSet::new();
        names.retain(|name| !name.is_empty() && seen.insert(name.clone()));

        Self(names)
    }

    /// Return the class names in order.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Check whether the catalog contains a class name.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Return the number of class names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a matcher finding catalog names in arbitrary strings.
    ///
    /// Returns `None` when the catalog is empty.
    pub fn matcher(&self) -> Option<ClassMatcher> {
        if self.0.is_empty() {
            return None;
        }

        let alternation = self
            .0
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");

        // Escaped literals always form a valid pattern
        let re = Regex::new(&alternation).unwrap();

        Some(ClassMatcher(re))
    }
}

/// Find class names inside string values.
#[derive(Debug, Clone)]
pub struct ClassMatcher(Regex);

impl ClassMatcher {
    /// Return the ranges of all non-overlapping class name occurrences.
    ///
    /// An occurrence must not be preceded or followed by a character that can
    /// be part of a class name, so `btn` is not found inside `btn-large`.
    pub fn find_all(&self, value: &str) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut at = 0;

        while let Some(m) = self.0.find_at(value, at) {
            let before = value[..m.start()].chars().next_back();
            let after = value[m.end()..].chars().next();

            if !before.is_some_and(is_class_char) && !after.is_some_and(is_class_char) {
                ranges.push(m.range());
                at = m.end();
            } else {
                // Retry from the next character
                at = m.start()
                    + value[m.start()..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
            }

            if at >= value.len() {
                break;
            }
        }

        ranges
    }
}

/// Check whether a character may appear in a class name.
fn is_class_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Collect eligible class names from a list of rules.
fn collect_rules(
    rules: &[CssRule<'_>],
    pattern: &ClassPattern,
    nested: bool,
    names: &mut Vec<String>,
) {
    for rule in rules {
        match rule {
            CssRule::Style(rule) => collect_style_rule(rule, pattern, nested, names),
            CssRule::Nesting(rule) => collect_style_rule(&rule.style, pattern, nested, names),
            CssRule::Scope(rule) if nested => {
                for list in [&rule.scope_start, &rule.scope_end].into_iter().flatten() {
                    for selector in list.0.iter() {
                        collect_selector(selector, pattern, names);
                    }
                }
                collect_rules(&rule.rules.0, pattern, nested, names);
            },
            rule if nested => {
                if let Some(rules) = block_rules(rule) {
                    collect_rules(rules, pattern, nested, names);
                }
            },
            _ => {},
        }
    }
}

/// Collect eligible class names from a style rule.
fn collect_style_rule(
    rule: &StyleRule<'_>,
    pattern: &ClassPattern,
    nested: bool,
    names: &mut Vec<String>,
) {
    for selector in rule.selectors.0.iter() {
        collect_selector(selector, pattern, names);
    }
    if nested {
        collect_rules(&rule.rules.0, pattern, nested, names);
    }
}

/// Collect eligible class names from a selector and its nested selectors.
fn collect_selector(selector: &Selector<'_>, pattern: &ClassPattern, names: &mut Vec<String>) {
    for component in compounds(selector).flatten() {
        match component {
            Component::Class(class) => {
                let name: &str = &class.0;
                if pattern.is_match(name) {
                    names.push(name.to_owned());
                }
            },
            Component::Negation(list)
            | Component::Is(list)
            | Component::Where(list)
            | Component::Has(list)
            | Component::Any(_, list) => {
                for selector in list.iter() {
                    collect_selector(selector, pattern, names);
                }
            },
            Component::NthOf(data) => {
                for selector in data.selectors() {
                    collect_selector(selector, pattern, names);
                }
            },
            Component::Slotted(selector) | Component::Host(Some(selector)) => {
                collect_selector(selector, pattern, names);
            },
            Component::PseudoElement(
                PseudoElement::CueFunction { selector }
                | PseudoElement::CueRegionFunction { selector },
            ) => collect_selector(selector, pattern, names),
            _ => {},
        }
    }
}
