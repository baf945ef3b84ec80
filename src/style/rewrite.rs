//! Apply a substitution table to the selectors of a stylesheet.

use lightningcss::{
    rules::{scope::ScopeRule, style::StyleRule, CssRule},
    selector::{Component, PseudoElement, Selector, SelectorList},
    values::ident::Ident,
};
use parcel_selectors::parser::NthOfSelectorData;
use thiserror::Error;

use super::{block_rules, block_rules_mut, compounds};
use crate::{
    catalog::ClassPattern,
    substitution::{SelectorContext, Substitutions},
};

/// List of errors for this module.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// A selector references a class that has no token.
    #[error("selector references class `{name}` which has no token")]
    Unresolved {
        /// Class name.
        name: String,
    },
}

/// Find the first class of a list of rules that has no token.
///
/// Negated classes are never reported since a token is minted for them.
pub fn find_unresolved(
    rules: &[CssRule<'_>],
    pattern: &ClassPattern,
    substitutions: &Substitutions,
    nested: bool,
) -> Option<String> {
    let check = Resolver {
        pattern,
        substitutions,
    };

    check.rules(rules, nested)
}

/// Read-only resolution of selectors.
struct Resolver<'a> {
    pattern: &'a ClassPattern,
    substitutions: &'a Substitutions,
}

impl Resolver<'_> {
    fn rules(&self, rules: &[CssRule<'_>], nested: bool) -> Option<String> {
        rules.iter().find_map(|rule| match rule {
            CssRule::Style(rule) => self.style_rule(rule, nested),
            CssRule::Nesting(rule) => self.style_rule(&rule.style, nested),
            CssRule::Scope(rule) if nested => [&rule.scope_start, &rule.scope_end]
                .into_iter()
                .flatten()
                .find_map(|list| self.list(list))
                .or_else(|| self.rules(&rule.rules.0, nested)),
            rule if nested => block_rules(rule).and_then(|rules| self.rules(rules, nested)),
            _ => None,
        })
    }

    fn style_rule(&self, rule: &StyleRule<'_>, nested: bool) -> Option<String> {
        self.list(&rule.selectors).or_else(|| {
            nested
                .then(|| self.rules(&rule.rules.0, nested))
                .flatten()
        })
    }

    fn list(&self, list: &SelectorList<'_>) -> Option<String> {
        list.0
            .iter()
            .find_map(|selector| self.selector(selector, SelectorContext::Positive))
    }

    fn selectors(&self, selectors: &[Selector<'_>], context: SelectorContext) -> Option<String> {
        selectors
            .iter()
            .find_map(|selector| self.selector(selector, context))
    }

    /// Return the first positive class of `selector` without token.
    fn selector(&self, selector: &Selector<'_>, context: SelectorContext) -> Option<String> {
        compounds(selector)
            .flatten()
            .find_map(|component| match component {
                Component::Class(class) => {
                    let name: &str = &class.0;
                    let unresolved = context == SelectorContext::Positive
                        && self.pattern.is_match(name)
                        && !self.substitutions.contains(name);
                    unresolved.then(|| name.to_owned())
                },
                Component::Negation(list) => self.selectors(list, SelectorContext::Negated),
                Component::Is(list)
                | Component::Where(list)
                | Component::Has(list)
                | Component::Any(_, list) => self.selectors(list, context),
                Component::NthOf(data) => self.selectors(data.selectors(), context),
                Component::Slotted(selector) | Component::Host(Some(selector)) => {
                    self.selector(selector, context)
                },
                Component::PseudoElement(
                    PseudoElement::CueFunction { selector }
                    | PseudoElement::CueRegionFunction { selector },
                ) => self.selector(selector, context),
                _ => None,
            })
    }
}

/// Rewrites class selectors using a substitution table.
///
/// Selectors referencing a class without token are dropped, and so are rules
/// left without selectors.
#[derive(Debug)]
pub struct SelectorRewriter<'a> {
    /// Classes eligible for substitution.
    pub pattern: &'a ClassPattern,

    /// Substitution table.
    pub substitutions: &'a mut Substitutions,

    /// Whether to rewrite rules nested in conditional blocks and style rules.
    pub nested: bool,

    /// Fail instead of dropping unresolved selectors.
    pub strict: bool,
}

impl SelectorRewriter<'_> {
    /// Rewrite a list of rules in place.
    pub fn rewrite_rules(&mut self, rules: &mut Vec<CssRule<'_>>) -> Result<(), RewriteError> {
        let mut index = 0;

        while index < rules.len() {
            let keep = match &mut rules[index] {
                CssRule::Style(rule) => self.rewrite_style_rule(rule)?,
                CssRule::Nesting(rule) => self.rewrite_style_rule(&mut rule.style)?,
                CssRule::Scope(rule) if self.nested => self.rewrite_scope_rule(rule)?,
                rule if self.nested => match block_rules_mut(rule) {
                    Some(rules) => {
                        self.rewrite_rules(rules)?;
                        !rules.is_empty()
                    },
                    None => true,
                },
                _ => true,
            };

            if keep {
                index += 1;
            } else {
                rules.remove(index);
            }
        }

        Ok(())
    }

    /// Rewrite the selectors of a style rule.
    ///
    /// Returns `false` if the rule has no selector left.
    fn rewrite_style_rule(&mut self, rule: &mut StyleRule<'_>) -> Result<bool, RewriteError> {
        self.rewrite_list(&mut rule.selectors)?;

        if rule.selectors.0.is_empty() {
            return Ok(false);
        }

        if self.nested {
            self.rewrite_rules(&mut rule.rules.0)?;
        }

        Ok(true)
    }

    /// Rewrite the scoping limits and the rules of a `@scope` block.
    ///
    /// Returns `false` if the scope root can never match or if no rule is left.
    fn rewrite_scope_rule(&mut self, rule: &mut ScopeRule<'_>) -> Result<bool, RewriteError> {
        let root_dropped = match &mut rule.scope_start {
            Some(list) => {
                self.rewrite_list(list)?;
                list.0.is_empty()
            },
            None => false,
        };

        let limit_dropped = match &mut rule.scope_end {
            Some(list) => {
                self.rewrite_list(list)?;
                list.0.is_empty()
            },
            None => false,
        };

        // A limit that can never match does not limit anything
        if limit_dropped {
            rule.scope_end = None;
        }

        self.rewrite_rules(&mut rule.rules.0)?;

        Ok(!root_dropped && !rule.rules.0.is_empty())
    }

    /// Rewrite a selector list, dropping the selectors that cannot be resolved.
    fn rewrite_list(&mut self, list: &mut SelectorList<'_>) -> Result<(), RewriteError> {
        let mut kept = Vec::new();

        for mut selector in std::mem::take(&mut list.0) {
            let resolver = Resolver {
                pattern: self.pattern,
                substitutions: &*self.substitutions,
            };

            match resolver.selector(&selector, SelectorContext::Positive) {
                Some(name) if self.strict => return Err(RewriteError::Unresolved { name }),
                Some(name) => {
                    log::debug!("Dropping a selector referencing unused class `{name}`");
                },
                None => {
                    let count = self.rewrite_selector(&mut selector, SelectorContext::Positive);
                    self.substitutions.add_count(count);
                    kept.push(selector);
                },
            }
        }

        list.0 = kept.into_iter().collect();

        Ok(())
    }

    /// Replace the eligible classes of a resolved selector by their tokens.
    ///
    /// Returns the number of replacements.
    fn rewrite_selector(&mut self, selector: &mut Selector<'_>, context: SelectorContext) -> u64 {
        // Same order as `compounds`
        let components = selector
            .iter_mut_raw_match_order()
            .into_slice()
            .rsplit_mut(|component| component.is_combinator())
            .flatten();

        let mut count = 0;

        for component in components {
            count += match component {
                Component::Class(class) => {
                    let name: &str = &class.0;
                    if !self.pattern.is_match(name) {
                        continue;
                    }
                    let Some(token) = self.substitutions.resolve_or_mint(name, context) else {
                        continue;
                    };
                    *class = Ident(token.into());
                    1
                },
                Component::Negation(list) => self.rewrite_selectors(list, SelectorContext::Negated),
                Component::Is(list)
                | Component::Where(list)
                | Component::Has(list)
                | Component::Any(_, list) => self.rewrite_selectors(list, context),
                Component::NthOf(data) => {
                    let mut selectors = data.clone_selectors();
                    let count = self.rewrite_selectors(&mut selectors, context);
                    *data = NthOfSelectorData::new(*data.nth_data(), selectors);
                    count
                },
                Component::Slotted(selector) | Component::Host(Some(selector)) => {
                    self.rewrite_selector(selector, context)
                },
                Component::PseudoElement(
                    PseudoElement::CueFunction { selector }
                    | PseudoElement::CueRegionFunction { selector },
                ) => self.rewrite_selector(selector, context),
                _ => 0,
            };
        }

        count
    }

    /// Rewrite a list of nested selectors.
    fn rewrite_selectors(&mut self, selectors: &mut [Selector<'_>], context: SelectorContext) -> u64 {
        selectors
            .iter_mut()
            .map(|selector| self.rewrite_selector(selector, context))
            .sum()
    }
}
