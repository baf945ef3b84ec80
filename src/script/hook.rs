//! Customize the substitution of script nodes.
//!
//! A [`ScriptHook`] is called on every expression of the script, before the
//! default handling. It can leave the expression to the default handling,
//! skip it, or rewrite it itself. Strings found outside expressions, such as
//! object keys or JSX attribute values, are presented to the hook as string
//! literal expressions.

use swc_core::ecma::ast::{Callee, Expr, ExprOrSpread, Lit};

use super::replace::replace_value;
use crate::{
    catalog::{ClassCatalog, ClassMatcher},
    substitution::Substitutions,
};

/// Action returned by a [`ScriptHook`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HookAction {
    /// Apply the default handling, then visit children.
    #[default]
    Continue,
    /// Leave the expression and its children untouched.
    Skip,
    /// The hook has rewritten the expression; only visit its children.
    Handled,
}

/// State exposed to a [`ScriptHook`].
#[derive(Debug)]
pub struct HookContext<'a> {
    pub(super) substitutions: &'a mut Substitutions,
    pub(super) catalog: &'a ClassCatalog,
    pub(super) matcher: Option<&'a ClassMatcher>,
}

impl HookContext<'_> {
    /// Return the class names of the stylesheet.
    pub fn catalog(&self) -> &ClassCatalog {
        self.catalog
    }

    /// Return the substitution table.
    pub fn substitutions(&mut self) -> &mut Substitutions {
        &mut *self.substitutions
    }

    /// Return the token of a class name, assigning a new one if needed.
    pub fn assign(&mut self, name: &str) -> String {
        self.substitutions.assign(name).to_owned()
    }

    /// Apply the default substitution to a string.
    ///
    /// Returns `None` if the string contains no class name.
    pub fn replace(&mut self, value: &str) -> Option<String> {
        replace_value(value, self.matcher?, self.substitutions)
    }
}

/// Hook called on every expression of a script, in pre-order.
pub trait ScriptHook {
    /// Called when entering an expression.
    fn enter(&mut self, expr: &mut Expr, cx: &mut HookContext<'_>) -> HookAction;
}

/// Create a hook from a closure.
pub fn hook_fn<F>(f: F) -> impl ScriptHook
where
    F: FnMut(&mut Expr, &mut HookContext<'_>) -> HookAction,
{
    FnHook(f)
}

/// Hook wrapping a closure.
struct FnHook<F>(F);

impl<F> ScriptHook for FnHook<F>
where
    F: FnMut(&mut Expr, &mut HookContext<'_>) -> HookAction,
{
    fn enter(&mut self, expr: &mut Expr, cx: &mut HookContext<'_>) -> HookAction {
        (self.0)(expr, cx)
    }
}

/// Hook for component definitions deriving class names from a base name.
///
/// A call such as `component("btn", ...)` declares the class `btn` and the
/// class `btn-inner`, the latter being built at runtime by appending a suffix
/// to the former. The base name is assigned a token `t` and the derived name
/// is mapped to `t` followed by the same suffix, so that the runtime
/// concatenation keeps matching the stylesheet.
#[derive(Debug, Clone)]
pub struct ComponentHook {
    /// Name of the component definition function.
    pub callee: String,

    /// Suffix appended to the base class name.
    pub suffix: String,
}

impl ComponentHook {
    /// Default suffix of derived class names.
    pub const DEFAULT_SUFFIX: &'static str = "-inner";

    /// Create a hook for calls to `callee`.
    pub fn new(callee: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            callee: callee.into(),
            suffix: suffix.into(),
        }
    }
}

impl ScriptHook for ComponentHook {
    fn enter(&mut self, expr: &mut Expr, cx: &mut HookContext<'_>) -> HookAction {
        let Expr::Call(call) = expr else {
            return HookAction::Continue;
        };

        let is_callee = match &call.callee {
            Callee::Expr(callee) => {
                matches!(&**callee, Expr::Ident(ident) if &*ident.sym == self.callee)
            },
            _ => false,
        };

        if !is_callee {
            return HookAction::Continue;
        }

        let Some(ExprOrSpread { spread: None, expr }) = call.args.first_mut() else {
            return HookAction::Continue;
        };

        let Expr::Lit(Lit::Str(name)) = &mut **expr else {
            return HookAction::Continue;
        };

        let base = name.value.to_string();

        if !cx.catalog().contains(&base) {
            return HookAction::Continue;
        }

        let token = cx.assign(&base);

        if !self.suffix.is_empty() {
            let derived = format!("{base}{}", self.suffix);
            let derived_token = format!("{token}{}", self.suffix);
            if !cx.substitutions().insert(&derived, &derived_token) {
                log::warn!("Class `{derived}` cannot be mapped to `{derived_token}`");
            }
        }

        cx.substitutions().add_count(1);
        name.value = token.into();
        name.raw = None;

        HookAction::Handled
    }
}
