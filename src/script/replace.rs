//! Substitute class names inside the string literals of a script.

use swc_core::ecma::{
    ast::{
        CallExpr, Callee, ExportAll, Expr, ExprStmt, ImportDecl, Lit, NamedExport, Program, Str,
        TplElement, TsExternalModuleRef, TsModuleName,
    },
    visit::{VisitMut, VisitMutWith},
};

use super::hook::{HookAction, HookContext, ScriptHook};
use crate::{
    catalog::{ClassCatalog, ClassMatcher},
    substitution::Substitutions,
};

/// Replace the class names found in `value` by their tokens.
///
/// Tokens are assigned to new class names in order of first occurrence. Every
/// occurrence is counted. Returns `None` if `value` contains no class name.
pub fn replace_value(
    value: &str,
    matcher: &ClassMatcher,
    substitutions: &mut Substitutions,
) -> Option<String> {
    let (result, count) = rewrite(value, matcher, substitutions)?;
    substitutions.add_count(count);
    Some(result)
}

/// Replace class names without counting.
///
/// Returns the new value and the number of occurrences.
fn rewrite(
    value: &str,
    matcher: &ClassMatcher,
    substitutions: &mut Substitutions,
) -> Option<(String, u64)> {
    let ranges = matcher.find_all(value);

    if ranges.is_empty() {
        return None;
    }

    let mut result = String::with_capacity(value.len());
    let mut last = 0;

    for range in &ranges {
        result.push_str(&value[last..range.start]);
        result.push_str(substitutions.assign(&value[range.clone()]));
        last = range.end;
    }

    result.push_str(&value[last..]);

    Some((result, ranges.len() as u64))
}

/// Visitor substituting class names in string literals and template chunks.
///
/// Module specifiers and directives are left untouched.
pub struct LiteralReplacer<'a, 'h> {
    cx: HookContext<'a>,
    hook: Option<&'h mut (dyn ScriptHook + 'h)>,
}

impl<'a, 'h> LiteralReplacer<'a, 'h> {
    /// Create a replacer for the classes of `catalog`.
    pub fn new(
        substitutions: &'a mut Substitutions,
        catalog: &'a ClassCatalog,
        matcher: Option<&'a ClassMatcher>,
        hook: Option<&'h mut (dyn ScriptHook + 'h)>,
    ) -> Self {
        Self {
            cx: HookContext {
                substitutions,
                catalog,
                matcher,
            },
            hook,
        }
    }

    /// Substitute class names in a whole program.
    pub fn replace_program(&mut self, program: &mut Program) {
        program.visit_mut_with(self);
    }
}

impl LiteralReplacer<'_, '_> {
    /// Call the hook on an expression.
    fn enter(&mut self, expr: &mut Expr) -> HookAction {
        match self.hook.as_deref_mut() {
            Some(hook) => hook.enter(expr, &mut self.cx),
            None => HookAction::Continue,
        }
    }

    /// Apply the default substitution to a string.
    fn replace_str(&mut self, node: &mut Str) {
        if let Some(value) = self.cx.replace(&node.value) {
            node.value = value.into();
            node.raw = None;
        }
    }
}

impl VisitMut for LiteralReplacer<'_, '_> {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        match self.enter(expr) {
            HookAction::Continue => match expr {
                Expr::Lit(Lit::Str(node)) => self.replace_str(node),
                _ => expr.visit_mut_children_with(self),
            },
            HookAction::Skip => {},
            HookAction::Handled => match expr {
                Expr::Lit(_) => {},
                Expr::Tpl(tpl) => {
                    for expr in tpl.exprs.iter_mut() {
                        self.visit_mut_expr(expr);
                    }
                },
                _ => expr.visit_mut_children_with(self),
            },
        }
    }

    /// Strings outside expressions: object keys, JSX attribute values, literal
    /// types. The hook sees them as string literal expressions.
    fn visit_mut_str(&mut self, node: &mut Str) {
        if self.hook.is_none() {
            self.replace_str(node);
            return;
        }

        let mut expr = Expr::Lit(Lit::Str(node.clone()));
        let action = self.enter(&mut expr);

        match expr {
            Expr::Lit(Lit::Str(value)) => *node = value,
            _ => log::warn!("Ignoring a hook replacing the string {:?}", node.value),
        }

        if action == HookAction::Continue {
            self.replace_str(node);
        }
    }

    fn visit_mut_tpl_element(&mut self, node: &mut TplElement) {
        let Some(matcher) = self.cx.matcher else {
            return;
        };

        if let Some((raw, count)) = rewrite(&node.raw, matcher, self.cx.substitutions) {
            node.raw = raw.into();
            self.cx.substitutions.add_count(count);
        }

        if let Some(cooked) = &node.cooked {
            if let Some((cooked, _)) = rewrite(cooked, matcher, self.cx.substitutions) {
                node.cooked = Some(cooked.into());
            }
        }
    }

    fn visit_mut_import_decl(&mut self, _: &mut ImportDecl) {}

    fn visit_mut_named_export(&mut self, _: &mut NamedExport) {}

    fn visit_mut_export_all(&mut self, _: &mut ExportAll) {}

    fn visit_mut_ts_external_module_ref(&mut self, _: &mut TsExternalModuleRef) {}

    fn visit_mut_ts_module_name(&mut self, _: &mut TsModuleName) {}

    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        let is_module_call = match &call.callee {
            Callee::Import(_) => true,
            Callee::Expr(callee) => {
                matches!(&**callee, Expr::Ident(ident) if &*ident.sym == "require")
            },
            Callee::Super(_) => false,
        };

        if !is_module_call {
            call.visit_mut_children_with(self);
            return;
        }

        // The first argument is the module specifier
        for arg in call.args.iter_mut().skip(1) {
            arg.visit_mut_with(self);
        }
    }

    fn visit_mut_expr_stmt(&mut self, stmt: &mut ExprStmt) {
        // Directives such as "use strict"
        if matches!(&*stmt.expr, Expr::Lit(Lit::Str(_))) {
            return;
        }

        stmt.visit_mut_children_with(self);
    }
}
