//! Scope injection: an unqualified `return` inside do blocks.
//!
//! A module opts in once with a top-level `$inject_return();` (or
//! `$inject_return("alias")`). Inside its do blocks, `pure(v)` then means
//! the block's own `return`, so `pure(v)` under `$do(List, ...)` becomes
//! `List.return(v)`.

use mdo_ast::DoSyntax;
use swc_ecma_ast as ast;
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::abstraction::Abstraction;

/// Rewrites calls to `alias(...)` into `abstraction.lift(...)`.
pub struct ReturnInjector<'a, A: ?Sized> {
    alias: &'a str,
    abstraction: &'a A,
}

impl<'a, A: Abstraction + ?Sized> ReturnInjector<'a, A> {
    pub fn new(alias: &'a str, abstraction: &'a A) -> Self {
        Self { alias, abstraction }
    }
}

impl<A: Abstraction + ?Sized> VisitMut for ReturnInjector<'_, A> {
    fn visit_mut_expr(&mut self, expr: &mut ast::Expr) {
        expr.visit_mut_children_with(self);

        let ast::Expr::Call(call) = expr else {
            return;
        };
        let is_alias = matches!(
            &call.callee,
            ast::Callee::Expr(callee)
                if matches!(&**callee, ast::Expr::Ident(ident) if &*ident.sym == self.alias)
        );
        if is_alias {
            let args = std::mem::take(&mut call.args);
            *expr = self.abstraction.lift(call.span, args);
        }
    }
}

/// Remove every top-level injection directive from `items`, returning the
/// alias of the last one found.
pub fn take_directive(items: &mut Vec<ast::ModuleItem>, syntax: &DoSyntax) -> Option<String> {
    let mut alias = None;
    items.retain(|item| match directive_alias(item, syntax) {
        Some(found) => {
            alias = Some(found);
            false
        }
        None => true,
    });
    alias
}

fn directive_alias(item: &ast::ModuleItem, syntax: &DoSyntax) -> Option<String> {
    let ast::ModuleItem::Stmt(ast::Stmt::Expr(ast::ExprStmt { expr, .. })) = item else {
        return None;
    };
    let ast::Expr::Call(call) = &**expr else {
        return None;
    };
    let ast::Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let ast::Expr::Ident(ident) = &**callee else {
        return None;
    };
    if &*ident.sym != syntax.inject_directive.as_str() {
        return None;
    }

    let alias = call.args.first().and_then(|arg| match &*arg.expr {
        ast::Expr::Lit(ast::Lit::Str(s)) => s.raw.as_deref().map(unquote),
        _ => None,
    });
    Some(alias.unwrap_or_else(|| syntax.return_alias.clone()))
}

/// `"pure"` or `'pure'` → `pure`
fn unquote(raw: &str) -> String {
    raw.get(1..raw.len().saturating_sub(1))
        .unwrap_or_default()
        .to_string()
}
