//! Statement-sequence expansion.
//!
//! Rewrites a captured do block into right-nested `bind` calls:
//!
//! ```text
//! [Bind(a, e1), Plain(e2), Terminal(e3)]
//!   → M.bind(e1, (a) => M.bind(e2, () => e3))
//! ```
//!
//! Escapes splice their host statements ahead of the rest of the chain.
//! The last statement is emitted as written, whatever its kind.

use mdo_ast::{DoStmt, DoStmtKind};
use swc_common::{Span, Spanned, DUMMY_SP};
use swc_ecma_ast as ast;

use crate::abstraction::{make_call, paren_if_needed, Abstraction};

/// Expand `stmts` into host statements.
///
/// The result is empty only for empty input. Its last element is either the
/// terminal statement or the outermost `bind` call.
pub fn expand<A: Abstraction + ?Sized>(abstraction: &A, stmts: Vec<DoStmt>) -> Vec<ast::Stmt> {
    expand_rest(abstraction, stmts.into_iter())
}

/// `Plain` statements get a zero-parameter continuation `() => rest`. The
/// argument `bind` passes is dropped by the call itself, so no wildcard name
/// is introduced that could shadow a binding such as `_` in `rest`.
fn expand_rest<A: Abstraction + ?Sized>(
    abstraction: &A,
    mut rest: std::vec::IntoIter<DoStmt>,
) -> Vec<ast::Stmt> {
    let Some(head) = rest.next() else {
        return Vec::new();
    };

    if rest.len() == 0 {
        return vec![head.source];
    }

    match head.kind {
        DoStmtKind::EscapeInline(stmts) => splice(stmts, abstraction, rest),
        DoStmtKind::EscapeBlock(block) => splice(block.stmts, abstraction, rest),
        DoStmtKind::Terminal => splice(vec![head.source], abstraction, rest),
        DoStmtKind::Bind { pat, expr } => {
            let body = expand_rest(abstraction, rest);
            vec![bind_stmt(abstraction, head.span, expr, vec![pat], body)]
        }
        DoStmtKind::Plain(expr) => {
            let body = expand_rest(abstraction, rest);
            vec![bind_stmt(abstraction, head.span, expr, Vec::new(), body)]
        }
    }
}

fn splice<A: Abstraction + ?Sized>(
    mut spliced: Vec<ast::Stmt>,
    abstraction: &A,
    rest: std::vec::IntoIter<DoStmt>,
) -> Vec<ast::Stmt> {
    spliced.extend(expand_rest(abstraction, rest));
    spliced
}

/// `abstraction.bind(expr, (params) => body);`
fn bind_stmt<A: Abstraction + ?Sized>(
    abstraction: &A,
    span: Span,
    expr: Box<ast::Expr>,
    params: Vec<ast::Pat>,
    body: Vec<ast::Stmt>,
) -> ast::Stmt {
    let continuation = ast::Expr::Arrow(ast::ArrowExpr {
        span,
        params,
        body: Box::new(into_body(body)),
        ..Default::default()
    });

    ast::Stmt::Expr(ast::ExprStmt {
        span,
        expr: Box::new(abstraction.bind(span, expr, Box::new(continuation))),
    })
}

/// A function body producing the value of `stmts`.
///
/// A lone expression statement becomes an expression body; otherwise a
/// trailing expression statement becomes the `return`.
pub fn into_body(mut stmts: Vec<ast::Stmt>) -> ast::BlockStmtOrExpr {
    if stmts.len() == 1 && matches!(stmts[0], ast::Stmt::Expr(_)) {
        if let Some(ast::Stmt::Expr(stmt)) = stmts.pop() {
            return ast::BlockStmtOrExpr::Expr(paren_if_needed(stmt.expr));
        }
    }

    let span = match (stmts.first(), stmts.last()) {
        (Some(first), Some(last)) => first.span().to(last.span()),
        _ => DUMMY_SP,
    };

    if let Some(ast::Stmt::Expr(_)) = stmts.last() {
        if let Some(ast::Stmt::Expr(last)) = stmts.pop() {
            stmts.push(ast::Stmt::Return(ast::ReturnStmt {
                span: last.span,
                arg: Some(last.expr),
            }));
        }
    }

    ast::BlockStmtOrExpr::BlockStmt(ast::BlockStmt {
        span,
        stmts,
        ..Default::default()
    })
}

/// A single expression producing the value of `stmts`: the expression itself
/// for a lone expression statement, an immediately invoked arrow otherwise.
///
/// The result replaces a call, so a sequence comes back parenthesised.
pub fn into_expr(mut stmts: Vec<ast::Stmt>) -> ast::Expr {
    if stmts.len() == 1 && matches!(stmts[0], ast::Stmt::Expr(_)) {
        if let Some(ast::Stmt::Expr(stmt)) = stmts.pop() {
            return *paren_if_needed(stmt.expr);
        }
    }

    let body = into_body(stmts);
    let span = body.span();
    let arrow = ast::Expr::Arrow(ast::ArrowExpr {
        span,
        body: Box::new(body),
        ..Default::default()
    });

    make_call(
        span,
        ast::Expr::Paren(ast::ParenExpr {
            span,
            expr: Box::new(arrow),
        }),
        Vec::new(),
    )
}
