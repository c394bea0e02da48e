//! The capability a do block is expanded against.
//!
//! A target abstraction supplies two operations:
//!
//! - `return(value) -> M<T>` lifts a plain value
//! - `bind(m, continuation) -> M<U>` sequences `m` with `continuation`
//!
//! The transform only decides what the calls look like; left identity, right
//! identity and associativity are obligations of the runtime value.

use mdo_ast::DoSyntax;
use swc_common::{Span, Spanned};
use swc_ecma_ast as ast;

/// Builds the `bind` and `return` call expressions for one do block.
pub trait Abstraction {
    /// `bind(monadic, continuation)`
    fn bind(&self, span: Span, monadic: Box<ast::Expr>, continuation: Box<ast::Expr>) -> ast::Expr;

    /// `return(args...)`
    fn lift(&self, span: Span, args: Vec<ast::ExprOrSpread>) -> ast::Expr;
}

/// An abstraction reached through methods on a runtime value:
/// `M.bind(m, k)` and `M.return(v)`.
#[derive(Debug, Clone)]
pub struct MethodAbstraction {
    target: Box<ast::Expr>,
    bind_method: String,
    return_method: String,
}

impl MethodAbstraction {
    pub fn new(
        target: Box<ast::Expr>,
        bind_method: impl Into<String>,
        return_method: impl Into<String>,
    ) -> Self {
        Self {
            target,
            bind_method: bind_method.into(),
            return_method: return_method.into(),
        }
    }

    pub fn from_syntax(target: Box<ast::Expr>, syntax: &DoSyntax) -> Self {
        Self::new(target, &syntax.bind_method, &syntax.return_method)
    }

    /// `target.method`, parenthesising targets that would otherwise bind
    /// looser than member access.
    fn method(&self, span: Span, name: &str) -> ast::Expr {
        let obj = if needs_parens_as_receiver(&self.target) {
            Box::new(ast::Expr::Paren(ast::ParenExpr {
                span,
                expr: self.target.clone(),
            }))
        } else {
            self.target.clone()
        };

        ast::Expr::Member(ast::MemberExpr {
            span,
            obj,
            prop: ast::MemberProp::Ident(ast::IdentName::new(name.into(), span)),
        })
    }
}

impl Abstraction for MethodAbstraction {
    fn bind(&self, span: Span, monadic: Box<ast::Expr>, continuation: Box<ast::Expr>) -> ast::Expr {
        make_call(
            span,
            self.method(span, &self.bind_method),
            vec![
                ast::ExprOrSpread {
                    spread: None,
                    expr: paren_if_needed(monadic),
                },
                ast::ExprOrSpread {
                    spread: None,
                    expr: paren_if_needed(continuation),
                },
            ],
        )
    }

    fn lift(&self, span: Span, args: Vec<ast::ExprOrSpread>) -> ast::Expr {
        make_call(span, self.method(span, &self.return_method), args)
    }
}

/// Build `callee(args...)`.
pub(crate) fn make_call(span: Span, callee: ast::Expr, args: Vec<ast::ExprOrSpread>) -> ast::Expr {
    ast::Expr::Call(ast::CallExpr {
        span,
        callee: ast::Callee::Expr(Box::new(callee)),
        args,
        type_args: None,
        ..Default::default()
    })
}

/// Parenthesise expressions that change meaning as a call argument or an
/// arrow body: a sequence would split into several arguments, an object
/// literal would read as a block.
pub(crate) fn paren_if_needed(expr: Box<ast::Expr>) -> Box<ast::Expr> {
    match *expr {
        ast::Expr::Seq(_) | ast::Expr::Object(_) => Box::new(ast::Expr::Paren(ast::ParenExpr {
            span: expr.span(),
            expr,
        })),
        _ => expr,
    }
}

fn needs_parens_as_receiver(expr: &ast::Expr) -> bool {
    !matches!(
        expr,
        ast::Expr::Ident(_)
            | ast::Expr::Member(_)
            | ast::Expr::Call(_)
            | ast::Expr::Paren(_)
            | ast::Expr::This(_)
            | ast::Expr::Array(_)
            | ast::Expr::OptChain(_)
    )
}
