//! Capture layer: turns the host statements of a do block into [`DoStmt`]s.
//!
//! Statement forms:
//!
//! - `pat <- m;` → `Bind`
//! - `$let(x = 1, f());`, `$let({ a: 1 });`, a declaration or any other
//!   non-expression statement → `EscapeInline`
//! - `$let({ do: ... });`, `$let: { ... }` → `EscapeBlock`
//! - any other expression statement → `Plain`
//! - the last statement → `Terminal`, whatever its shape

use mdo_ast::{BindArrows, DoStmt, DoStmtKind, DoSyntax};
use swc_common::{Span, Spanned, DUMMY_SP};
use swc_ecma_ast as ast;
use tracing::{debug, warn};

use crate::error::{DesugarError, DesugarResult};
use crate::pattern::{assign_target_to_pat, expr_to_pat};

pub struct Capture<'a> {
    syntax: &'a DoSyntax,
    arrows: &'a BindArrows,
}

impl<'a> Capture<'a> {
    pub fn new(syntax: &'a DoSyntax, arrows: &'a BindArrows) -> Self {
        Self { syntax, arrows }
    }

    pub fn syntax(&self) -> &DoSyntax {
        self.syntax
    }

    /// The statements of a captured block.
    ///
    /// A function literal with a block body is the multi-statement marker;
    /// any other expression is a one-statement block.
    pub fn block_stmts(&self, block: Box<ast::Expr>) -> Vec<ast::Stmt> {
        let stmts = match *block {
            ast::Expr::Paren(paren) => return self.block_stmts(paren.expr),
            ast::Expr::Arrow(arrow) => match *arrow.body {
                ast::BlockStmtOrExpr::BlockStmt(body) => body.stmts,
                ast::BlockStmtOrExpr::Expr(expr) => vec![expr_stmt(expr)],
            },
            ast::Expr::Fn(func) => func.function.body.map(|body| body.stmts).unwrap_or_default(),
            other => vec![expr_stmt(Box::new(other))],
        };

        stmts
            .into_iter()
            .filter(|stmt| !matches!(stmt, ast::Stmt::Empty(_)))
            .collect()
    }

    /// Classify every statement; the last one is terminal by position.
    pub fn classify(&self, stmts: Vec<ast::Stmt>) -> DesugarResult<Vec<DoStmt>> {
        let last = stmts.len().saturating_sub(1);
        stmts
            .into_iter()
            .enumerate()
            .map(|(i, stmt)| {
                if i == last {
                    Ok(self.terminal(stmt))
                } else {
                    self.classify_stmt(stmt)
                }
            })
            .collect()
    }

    fn terminal(&self, stmt: ast::Stmt) -> DoStmt {
        let stmt = match stmt {
            ast::Stmt::Return(ast::ReturnStmt {
                span,
                arg: Some(arg),
            }) => ast::Stmt::Expr(ast::ExprStmt { span, expr: arg }),
            other => other,
        };

        if self.is_statement_form(&stmt) {
            warn!(
                "last statement of a do block is a bind or `{}` form; it is emitted unchanged",
                self.syntax.escape
            );
        }

        DoStmt::terminal(stmt)
    }

    pub fn classify_stmt(&self, stmt: ast::Stmt) -> DesugarResult<DoStmt> {
        let source = stmt.clone();
        let span = stmt.span();

        let kind = match stmt {
            ast::Stmt::Expr(ast::ExprStmt { expr, .. }) => self.classify_expr(expr)?,
            ast::Stmt::Labeled(labeled) if &*labeled.label.sym == self.syntax.escape.as_str() => {
                DoStmtKind::EscapeBlock(into_block(*labeled.body))
            }
            ast::Stmt::Return(ret) => return Err(DesugarError::EarlyReturn { span: ret.span }),
            other => {
                debug!("splicing non-expression statement into do block verbatim");
                DoStmtKind::EscapeInline(vec![other])
            }
        };

        Ok(DoStmt::new(span, kind, source))
    }

    fn classify_expr(&self, mut expr: Box<ast::Expr>) -> DesugarResult<DoStmtKind> {
        if let ast::Expr::Call(call) = &mut *expr {
            if self.is_escape_callee(&call.callee) {
                let args = std::mem::take(&mut call.args);
                return self.resolve_escape(call.span, args);
            }
        }

        match self.split_bind(&mut expr)? {
            Some(pat) => Ok(DoStmtKind::Bind { pat, expr }),
            None => Ok(DoStmtKind::Plain(expr)),
        }
    }

    fn is_escape_callee(&self, callee: &ast::Callee) -> bool {
        matches!(
            callee,
            ast::Callee::Expr(expr)
                if matches!(&**expr, ast::Expr::Ident(ident) if &*ident.sym == self.syntax.escape.as_str())
        )
    }

    /// Whether `stmt` has the shape of a bind or an escape.
    fn is_statement_form(&self, stmt: &ast::Stmt) -> bool {
        match stmt {
            ast::Stmt::Labeled(labeled) => &*labeled.label.sym == self.syntax.escape.as_str(),
            ast::Stmt::Expr(ast::ExprStmt { expr, .. }) => match &**expr {
                ast::Expr::Call(call) => self.is_escape_callee(&call.callee),
                ast::Expr::Bin(bin) => {
                    bin.op == ast::BinaryOp::Lt && self.starts_with_arrow(&bin.right)
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Resolve the two shapes of `$let(...)`.
    ///
    /// A single object argument holding the body key is the block form and
    /// contributes only the key's value. A single object argument without it
    /// declares one constant per property. Anything else is the inline form:
    /// assignments to patterns become constants, other arguments are spliced
    /// as expression statements.
    fn resolve_escape(
        &self,
        span: Span,
        mut args: Vec<ast::ExprOrSpread>,
    ) -> DesugarResult<DoStmtKind> {
        let object = match args.as_mut_slice() {
            [ast::ExprOrSpread { spread: None, expr }] => match &mut **expr {
                ast::Expr::Object(object) => Some(std::mem::take(&mut object.props)),
                _ => None,
            },
            _ => None,
        };

        match object {
            Some(props) => self.resolve_escape_object(span, props),
            None => args
                .into_iter()
                .map(|arg| self.escape_arg(arg))
                .collect::<DesugarResult<Vec<_>>>()
                .map(DoStmtKind::EscapeInline),
        }
    }

    fn resolve_escape_object(
        &self,
        span: Span,
        props: Vec<ast::PropOrSpread>,
    ) -> DesugarResult<DoStmtKind> {
        let body_key = self.syntax.escape_body_key.as_str();
        let has_body = props.iter().any(|prop| match prop {
            ast::PropOrSpread::Prop(prop) => match &**prop {
                ast::Prop::KeyValue(kv) => prop_name_is(&kv.key, body_key),
                _ => false,
            },
            ast::PropOrSpread::Spread(_) => false,
        });

        if has_body {
            if props.len() != 1 {
                return Err(self.invalid_escape(span, "the body key must be the only property"));
            }
            let body = props
                .into_iter()
                .find_map(|prop| match prop {
                    ast::PropOrSpread::Prop(prop) => match *prop {
                        ast::Prop::KeyValue(kv) => Some(kv.value),
                        _ => None,
                    },
                    ast::PropOrSpread::Spread(_) => None,
                })
                .ok_or_else(|| self.invalid_escape(span, "missing body"))?;
            return Ok(DoStmtKind::EscapeBlock(self.escape_body(body)));
        }

        props
            .into_iter()
            .map(|prop| {
                let prop_span = prop.span();
                match prop {
                    ast::PropOrSpread::Prop(prop) => match *prop {
                        ast::Prop::KeyValue(ast::KeyValueProp {
                            key: ast::PropName::Ident(name),
                            value,
                        }) => {
                            let binding = ast::Ident::new_no_ctxt(name.sym, name.span);
                            Ok(const_decl(prop_span, ast::Pat::Ident(binding.into()), value))
                        }
                        _ => Err(self.invalid_escape(prop_span, "expected `name: value` properties")),
                    },
                    ast::PropOrSpread::Spread(_) => {
                        Err(self.invalid_escape(prop_span, "spread properties are not allowed"))
                    }
                }
            })
            .collect::<DesugarResult<Vec<_>>>()
            .map(DoStmtKind::EscapeInline)
    }

    /// The statements of a block escape body: a function literal's body, or
    /// the value itself as one expression statement.
    fn escape_body(&self, body: Box<ast::Expr>) -> ast::BlockStmt {
        let span = body.span();
        ast::BlockStmt {
            span,
            stmts: self.block_stmts(body),
            ..Default::default()
        }
    }

    fn escape_arg(&self, arg: ast::ExprOrSpread) -> DesugarResult<ast::Stmt> {
        if let Some(dot3) = arg.spread {
            return Err(self.invalid_escape(dot3, "spread arguments are not allowed"));
        }

        match *arg.expr {
            ast::Expr::Assign(assign)
                if assign.op == ast::AssignOp::Assign && declares_bindings(&assign.left) =>
            {
                let pat = assign_target_to_pat(assign.left)?;
                Ok(const_decl(assign.span, pat, assign.right))
            }
            other => Ok(expr_stmt(Box::new(other))),
        }
    }

    fn invalid_escape(&self, span: Span, reason: &'static str) -> DesugarError {
        DesugarError::InvalidEscape {
            span,
            keyword: self.syntax.escape.clone(),
            reason,
        }
    }

    /// Split `pat <- m` out of `expr`, leaving `m` in its place.
    ///
    /// `x <- a || b` parses as `(x < -a) || b`, so the search follows the
    /// left spine through operators that bind looser than `<`; whatever
    /// surrounds the arrow becomes part of the bound expression.
    fn split_bind(&self, expr: &mut ast::Expr) -> DesugarResult<Option<ast::Pat>> {
        match expr {
            ast::Expr::Bin(bin) if bin.op == ast::BinaryOp::Lt && self.starts_with_arrow(&bin.right) => {
                let pat = expr_to_pat(take(&mut bin.left))?;
                let mut bound = take(&mut bin.right);
                strip_leading_negation(&mut bound);
                *expr = bound;
                Ok(Some(pat))
            }
            ast::Expr::Bin(bin) if binds_looser_than_arrow(bin.op) => self.split_bind(&mut bin.left),
            ast::Expr::Cond(cond) => self.split_bind(&mut cond.test),
            ast::Expr::Seq(seq) => match seq.exprs.first_mut() {
                Some(first) => self.split_bind(first),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// Whether the leftmost operand of `expr` is a unary minus written
    /// directly after a `<`.
    fn starts_with_arrow(&self, expr: &ast::Expr) -> bool {
        match expr {
            ast::Expr::Unary(unary) if unary.op == ast::UnaryOp::Minus => {
                self.arrows.contains(unary.span.lo)
            }
            ast::Expr::Bin(bin) if binds_tighter_than_arrow(bin.op) => self.starts_with_arrow(&bin.left),
            _ => false,
        }
    }
}

/// Remove the unary minus that the arrow's `-` produced.
fn strip_leading_negation(expr: &mut ast::Expr) {
    match expr {
        ast::Expr::Unary(unary) if unary.op == ast::UnaryOp::Minus => {
            *expr = take(&mut unary.arg);
        }
        ast::Expr::Bin(bin) if binds_tighter_than_arrow(bin.op) => {
            strip_leading_negation(&mut bin.left)
        }
        _ => {}
    }
}

fn binds_tighter_than_arrow(op: ast::BinaryOp) -> bool {
    use ast::BinaryOp::*;
    matches!(
        op,
        Add | Sub | Mul | Div | Mod | Exp | LShift | RShift | ZeroFillRShift
    )
}

fn binds_looser_than_arrow(op: ast::BinaryOp) -> bool {
    !binds_tighter_than_arrow(op)
}

fn take(expr: &mut Box<ast::Expr>) -> ast::Expr {
    *std::mem::replace(
        expr,
        Box::new(ast::Expr::Invalid(ast::Invalid { span: DUMMY_SP })),
    )
}

fn declares_bindings(target: &ast::AssignTarget) -> bool {
    matches!(
        target,
        ast::AssignTarget::Simple(ast::SimpleAssignTarget::Ident(_))
            | ast::AssignTarget::Pat(ast::AssignTargetPat::Array(_))
            | ast::AssignTarget::Pat(ast::AssignTargetPat::Object(_))
    )
}

fn prop_name_is(name: &ast::PropName, expected: &str) -> bool {
    matches!(name, ast::PropName::Ident(ident) if &*ident.sym == expected)
}

fn into_block(stmt: ast::Stmt) -> ast::BlockStmt {
    match stmt {
        ast::Stmt::Block(block) => block,
        other => ast::BlockStmt {
            span: other.span(),
            stmts: vec![other],
            ..Default::default()
        },
    }
}

pub(crate) fn expr_stmt(expr: Box<ast::Expr>) -> ast::Stmt {
    ast::Stmt::Expr(ast::ExprStmt {
        span: expr.span(),
        expr,
    })
}

fn const_decl(span: Span, name: ast::Pat, init: Box<ast::Expr>) -> ast::Stmt {
    ast::Stmt::Decl(ast::Decl::Var(Box::new(ast::VarDecl {
        span,
        kind: ast::VarDeclKind::Const,
        declare: false,
        decls: vec![ast::VarDeclarator {
            span,
            name,
            init: Some(init),
            definite: false,
        }],
        ..Default::default()
    })))
}
