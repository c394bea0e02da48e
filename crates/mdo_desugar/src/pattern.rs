//! Converting the left-hand side of `<-` into a binding pattern.
//!
//! The parser sees `[a, b] <- m` as a comparison, so its left side arrives
//! as an expression. Identifiers, array literals and object literals (with
//! holes, rest elements and defaults) convert to the matching patterns.

use swc_common::Spanned;
use swc_ecma_ast as ast;

use crate::error::{DesugarError, DesugarResult};

pub fn expr_to_pat(expr: ast::Expr) -> DesugarResult<ast::Pat> {
    match expr {
        ast::Expr::Ident(ident) => Ok(ast::Pat::Ident(ident.into())),
        ast::Expr::Paren(paren) => expr_to_pat(*paren.expr),
        ast::Expr::Array(array) => array_to_pat(array),
        ast::Expr::Object(object) => object_to_pat(object),
        ast::Expr::Assign(assign) if assign.op == ast::AssignOp::Assign => {
            Ok(ast::Pat::Assign(ast::AssignPat {
                span: assign.span,
                left: Box::new(assign_target_to_pat(assign.left)?),
                right: assign.right,
            }))
        }
        other => Err(DesugarError::InvalidBindPattern { span: other.span() }),
    }
}

/// The pattern of an assignment target, if it declares bindings.
///
/// `x = ...` and `[a, b] = ...` do; `obj.field = ...` does not.
pub fn assign_target_to_pat(target: ast::AssignTarget) -> DesugarResult<ast::Pat> {
    match target {
        ast::AssignTarget::Simple(ast::SimpleAssignTarget::Ident(binding)) => {
            Ok(ast::Pat::Ident(binding))
        }
        ast::AssignTarget::Pat(ast::AssignTargetPat::Array(array)) => Ok(ast::Pat::Array(array)),
        ast::AssignTarget::Pat(ast::AssignTargetPat::Object(object)) => {
            Ok(ast::Pat::Object(object))
        }
        other => Err(DesugarError::InvalidBindPattern { span: other.span() }),
    }
}

fn array_to_pat(array: ast::ArrayLit) -> DesugarResult<ast::Pat> {
    let mut elems = Vec::with_capacity(array.elems.len());
    for elem in array.elems {
        let pat = match elem {
            None => None,
            Some(ast::ExprOrSpread {
                spread: Some(dot3),
                expr,
            }) => Some(ast::Pat::Rest(ast::RestPat {
                span: dot3.with_hi(expr.span().hi),
                dot3_token: dot3,
                arg: Box::new(expr_to_pat(*expr)?),
                type_ann: None,
            })),
            Some(ast::ExprOrSpread { spread: None, expr }) => Some(expr_to_pat(*expr)?),
        };
        elems.push(pat);
    }

    Ok(ast::Pat::Array(ast::ArrayPat {
        span: array.span,
        elems,
        optional: false,
        type_ann: None,
    }))
}

fn object_to_pat(object: ast::ObjectLit) -> DesugarResult<ast::Pat> {
    let mut props = Vec::with_capacity(object.props.len());
    for prop in object.props {
        let prop = match prop {
            ast::PropOrSpread::Spread(spread) => ast::ObjectPatProp::Rest(ast::RestPat {
                span: spread.dot3_token.with_hi(spread.expr.span().hi),
                dot3_token: spread.dot3_token,
                arg: Box::new(expr_to_pat(*spread.expr)?),
                type_ann: None,
            }),
            ast::PropOrSpread::Prop(prop) => match *prop {
                ast::Prop::Shorthand(ident) => ast::ObjectPatProp::Assign(ast::AssignPatProp {
                    span: ident.span,
                    key: ident.into(),
                    value: None,
                }),
                ast::Prop::KeyValue(kv) => ast::ObjectPatProp::KeyValue(ast::KeyValuePatProp {
                    key: kv.key,
                    value: Box::new(expr_to_pat(*kv.value)?),
                }),
                ast::Prop::Assign(assign) => ast::ObjectPatProp::Assign(ast::AssignPatProp {
                    span: assign.key.span,
                    key: assign.key.into(),
                    value: Some(assign.value),
                }),
                other => return Err(DesugarError::InvalidBindPattern { span: other.span() }),
            },
        };
        props.push(prop);
    }

    Ok(ast::Pat::Object(ast::ObjectPat {
        span: object.span,
        props,
        optional: false,
        type_ann: None,
    }))
}
