//! Helpers for comparing generated trees with TypeScript written by hand.

use mdo_ast::BindArrows;
use swc_common::{sync::Lrc, EqIgnoreSpan, FileName, SourceMap};
use swc_ecma_ast as ast;
use swc_ecma_parser::{Syntax, TsSyntax};
use swc_ecma_visit::{VisitMut, VisitMutWith};

fn ts() -> Syntax {
    Syntax::Typescript(TsSyntax::default())
}

pub fn parse_expr(src: &str) -> Box<ast::Expr> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), src.to_string());
    swc_ecma_parser::parse_file_as_expr(&fm, ts(), ast::EsVersion::latest(), None, &mut vec![])
        .unwrap_or_else(|e| panic!("failed to parse expression {src:?}: {e:?}"))
}

/// Parse a module the way the CLI does, bind arrows included.
pub fn parse_module(src: &str) -> (ast::Module, BindArrows) {
    let parsed = mdo_parser::parse_mdo(src, "test.ts").expect("test source should parse");
    (parsed.module, parsed.bind_arrows)
}

/// The statements of the first arrow or function body found in `src`,
/// together with the bind arrows of the whole source.
pub fn body_stmts(src: &str) -> (Vec<ast::Stmt>, BindArrows) {
    let (module, arrows) = parse_module(src);
    for item in module.body {
        let ast::ModuleItem::Stmt(ast::Stmt::Expr(ast::ExprStmt { expr, .. })) = item else {
            continue;
        };
        if let ast::Expr::Arrow(ast::ArrowExpr { body, .. }) = *expr {
            if let ast::BlockStmtOrExpr::BlockStmt(block) = *body {
                return (block.stmts, arrows);
            }
        }
    }
    panic!("no arrow with a block body in {src:?}");
}

struct StripParens;

impl VisitMut for StripParens {
    fn visit_mut_expr(&mut self, expr: &mut ast::Expr) {
        expr.visit_mut_children_with(self);
        while let ast::Expr::Paren(paren) = expr {
            let inner = std::mem::replace(
                &mut paren.expr,
                Box::new(ast::Expr::Invalid(ast::Invalid {
                    span: swc_common::DUMMY_SP,
                })),
            );
            *expr = *inner;
        }
    }
}

#[track_caller]
pub fn assert_same_expr(actual: &ast::Expr, expected: &str) {
    let mut actual = actual.clone();
    let mut expected_expr = *parse_expr(expected);
    actual.visit_mut_with(&mut StripParens);
    expected_expr.visit_mut_with(&mut StripParens);
    assert!(
        actual.eq_ignore_span(&expected_expr),
        "trees differ\n--- expected ---\n{expected}\n{expected_expr:#?}\n--- actual ---\n{actual:#?}"
    );
}

#[track_caller]
pub fn assert_same_module(actual: &ast::Module, expected: &str) {
    let mut actual = actual.clone();
    let (mut expected_module, _) = parse_module(expected);
    actual.visit_mut_with(&mut StripParens);
    expected_module.visit_mut_with(&mut StripParens);
    assert!(
        actual.body.eq_ignore_span(&expected_module.body),
        "modules differ\n--- expected ---\n{expected}\n{:#?}\n--- actual ---\n{:#?}",
        expected_module.body,
        actual.body
    );
}

/// Wrap statements as the sole body of an expression-bodied or block-bodied
/// arrow so they can be compared as one expression.
pub fn stmts_as_expr(stmts: Vec<ast::Stmt>) -> ast::Expr {
    ast::Expr::Arrow(ast::ArrowExpr {
        body: Box::new(ast::BlockStmtOrExpr::BlockStmt(ast::BlockStmt {
            stmts,
            ..Default::default()
        })),
        ..Default::default()
    })
}
