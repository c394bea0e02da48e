//! Top-level desugaring entry points.
//!
//! Takes a parsed module and replaces every `$do(M, block)` call with the
//! nested `M.bind` / `M.return` expression it stands for.

use mdo_ast::{BindArrows, DoSyntax};
use swc_common::{Span, Spanned};
use swc_ecma_ast as ast;
use swc_ecma_visit::{VisitMut, VisitMutWith};
use tracing::debug;

use crate::abstraction::{Abstraction, MethodAbstraction};
use crate::capture::Capture;
use crate::error::{DesugarError, DesugarErrors, DesugarResult};
use crate::expand::{expand, into_expr};
use crate::inject::{take_directive, ReturnInjector};

/// Expand one captured block against `abstraction`.
///
/// `block` is `None` when the call site supplied no block at all, which is
/// an error rather than an empty expansion. `inject` is the unqualified
/// return alias, when the module enabled one.
pub fn expand_block<A: Abstraction + ?Sized>(
    abstraction: &A,
    span: Span,
    block: Option<Box<ast::Expr>>,
    capture: &Capture<'_>,
    inject: Option<&str>,
) -> DesugarResult<ast::Expr> {
    let entry = &capture.syntax().entry;
    let block = block.ok_or_else(|| DesugarError::MissingBlock {
        span,
        entry: entry.clone(),
    })?;

    let mut stmts = capture.block_stmts(block);
    if stmts.is_empty() {
        return Err(DesugarError::EmptyBlock {
            span,
            entry: entry.clone(),
        });
    }

    if let Some(alias) = inject {
        stmts.visit_mut_with(&mut ReturnInjector::new(alias, abstraction));
    }

    let stmts = capture.classify(stmts)?;
    debug!(statements = stmts.len(), "expanding do block");

    Ok(into_expr(expand(abstraction, stmts)))
}

/// Desugar every do block in a module.
///
/// All errors are collected; the module is returned only when there are none.
pub fn desugar_module(
    mut module: ast::Module,
    arrows: &BindArrows,
    syntax: &DoSyntax,
) -> Result<ast::Module, DesugarErrors> {
    let mut desugarer = DoDesugarer::new(syntax, arrows);
    module.visit_mut_with(&mut desugarer);

    if desugarer.errors.is_empty() {
        Ok(module)
    } else {
        Err(DesugarErrors(desugarer.errors))
    }
}

/// Visitor that expands `$do` calls innermost first.
pub struct DoDesugarer<'a> {
    syntax: &'a DoSyntax,
    capture: Capture<'a>,
    inject: Option<String>,
    errors: Vec<DesugarError>,
}

impl<'a> DoDesugarer<'a> {
    pub fn new(syntax: &'a DoSyntax, arrows: &'a BindArrows) -> Self {
        Self {
            syntax,
            capture: Capture::new(syntax, arrows),
            inject: None,
            errors: Vec::new(),
        }
    }

    fn is_entry(&self, call: &ast::CallExpr) -> bool {
        matches!(
            &call.callee,
            ast::Callee::Expr(callee)
                if matches!(&**callee, ast::Expr::Ident(ident) if &*ident.sym == self.syntax.entry.as_str())
        )
    }

    fn expand_call(&self, call: ast::CallExpr) -> DesugarResult<ast::Expr> {
        let span = call.span;
        let mut args = call.args.into_iter();

        let target = args.next().ok_or_else(|| DesugarError::MissingAbstraction {
            span,
            entry: self.syntax.entry.clone(),
        })?;
        let block = args.next();

        for arg in [Some(&target), block.as_ref()].into_iter().flatten() {
            if arg.spread.is_some() {
                return Err(self.unexpected(arg.span(), "spread arguments are not allowed"));
            }
        }
        if let Some(extra) = args.next() {
            return Err(self.unexpected(extra.span(), "expected `(monad, block)`"));
        }

        let abstraction = MethodAbstraction::from_syntax(target.expr, self.syntax);
        expand_block(
            &abstraction,
            span,
            block.map(|arg| arg.expr),
            &self.capture,
            self.inject.as_deref(),
        )
    }

    fn unexpected(&self, span: Span, reason: &'static str) -> DesugarError {
        DesugarError::UnexpectedArgument {
            span,
            entry: self.syntax.entry.clone(),
            reason,
        }
    }
}

impl VisitMut for DoDesugarer<'_> {
    fn visit_mut_module(&mut self, module: &mut ast::Module) {
        self.inject = take_directive(&mut module.body, self.syntax);
        if let Some(alias) = &self.inject {
            debug!(alias = alias.as_str(), "unqualified return enabled");
        }
        module.visit_mut_children_with(self);
    }

    fn visit_mut_expr(&mut self, expr: &mut ast::Expr) {
        expr.visit_mut_children_with(self);

        let ast::Expr::Call(call) = expr else {
            return;
        };
        if !self.is_entry(call) {
            return;
        }

        // On error the hollowed call stays behind; the module is not returned
        // once any error is recorded.
        match self.expand_call(std::mem::take(call)) {
            Ok(expanded) => *expr = expanded,
            Err(err) => self.errors.push(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{assert_same_expr, assert_same_module, parse_expr, parse_module};
    use swc_common::DUMMY_SP;

    fn desugar(src: &str) -> Result<ast::Module, DesugarErrors> {
        let (module, arrows) = parse_module(src);
        desugar_module(module, &arrows, &DoSyntax::default())
    }

    fn error_of(src: &str) -> DesugarError {
        let mut errors = desugar(src).unwrap_err().0;
        assert_eq!(errors.len(), 1, "{errors:?}");
        errors.remove(0)
    }

    #[test]
    fn expands_list_comprehension() {
        let module = desugar(
            "const pairs = $do(List, () => {\n  x <- [2, 3];\n  y <- [2, 3];\n  List.return([x, y]);\n});\n",
        )
        .unwrap();
        assert_same_module(
            &module,
            "const pairs = List.bind([2, 3], (x) => List.bind([2, 3], (y) => List.return([x, y])));\n",
        );
    }

    #[test]
    fn comparison_with_spaced_minus_is_not_a_bind() {
        let module = desugar("const r = $do(M, () => {\n  x < -1;\n  M.return(x);\n});\n").unwrap();
        assert_same_module(&module, "const r = M.bind(x < -1, () => M.return(x));\n");
    }

    #[test]
    fn bind_takes_the_whole_right_hand_side() {
        let module = desugar(
            "const r = $do(M, () => {\n  a <- xs || ys;\n  b <- n + 1;\n  c <- ok ? f() : g();\n  M.return([a, b, c]);\n});\n",
        )
        .unwrap();
        assert_same_module(
            &module,
            "const r = M.bind(xs || ys, (a) => M.bind(n + 1, (b) => M.bind(ok ? f() : g(), (c) => M.return([a, b, c]))));\n",
        );
    }

    #[test]
    fn destructuring_binds() {
        let module = desugar(
            "const r = $do(M, () => {\n  [a, b] <- pair();\n  ({ c, d: e }) <- record();\n  M.return(a + b + c + e);\n});\n",
        )
        .unwrap();
        assert_same_module(
            &module,
            "const r = M.bind(pair(), ([a, b]) => M.bind(record(), ({ c, d: e }) => M.return(a + b + c + e)));\n",
        );
    }

    #[test]
    fn single_expression_block_passes_through() {
        let module = desugar("const r = $do(Maybe, Maybe.return(1));\n").unwrap();
        assert_same_module(&module, "const r = Maybe.return(1);\n");

        let module = desugar("const r = $do(Maybe, () => Maybe.return(1));\n").unwrap();
        assert_same_module(&module, "const r = Maybe.return(1);\n");
    }

    #[test]
    fn terminal_return_statement_is_its_value() {
        let module = desugar("const r = $do(M, () => {\n  x <- m;\n  return M.return(x);\n});\n").unwrap();
        assert_same_module(&module, "const r = M.bind(m, (x) => M.return(x));\n");
    }

    #[test]
    fn nested_blocks_expand_innermost_first() {
        let module = desugar(
            "const r = $do(Outer, () => {\n  x <- $do(Inner, () => {\n    y <- m;\n    Inner.return(y);\n  });\n  Outer.return(x);\n});\n",
        )
        .unwrap();
        assert_same_module(
            &module,
            "const r = Outer.bind(Inner.bind(m, (y) => Inner.return(y)), (x) => Outer.return(x));\n",
        );
    }

    #[test]
    fn injected_return_resolves_to_each_blocks_abstraction() {
        let module = desugar(
            "$inject_return();\nconst r = $do(Outer, () => {\n  x <- $do(Inner, () => {\n    y <- m;\n    pure(y);\n  });\n  pure(x);\n});\n",
        )
        .unwrap();
        assert_same_module(
            &module,
            "const r = Outer.bind(Inner.bind(m, (y) => Inner.return(y)), (x) => Outer.return(x));\n",
        );
    }

    #[test]
    fn alias_is_left_alone_without_directive() {
        let module = desugar("const r = $do(M, () => {\n  x <- m;\n  pure(x);\n});\n").unwrap();
        assert_same_module(&module, "const r = M.bind(m, (x) => pure(x));\n");
    }

    #[test]
    fn declarations_are_spliced() {
        let module = desugar(
            "const r = $do(M, () => {\n  x <- m;\n  const y = x * 2;\n  M.return(y);\n});\n",
        )
        .unwrap();
        assert_same_module(
            &module,
            "const r = M.bind(m, (x) => {\n  const y = x * 2;\n  return M.return(y);\n});\n",
        );
    }

    #[test]
    fn escape_keyword_object_declares_constants() {
        let module = desugar(
            "const r = $do(M, () => {\n  x <- m;\n  $let({ a: x + 1, b: 2 });\n  M.return(a * b);\n});\n",
        )
        .unwrap();
        assert_same_module(
            &module,
            "const r = M.bind(m, (x) => {\n  const a = x + 1;\n  const b = 2;\n  return M.return(a * b);\n});\n",
        );
    }

    #[test]
    fn missing_block_is_an_error() {
        assert!(matches!(
            error_of("const r = $do(M);\n"),
            DesugarError::MissingBlock { .. }
        ));
    }

    #[test]
    fn failed_inner_block_does_not_break_the_outer_one() {
        assert!(matches!(
            error_of("const r = $do(M, () => {\n  x <- $do(N);\n  M.return(x);\n});\n"),
            DesugarError::MissingBlock { .. }
        ));
    }

    #[test]
    fn missing_abstraction_is_an_error() {
        assert!(matches!(
            error_of("const r = $do();\n"),
            DesugarError::MissingAbstraction { .. }
        ));
    }

    #[test]
    fn empty_block_is_an_error() {
        assert!(matches!(
            error_of("const r = $do(M, () => {});\n"),
            DesugarError::EmptyBlock { .. }
        ));
    }

    #[test]
    fn extra_and_spread_arguments_are_errors() {
        assert!(matches!(
            error_of("const r = $do(M, () => m, 3);\n"),
            DesugarError::UnexpectedArgument { .. }
        ));
        assert!(matches!(
            error_of("const r = $do(...args);\n"),
            DesugarError::UnexpectedArgument { .. }
        ));
    }

    #[test]
    fn early_return_is_an_error() {
        assert!(matches!(
            error_of("const r = $do(M, () => {\n  return m;\n  M.return(1);\n});\n"),
            DesugarError::EarlyReturn { .. }
        ));
    }

    #[test]
    fn bad_patterns_and_escapes_are_errors() {
        assert!(matches!(
            error_of("const r = $do(M, () => {\n  f(x) <- m;\n  M.return(1);\n});\n"),
            DesugarError::InvalidBindPattern { .. }
        ));
        assert!(matches!(
            error_of("const r = $do(M, () => {\n  $let(...xs);\n  M.return(1);\n});\n"),
            DesugarError::InvalidEscape { .. }
        ));
        assert!(matches!(
            error_of("const r = $do(M, () => {\n  $let({ do: f(), other: 1 });\n  M.return(1);\n});\n"),
            DesugarError::InvalidEscape { .. }
        ));
    }

    #[test]
    fn every_error_in_a_module_is_reported() {
        let errors = desugar("const a = $do(M);\nconst b = $do();\n").unwrap_err().0;
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn expand_block_rejects_an_absent_block() {
        let syntax = DoSyntax::default();
        let arrows = BindArrows::default();
        let capture = Capture::new(&syntax, &arrows);
        let abstraction = MethodAbstraction::from_syntax(parse_expr("M"), &syntax);
        let err = expand_block(&abstraction, DUMMY_SP, None, &capture, None).unwrap_err();
        assert_eq!(err.to_string(), "`$do` call is missing its block argument");
    }

    #[test]
    fn expand_block_accepts_a_single_expression() {
        let syntax = DoSyntax::default();
        let arrows = BindArrows::default();
        let capture = Capture::new(&syntax, &arrows);
        let abstraction = MethodAbstraction::from_syntax(parse_expr("M"), &syntax);
        let expr =
            expand_block(&abstraction, DUMMY_SP, Some(parse_expr("M.return(x)")), &capture, None)
                .unwrap();
        assert_same_expr(&expr, "M.return(x)");
    }
}
