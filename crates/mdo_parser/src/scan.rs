//! Bind-arrow detection.
//!
//! Every `x <- m` reaches the parser as `x < (-m)`. Walking the parsed module
//! visits only real unary minus nodes, so comments, strings, regex literals,
//! template text and JSX text never produce arrows. A unary minus is an arrow
//! when the source byte right before it is `<`.

use mdo_ast::BindArrows;
use swc_common::BytePos;
use swc_ecma_ast as ast;
use swc_ecma_visit::{Visit, VisitWith};

/// Find every bind arrow in `module`, parsed from `source`, a file that
/// starts at `start_pos` in its source map.
pub fn find_bind_arrows(module: &ast::Module, source: &str, start_pos: BytePos) -> BindArrows {
    let mut finder = ArrowFinder {
        source: source.as_bytes(),
        start_pos,
        positions: Vec::new(),
    };
    module.visit_with(&mut finder);
    BindArrows::new(finder.positions)
}

struct ArrowFinder<'a> {
    source: &'a [u8],
    start_pos: BytePos,
    positions: Vec<BytePos>,
}

impl ArrowFinder<'_> {
    fn follows_lt(&self, pos: BytePos) -> bool {
        let Some(offset) = pos.0.checked_sub(self.start_pos.0) else {
            return false;
        };
        let offset = offset as usize;
        offset > 0 && self.source.get(offset - 1) == Some(&b'<')
    }
}

impl Visit for ArrowFinder<'_> {
    fn visit_unary_expr(&mut self, unary: &ast::UnaryExpr) {
        if unary.op == ast::UnaryOp::Minus && self.follows_lt(unary.span.lo) {
            self.positions.push(unary.span.lo);
        }
        unary.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_mdo;
    use swc_ecma_ast as ast;

    fn arrow_count(source: &str, filename: &str) -> usize {
        parse_mdo(source, filename).unwrap().bind_arrows.len()
    }

    #[test]
    fn finds_adjacent_arrows_only() {
        assert_eq!(arrow_count("x <- m; y < -n; z<-k;", "a.ts"), 2);
    }

    #[test]
    fn ignores_comments_and_strings() {
        assert_eq!(
            arrow_count("// a <- b\nconst s = ['c <- d', \"e<-f\"]; /* g <- h */", "a.ts"),
            0
        );
    }

    #[test]
    fn scans_template_interpolations() {
        assert_eq!(arrow_count("const t = `a <- ${ x <- y } <-`;", "a.ts"), 1);
    }

    #[test]
    fn quotes_in_regex_literals_do_not_hide_later_arrows() {
        let src = "const clean = (s) => s.replace(/'/g, \"\");\nconst r = $do(List, () => {\n  x <- [1, 2];\n  List.return(x);\n});\n";
        assert_eq!(arrow_count(src, "a.ts"), 1);
    }

    #[test]
    fn jsx_text_is_skipped_but_containers_are_scanned() {
        let src = "const v = <p>x - y {a <- b}</p>;\nx <- m;\n";
        assert_eq!(arrow_count(src, "view.tsx"), 2);
    }

    #[test]
    fn positions_are_in_source_map_space() {
        let src = "'é'; x <- m;";
        let parsed = parse_mdo(src, "a.ts").unwrap();
        let ast::ModuleItem::Stmt(ast::Stmt::Expr(stmt)) = &parsed.module.body[1] else {
            panic!("expected an expression statement");
        };
        let ast::Expr::Bin(bin) = &*stmt.expr else {
            panic!("expected a comparison");
        };
        let ast::Expr::Unary(minus) = &*bin.right else {
            panic!("expected a unary minus");
        };
        assert!(parsed.bind_arrows.contains(minus.span.lo));
    }
}
