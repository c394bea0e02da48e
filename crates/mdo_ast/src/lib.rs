//! ECMAScript/TypeScript AST for mdo.
//!
//! Re-exports the standard SWC AST and adds the nodes the do-block
//! transform works on:
//! - [`DoStmt`]: one captured statement of a `$do` block
//! - [`BindArrows`]: source positions of `<-` bind arrows
//! - [`DoSyntax`]: the configurable surface names

pub use swc_ecma_ast::*;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use swc_common::{BytePos, Span};

/// A statement of a do block, classified by the capture layer.
///
/// `source` is the statement as written. It is emitted unchanged when the
/// statement ends up in terminal position, whatever its `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct DoStmt {
    pub span: Span,
    pub kind: DoStmtKind,
    pub source: Stmt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DoStmtKind {
    /// `$let(x = 1, f())`: host statements spliced verbatim.
    EscapeInline(Vec<Stmt>),
    /// `$let({ do: ... })` or `$let: { ... }`: only the body's statements are spliced.
    EscapeBlock(BlockStmt),
    /// `pat <- expr`
    Bind { pat: Pat, expr: Box<Expr> },
    /// Any other expression; its result is sequenced and discarded.
    Plain(Box<Expr>),
    /// The last statement of the block.
    Terminal,
}

impl DoStmt {
    pub fn new(span: Span, kind: DoStmtKind, source: Stmt) -> Self {
        Self { span, kind, source }
    }

    /// A terminal statement. Terminality is positional, so no shape is inspected.
    pub fn terminal(source: Stmt) -> Self {
        use swc_common::Spanned;

        Self {
            span: source.span(),
            kind: DoStmtKind::Terminal,
            source,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, DoStmtKind::Terminal)
    }
}

/// Positions of the `-` in every adjacent `<-` pair found in code.
///
/// `x <- m` parses as `x < (-m)`; the capture layer only reads such a
/// comparison as a bind when its unary minus starts at one of these positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindArrows {
    positions: BTreeSet<BytePos>,
}

impl BindArrows {
    pub fn new(positions: impl IntoIterator<Item = BytePos>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
        }
    }

    pub fn contains(&self, minus: BytePos) -> bool {
        self.positions.contains(&minus)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Surface names recognised by the transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoSyntax {
    /// Callee that opens a do block: `$do(M, () => { ... })`.
    pub entry: String,
    /// Escape-hatch callee and label: `$let(x = 1)`, `$let: { ... }`.
    pub escape: String,
    /// Reserved key of the block escape form: `$let({ do: ... })`.
    pub escape_body_key: String,
    /// Method invoked on the abstraction to sequence.
    pub bind_method: String,
    /// Method invoked on the abstraction to lift a value.
    pub return_method: String,
    /// Module-level directive enabling the unqualified return alias.
    pub inject_directive: String,
    /// Alias injected by the directive when it is given no argument.
    pub return_alias: String,
}

impl Default for DoSyntax {
    fn default() -> Self {
        Self {
            entry: "$do".to_string(),
            escape: "$let".to_string(),
            escape_body_key: "do".to_string(),
            bind_method: "bind".to_string(),
            return_method: "return".to_string(),
            inject_directive: "$inject_return".to_string(),
            return_alias: "pure".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_arrows_lookup() {
        let arrows = BindArrows::new([BytePos(12), BytePos(4), BytePos(12)]);
        assert_eq!(arrows.len(), 2);
        assert!(arrows.contains(BytePos(4)));
        assert!(!arrows.contains(BytePos(5)));
    }

    #[test]
    fn default_syntax_names() {
        let syntax = DoSyntax::default();
        assert_eq!(syntax.entry, "$do");
        assert_eq!(syntax.escape, "$let");
        assert_eq!(syntax.bind_method, "bind");
        assert_eq!(syntax.return_method, "return");
    }
}
