//! Shared helpers for the mdo golden-file and monad-law tests.
//!
//! - [`run_pipeline`]: parse → desugar → codegen, as the CLI does
//! - [`reparse_emitted`]: run the pipeline and parse its output again
//! - [`same_program`]: compare two TypeScript sources structurally
//! - [`eval`]: a small interpreter for the desugared output

pub mod eval;

use anyhow::Result;
use mdo_ast::DoSyntax;
use mdo_desugar::desugar_module;
use mdo_parser::parse_mdo;
use swc_common::{sync::Lrc, EqIgnoreSpan, SourceMap};
use swc_ecma_ast as ast;
use swc_ecma_codegen::{text_writer::JsWriter, Emitter, Node};
use swc_ecma_visit::{Visit, VisitMut, VisitMutWith, VisitWith};

/// Parse and desugar `source` with the default syntax.
pub fn desugar_source(source: &str, filename: &str) -> Result<ast::Module> {
    let parsed = parse_mdo(source, filename)?;
    let module = desugar_module(parsed.module, &parsed.bind_arrows, &DoSyntax::default())?;
    Ok(module)
}

/// Parse, desugar and emit `source` as plain TypeScript.
pub fn run_pipeline(source: &str, filename: &str) -> Result<String> {
    let parsed = parse_mdo(source, filename)?;
    let module = desugar_module(parsed.module, &parsed.bind_arrows, &DoSyntax::default())?;
    emit_module(&module, parsed.source_map)
}

/// Run the pipeline on `source` and parse the emitted text, keeping every
/// parenthesis the emitter wrote.
pub fn reparse_emitted(source: &str, filename: &str) -> Result<ast::Module> {
    let emitted = run_pipeline(source, filename)?;
    Ok(parse_mdo(&emitted, filename)?.module)
}

pub fn emit_module(module: &ast::Module, source_map: Lrc<SourceMap>) -> Result<String> {
    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(source_map.clone(), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config::default().with_target(ast::EsVersion::latest()),
            cm: source_map,
            comments: None,
            wr: writer,
        };
        module.emit_with(&mut emitter)?;
    }

    Ok(String::from_utf8(buf)?)
}

/// Whether two sources parse to the same module, ignoring spans, layout and
/// redundant parentheses.
pub fn same_program(actual: &str, expected: &str) -> Result<bool> {
    let mut actual = parse_mdo(actual, "actual.ts")?.module;
    let mut expected = parse_mdo(expected, "expected.ts")?.module;
    actual.visit_mut_with(&mut StripParens);
    expected.visit_mut_with(&mut StripParens);
    Ok(actual.body.eq_ignore_span(&expected.body))
}

/// Whether `module` still mentions the identifier `name`.
pub fn mentions_identifier(module: &ast::Module, name: &str) -> bool {
    let mut finder = IdentFinder { name, found: false };
    module.visit_with(&mut finder);
    finder.found
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

struct IdentFinder<'a> {
    name: &'a str,
    found: bool,
}

impl Visit for IdentFinder<'_> {
    fn visit_ident(&mut self, ident: &ast::Ident) {
        if &*ident.sym == self.name {
            self.found = true;
        }
    }
}
