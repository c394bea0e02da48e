use anyhow::Result;
use mdo_ast::BindArrows;
use swc_common::{
    comments::SingleThreadedComments, errors::Handler, sync::Lrc, FileName, SourceMap,
};
use swc_ecma_ast::EsVersion;
use swc_ecma_parser::{Syntax, TsSyntax};
use tracing::debug;

use crate::scan;

/// Result of parsing an mdo source file.
pub struct ParseResult {
    pub module: swc_ecma_ast::Module,
    pub comments: SingleThreadedComments,
    pub source_map: Lrc<SourceMap>,
    /// Bind arrows found in the source, in source-map positions.
    pub bind_arrows: BindArrows,
}

/// Parse a TypeScript/TSX source string that may contain `$do` blocks.
///
/// 1. Parse: feed the source to the standard SWC parser.
/// 2. Scan: record which unary minus nodes are the `-` of a `<-` bind arrow.
pub fn parse_mdo(source: &str, filename: &str) -> Result<ParseResult> {
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );

    let comments = SingleThreadedComments::default();

    let handler = Handler::with_emitter_writer(Box::new(std::io::stderr()), Some(source_map.clone()));

    let is_tsx = filename.ends_with(".tsx");
    let ts_syntax = Syntax::Typescript(TsSyntax {
        tsx: is_tsx,
        decorators: true,
        ..Default::default()
    });

    let module = swc_ecma_parser::parse_file_as_module(
        &source_file,
        ts_syntax,
        EsVersion::latest(),
        Some(&comments),
        &mut vec![],
    )
    .map_err(|e| {
        e.into_diagnostic(&handler).emit();
        anyhow::anyhow!("failed to parse {filename}")
    })?;

    let bind_arrows = scan::find_bind_arrows(&module, source, source_file.start_pos);
    debug!(file = filename, arrows = bind_arrows.len(), "parsed module");

    Ok(ParseResult {
        module,
        comments,
        source_map,
        bind_arrows,
    })
}
