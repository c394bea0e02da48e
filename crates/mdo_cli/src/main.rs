use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdo_ast::DoSyntax;
use mdo_desugar::{desugar_module, DesugarError};
use mdo_parser::{parse_mdo, ParseResult};
use swc_common::{
    comments::SingleThreadedComments, source_map::DefaultSourceMapGenConfig, sync::Lrc, SourceMap,
};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter, Node};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdo", about = "mdo: do-notation for TypeScript")]
struct Cli {
    /// TOML file overriding the surface keywords.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand every do block and emit standard TypeScript.
    Expand {
        /// Input .ts/.tsx file.
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Generate a source map.
        #[arg(long)]
        source_map: bool,
    },
    /// Parse and expand the file, reporting errors without emitting.
    Check { input: PathBuf },
    /// Parse and dump the AST.
    Parse {
        input: PathBuf,
        /// Dump as JSON instead of debug format.
        #[arg(long)]
        ast: bool,
    },
    /// Print the effective configuration.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let syntax = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Expand {
            input,
            output,
            source_map,
        } => {
            let filename = input.display().to_string();
            let expanded = expand_file(&input, &syntax)?;
            let cm = expanded.source_map.clone();

            let mut buf = Vec::new();
            let mut srcmap_buf = if source_map { Some(vec![]) } else { None };
            {
                let writer = JsWriter::new(cm.clone(), "\n", &mut buf, srcmap_buf.as_mut());
                let mut emitter = Emitter {
                    cfg: swc_ecma_codegen::Config::default()
                        .with_target(swc_ecma_ast::EsVersion::latest()),
                    cm: cm.clone(),
                    comments: Some(&expanded.comments),
                    wr: writer,
                };
                expanded.module.emit_with(&mut emitter)?;
            }

            let output_str = String::from_utf8(buf)?;

            match &output {
                Some(path) => std::fs::write(path, &output_str)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{output_str}"),
            }

            if let Some(srcmap_data) = srcmap_buf {
                let srcmap = cm.build_source_map(&srcmap_data, None, DefaultSourceMapGenConfig);
                let mut srcmap_json = vec![];
                srcmap
                    .to_writer(&mut srcmap_json)
                    .context("failed to serialize source map")?;

                let map_path = match &output {
                    Some(path) => format!("{}.map", path.display()),
                    None => format!("{filename}.map"),
                };
                std::fs::write(&map_path, srcmap_json)?;
                info!("source map written to {map_path}");
            }
        }
        Commands::Check { input } => {
            expand_file(&input, &syntax)?;
            eprintln!("OK: {}", input.display());
        }
        Commands::Parse { input, ast } => {
            let parsed = parse_file(&input)?;
            debug!(arrows = parsed.bind_arrows.len(), "bind arrows found");

            if ast {
                let json = serde_json::to_string_pretty(&parsed.module)?;
                println!("{json}");
            } else {
                println!("{:#?}", parsed.module);
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&syntax)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DoSyntax> {
    let Some(path) = path else {
        return Ok(DoSyntax::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let syntax = toml::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(config = %path.display(), "loaded configuration");
    Ok(syntax)
}

fn parse_file(input: &Path) -> Result<ParseResult> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    parse_mdo(&source, &input.display().to_string())
}

/// A desugared file with what codegen needs from its parse.
struct Expanded {
    module: swc_ecma_ast::Module,
    comments: SingleThreadedComments,
    source_map: Lrc<SourceMap>,
}

/// Parse and desugar `input`, printing each expansion error with its location.
fn expand_file(input: &Path, syntax: &DoSyntax) -> Result<Expanded> {
    let ParseResult {
        module,
        comments,
        source_map,
        bind_arrows,
    } = parse_file(input)?;

    match desugar_module(module, &bind_arrows, syntax) {
        Ok(module) => Ok(Expanded {
            module,
            comments,
            source_map,
        }),
        Err(errors) => {
            for err in &errors.0 {
                report(&source_map, err);
            }
            Err(errors).with_context(|| format!("failed to expand {}", input.display()))
        }
    }
}

fn report(cm: &SourceMap, err: &DesugarError) {
    let span = err.span();
    if span.is_dummy() {
        eprintln!("error: {err}");
        return;
    }
    let loc = cm.lookup_char_pos(span.lo);
    eprintln!("{}:{}:{}: error: {err}", loc.file.name, loc.line, loc.col.0 + 1);
}
