//! Zenith CLI library
//!
//! This module contains the core CLI logic for the Zenith parser tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
};

use log::{info, warn};

use zenith::{SyntaxBuilder, SyntaxTree, ZenithError, config::OutputFormat};

use error_adapter::{DiagnosticAdapter, Reportable};

/// Run the Zenith CLI application
///
/// This function parses the input file and writes the rendered syntax tree
/// to the output file, or to stdout when no output file is given.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `ZenithError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Lexing, parsing and validation errors
pub fn run(args: &Args) -> Result<(), ZenithError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing source"
    );

    // Load configuration, then apply command-line overrides
    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(format) = args.format {
        app_config.output_mut().set_format(format);
    }
    if args.positions {
        app_config.output_mut().set_positions(true);
    }

    let source = fs::read_to_string(&args.input)?;

    let builder = SyntaxBuilder::new(app_config);
    let rendered = match builder.config().output().format() {
        OutputFormat::Tokens => builder.render_tokens(&source)?,
        OutputFormat::Sexp | OutputFormat::Tree => {
            let tree = builder.parse(&source)?;
            report_warnings(&tree);
            builder.render(&tree)?
        }
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!(output_file = path; "Output written successfully");
        }
        None => io::stdout().write_all(rendered.as_bytes())?,
    }

    Ok(())
}

/// Render validation warnings of a successful parse to the log.
fn report_warnings(tree: &SyntaxTree<'_>) {
    let reporter = miette::GraphicalReportHandler::new();

    for warning in tree.warnings() {
        let reportable = Reportable::Diagnostic(DiagnosticAdapter::new(warning, tree.source()));
        let mut writer = String::new();
        if reporter.render_report(&mut writer, &reportable).is_ok() {
            warn!("{writer}");
        }
    }
}
