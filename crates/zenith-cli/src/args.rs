//! Command-line argument definitions for the Zenith CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, output format, and logging verbosity.

use clap::Parser;

use zenith::config::OutputFormat;

/// Command-line arguments for the Zenith parser tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input Zenith file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output file; printed to stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format (sexp, tree, tokens); overrides the configuration file
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Print node and token positions
    #[arg(long)]
    pub positions: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
