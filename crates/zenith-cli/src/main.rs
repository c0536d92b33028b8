//! `zenith` binary: parse a Zenith source file and print its syntax tree.

use std::process;

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use zenith_cli::{Args, error_adapter::render_reports};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    let log_level = init_logger(&args.log_level);
    info!(log_level:?; "Starting Zenith");
    debug!(args:?; "Parsed arguments");

    let Err(err) = zenith_cli::run(&args) else {
        info!("Completed successfully");
        return;
    };

    match render_reports(&err) {
        Ok(reports) => reports.iter().for_each(|report| error!("{report}")),
        Err(_) => error!("{err}"),
    }
    process::exit(1);
}

/// Send logs to stderr at `level`; unknown names fall back to `warn`.
fn init_logger(level: &str) -> LevelFilter {
    let log_level = level.parse().unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    log_level
}
