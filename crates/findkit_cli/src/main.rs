//! findkit - locate, transfer or archive files in a directory tree
//!
//! Entry point for the CLI application.

mod cli;
mod dispatch;

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::CliArgs;
use crate::dispatch::dispatch;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = CliArgs::parse();
    setup_logging(args.verbose)?;

    let spec_find_options = args.to_find_options();
    let mut out = io::stdout().lock();
    let mut err = io::stderr();
    dispatch(
        &args.args,
        spec_find_options,
        args.summary,
        &mut out,
        &mut err,
    )
}

fn setup_logging(verbose: bool) -> Result<()> {
    // FINDKIT_LOG takes precedence over --verbose.
    let filter = EnvFilter::try_from_env("FINDKIT_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("findkit=debug,findkit_io_fs=debug,warn")
        } else {
            EnvFilter::new("findkit=info,findkit_io_fs=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow!(e))?;

    Ok(())
}
