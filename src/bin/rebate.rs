//! Rebate CLI

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use rebate::{
    cli::{self, CliArgs},
    observability,
};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(err) = observability::init_logging(&args.logging) {
        _ = writeln!(io::stderr().lock(), "warning: {err}");
    }

    match cli::run(&args, io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "calculation failed");

            _ = writeln!(io::stderr().lock(), "error: {err}");

            ExitCode::FAILURE
        }
    }
}
