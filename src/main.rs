//! Olvidar CLI
//!
//! # Usage
//!
//! ```bash
//! # Validate a config
//! olvidar validate unlearn.yaml --detailed
//!
//! # Print the sparsity schedule
//! olvidar schedule unlearn.yaml --points 21
//!
//! # Run a synthetic unlearning simulation and keep the engine state
//! olvidar simulate unlearn.yaml --checkpoint engine.json
//! ```

use clap::Parser;
use olvidar::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.quiet, cli.verbose));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
