//! Command-line front end.
//!
//! Settings are resolved in this order, first match wins:
//! 1. Command-line flags
//! 2. Environment (`VMEMH_WIDTH`, `VMEMH_STEP`, `VMEMH_BACKDOOR`)
//! 3. Parameter file given with `--config` (`VMEMH_CONFIG`)
//! 4. Built-in defaults

mod error;
mod execute;
mod ini;
mod io;
mod types;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub use types::Args;

pub fn run() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = args.execute() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
