//! # Data Sweeper command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Initialise diagnostic logging (stderr + rolling file)
//!   ├─> Parse CLI arguments (clap)
//!   └─> Load, clean/check/replay, print the action log, export
//! ```
//!
//! ```bash
//! data-sweeper profile customers.csv
//! data-sweeper clean customers.csv --dedupe --fill age=median --trim name -o clean.xlsx
//! data-sweeper check --sample titanic --range age=0:120
//! data-sweeper run plan.json customers.csv -o clean.json
//! ```

#![expect(clippy::print_stdout, clippy::print_stderr)] // Command output goes to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    if let Err(e) = data_sweeper::logging::init() {
        eprintln!("Warning: logging unavailable: {e:#}");
    }

    cli::run_command(cli)
}
