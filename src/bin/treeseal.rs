//! treeseal CLI binary.

use clap::Parser;
use std::process;
use treeseal::cli::{self, Cli};
use treeseal::logging::init_logging;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(cli::EXIT_STRUCTURAL_FAILURE);
    }

    process::exit(cli::run(cli));
}
