//! CLI surface: clap definitions, command routing, exit-code mapping.

use crate::check::{self, CheckOptions};
use crate::config::Config;
use crate::error::SealError;
use crate::progress::ProgressReporter;
use crate::seal::{SealOptions, SealOrchestrator};
use crate::types::HashAlgorithm;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Exit code for verification failures (mismatch or missing).
pub const EXIT_VERIFICATION_FAILED: i32 = 1;
/// Exit code for structural failures (I/O, corrupt history, configuration).
pub const EXIT_STRUCTURAL_FAILURE: i32 = 2;

/// Seal directory trees with chained cryptographic manifests.
#[derive(Parser)]
#[command(name = "treeseal")]
#[command(about = "Seal directory trees with chained cryptographic manifests", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides the sibling treeseal.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level for diagnostics on stderr (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new generation: verify against all prior hashes and seal
    #[command(disable_help_flag = true)]
    Create {
        /// Emit per-entry progress lines
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Primary algorithm for new hashes this seal
        #[arg(short = 'h', long = "hash", value_name = "algorithm")]
        hash: Option<String>,

        /// Directory to seal
        path: PathBuf,

        #[arg(long, action = ArgAction::HelpLong)]
        help: Option<bool>,
    },
    /// Re-hash a tree against its recorded history without sealing
    Verify {
        /// Emit per-entry progress lines
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Sealed directory to check
        path: PathBuf,
    },
    /// Compare a tree against its history by presence only (no hashing)
    Diff {
        /// Emit per-entry progress lines
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Sealed directory to check
        path: PathBuf,
    },
    /// Print the per-generation hash record of individual files
    Info {
        /// Sealed root holding the history
        path: PathBuf,

        /// Files to look up, relative to the root or absolute beneath it
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Execute a parsed CLI invocation and map the result to an exit code.
pub fn run(cli: Cli) -> i32 {
    match execute(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            exit_code_for(&e)
        }
    }
}

fn execute(cli: Cli) -> Result<(), SealError> {
    match cli.command {
        Commands::Create {
            verbose,
            hash,
            path,
            help: _,
        } => {
            let config = Config::load(&path, cli.config.as_deref())?;
            let algorithm: HashAlgorithm = match hash {
                Some(value) => value.parse()?,
                None => config.algorithm()?,
            };

            let reporter = ProgressReporter::new(verbose);
            let options = SealOptions {
                algorithm,
                ignore_patterns: config.ignore_patterns,
                pool_size: config.hash_pool_size,
                ..Default::default()
            };
            let report = SealOrchestrator::new(options, &reporter).seal(&path)?;
            if !report.is_success() {
                return Err(SealError::VerificationFailed {
                    mismatches: report.mismatches(),
                    missing: report.missing(),
                });
            }
            Ok(())
        }
        Commands::Verify { verbose, path } => {
            let config = Config::load(&path, cli.config.as_deref())?;
            let reporter = ProgressReporter::new(verbose);
            let options = CheckOptions {
                ignore_patterns: config.ignore_patterns,
            };
            let report = check::verify_tree(&path, &options, &reporter)?;
            if !report.is_clean() {
                return Err(SealError::VerificationFailed {
                    mismatches: report.mismatches + report.new_files,
                    missing: report.missing,
                });
            }
            Ok(())
        }
        Commands::Diff { verbose, path } => {
            let config = Config::load(&path, cli.config.as_deref())?;
            let reporter = ProgressReporter::new(verbose);
            let options = CheckOptions {
                ignore_patterns: config.ignore_patterns,
            };
            let report = check::diff_tree(&path, &options, &reporter)?;
            if !report.is_clean() {
                return Err(SealError::VerificationFailed {
                    mismatches: report.mismatches + report.new_files,
                    missing: report.missing,
                });
            }
            Ok(())
        }
        Commands::Info { path, files } => {
            let refs: Vec<&std::path::Path> = files.iter().map(PathBuf::as_path).collect();
            let info = check::file_info(&path, &refs)?;
            print!("{}", info);
            Ok(())
        }
    }
}

/// Verification failures and structural failures exit distinctly.
pub fn exit_code_for(error: &SealError) -> i32 {
    match error {
        SealError::VerificationFailed { .. } => EXIT_VERIFICATION_FAILED,
        _ => EXIT_STRUCTURAL_FAILURE,
    }
}
