//! Stable progress output for scripted consumption.
//!
//! These lines are part of the CLI contract, not logging: they go to stdout
//! with fixed wording and column layout. Diagnostics go through `tracing` on
//! stderr so scripts parsing stdout never see them interleaved.

use crate::hash::algorithm::encode_digest;
use crate::types::HashAlgorithm;

/// Label column width; entry columns start right after.
const LABEL_WIDTH: usize = 30;

/// Per-seal progress reporter. Error lines, root digests and the
/// generation-created line always print; per-entry lines only when verbose.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    verbose: bool,
}

impl ProgressReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// A file hashed for the first time ever.
    pub fn original_hash(&self, path: &str, algorithm: HashAlgorithm, digest: &[u8]) {
        if self.verbose {
            println!(
                "{:<LABEL_WIDTH$}{}  {}: {}",
                "created original hash for",
                path,
                algorithm,
                encode_digest(algorithm, digest)
            );
        }
    }

    /// All prior hashes for a file matched.
    pub fn verified(&self, path: &str) {
        if self.verbose {
            println!("{:<LABEL_WIDTH$}{}  OK", "verified", path);
        }
    }

    /// A hash in a new algorithm added to an already verified file.
    pub fn new_hash(&self, path: &str, algorithm: HashAlgorithm, digest: &[u8]) {
        if self.verbose {
            println!(
                "{:<LABEL_WIDTH$}{}  {}: {}",
                "created new hash for",
                path,
                algorithm,
                encode_digest(algorithm, digest)
            );
        }
    }

    /// A recorded hash no longer matches the bytes on disk.
    pub fn mismatch(&self, path: &str, algorithm: HashAlgorithm, old: &[u8], new: &[u8]) {
        println!(
            "{:<LABEL_WIDTH$}{}  {} (old): {}, {} (new): {}",
            "ERROR: hash mismatch for",
            path,
            algorithm,
            encode_digest(algorithm, old),
            algorithm,
            encode_digest(algorithm, new)
        );
    }

    pub fn directory_hash(
        &self,
        path: &str,
        algorithm: HashAlgorithm,
        content: &[u8],
        structure: &[u8],
    ) {
        if self.verbose {
            println!(
                "{:<LABEL_WIDTH$}{}  {}: {} (content), {} (structure)",
                "calculated directory hash for",
                path,
                algorithm,
                encode_digest(algorithm, content),
                encode_digest(algorithm, structure)
            );
        }
    }

    pub fn root_hash(&self, algorithm: HashAlgorithm, content: &[u8], structure: &[u8]) {
        println!(
            "{:<LABEL_WIDTH$}{}: {} (content), {} (structure)",
            "calculated root hash",
            algorithm,
            encode_digest(algorithm, content),
            encode_digest(algorithm, structure)
        );
    }

    /// Paths recorded in history but absent from disk.
    pub fn missing_files(&self, paths: &[String]) {
        if paths.is_empty() {
            return;
        }
        println!("ERROR: {} missing file(s):", paths.len());
        for path in paths {
            println!("  {}", path);
        }
    }

    /// A file on disk that no generation has recorded (verify/diff only).
    pub fn new_file_found(&self, path: &str) {
        println!("found new file {}", path);
    }

    pub fn generation_created(&self, manifest_rel_path: &str) {
        println!("Created new generation {}", manifest_rel_path);
    }
}
