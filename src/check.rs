//! Read-only history checks: verify, diff, info.
//!
//! These audit a sealed tree against its recorded history without writing a
//! new generation. `verify` re-hashes every file; `diff` compares by presence
//! only; `info` prints the per-generation record of individual files.

use crate::error::SealError;
use crate::hash::engine;
use crate::history::HistoryIndex;
use crate::progress::ProgressReporter;
use crate::store::ManifestStore;
use crate::tree::path::{canonicalize_root, is_under, normalize_rel_path};
use crate::tree::walker::{Walker, WalkerConfig};
use std::path::Path;
use tracing::debug;

/// Options shared by the read-only checks.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub ignore_patterns: Vec<String>,
}

/// Aggregate result of a verify or diff run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckReport {
    pub new_files: usize,
    pub mismatches: usize,
    pub missing: usize,
}

impl CheckReport {
    /// Clean means the tree matches its history exactly.
    pub fn is_clean(&self) -> bool {
        self.new_files == 0 && self.mismatches == 0 && self.missing == 0
    }

    fn absorb(&mut self, other: CheckReport) {
        self.new_files += other.new_files;
        self.mismatches += other.mismatches;
        self.missing += other.missing;
    }
}

/// Re-hash every file against all recorded hashes. Nested sealed roots are
/// verified against their own histories first.
pub fn verify_tree(
    root: &Path,
    options: &CheckOptions,
    reporter: &ProgressReporter,
) -> Result<CheckReport, SealError> {
    check_tree(root, options, reporter, true)
}

/// Compare the tree against history by presence only; no hashing.
pub fn diff_tree(
    root: &Path,
    options: &CheckOptions,
    reporter: &ProgressReporter,
) -> Result<CheckReport, SealError> {
    check_tree(root, options, reporter, false)
}

fn check_tree(
    root: &Path,
    options: &CheckOptions,
    reporter: &ProgressReporter,
    hash_contents: bool,
) -> Result<CheckReport, SealError> {
    if !root.exists() {
        return Err(SealError::Config(format!(
            "path {} does not exist",
            root.display()
        )));
    }
    let root = canonicalize_root(root)?;
    if !ManifestStore::is_sealed_root(&root) {
        return Err(SealError::Config(format!(
            "no sealed history at {}",
            root.display()
        )));
    }

    let mut report = CheckReport::default();
    check_root(&root, options, reporter, hash_contents, &mut report)?;
    Ok(report)
}

fn check_root(
    root: &Path,
    options: &CheckOptions,
    reporter: &ProgressReporter,
    hash_contents: bool,
    report: &mut CheckReport,
) -> Result<(), SealError> {
    let nested = ManifestStore::locate_nested_roots(root)?;
    for child in &nested {
        check_root(child, options, reporter, hash_contents, report)?;
    }

    let store = ManifestStore::open(root)?;
    let index = HistoryIndex::build(&store.load_all()?)?;
    debug!(root = %root.display(), known = index.all_known_paths().len(), "checking");

    let tree = Walker::new(
        root.to_path_buf(),
        nested,
        WalkerConfig {
            ignore_patterns: options.ignore_patterns.clone(),
        },
    )
    .walk()?;

    let mut local = CheckReport::default();
    for file in &tree.files {
        let known = index.known_hashes(&file.rel_path);
        if known.is_empty() {
            reporter.new_file_found(&file.rel_path);
            local.new_files += 1;
            continue;
        }
        if !hash_contents {
            continue;
        }

        let algorithms: Vec<_> = known.keys().copied().collect();
        let observed = engine::hash_file(&file.abs_path, &algorithms)?;
        let mut matched = true;
        for (algo, prior) in &known {
            if observed.get(algo) != Some(prior) {
                reporter.mismatch(&file.rel_path, *algo, prior, &observed[algo]);
                matched = false;
            }
        }
        if matched {
            reporter.verified(&file.rel_path);
        } else {
            local.mismatches += 1;
        }
    }

    let missing: Vec<String> = index
        .all_known_paths()
        .into_iter()
        .filter(|path| !tree.files.iter().any(|f| &f.rel_path == path))
        .filter(|path| !tree.nested_roots.iter().any(|(rel, _)| is_under(path, rel)))
        .collect();
    reporter.missing_files(&missing);
    local.missing = missing.len();

    report.absorb(local);
    Ok(())
}

/// Render the per-generation hash record of the given files, each path given
/// relative to the sealed root or absolute beneath it.
pub fn file_info(root: &Path, files: &[&Path]) -> Result<String, SealError> {
    let root = canonicalize_root(root)?;
    if !ManifestStore::is_sealed_root(&root) {
        return Err(SealError::Config(format!(
            "no sealed history at {}",
            root.display()
        )));
    }
    let store = ManifestStore::open(&root)?;
    let generations = store.load_all()?;

    let mut out = String::new();
    for file in files {
        let rel = if file.is_absolute() {
            let abs = canonicalize_root(file)?;
            let stripped = abs.strip_prefix(&root).map_err(|_| {
                SealError::Config(format!(
                    "{} is not inside sealed root {}",
                    file.display(),
                    root.display()
                ))
            })?;
            normalize_rel_path(stripped)?
        } else {
            normalize_rel_path(file)?
        };

        out.push_str(&format!("{}:\n", rel));
        for generation in &generations {
            for entry in generation.files.iter().filter(|f| f.path == rel) {
                for (algo, value) in &entry.hashes {
                    out.push_str(&format!(
                        "  generation {} ({}) {}: {} ({})\n",
                        generation.generation,
                        generation.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        algo,
                        value,
                        entry.outcome
                    ));
                }
                if entry.hashes.is_empty() {
                    out.push_str(&format!(
                        "  generation {} ({}) ({})\n",
                        generation.generation,
                        generation.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        entry.outcome
                    ));
                }
            }
        }
    }
    Ok(out)
}
