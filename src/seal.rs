//! The seal orchestrator.
//!
//! A seal verifies every file against all prior recorded hashes, hashes new
//! files, composes directory digests up the tree, and appends one immutable
//! generation per sealed root touched. Nested sealed roots are sealed first,
//! depth-first; the parent absorbs each child's fresh root digests by
//! reference instead of re-hashing its files.

use crate::error::SealError;
use crate::hash::algorithm::encode_digest;
use crate::hash::dirdigest::{directory_digests, ChildDigest};
use crate::hash::engine;
use crate::history::HistoryIndex;
use crate::progress::ProgressReporter;
use crate::store::{
    ChildHistoryRef, DirectoryEntry, FileEntry, Generation, ManifestStore, UnsupportedNote,
};
use crate::tree::path::{canonicalize_root, is_under, join_rel, ROOT_PATH};
use crate::tree::walker::{ChildKind, FileRecord, Walker, WalkerConfig};
use crate::types::{EntryKind, HashAlgorithm, VerificationOutcome};
use crate::verify::{algorithms_to_hash, judge_file, FileVerdict};
use chrono::Utc;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Options for one seal operation.
#[derive(Debug, Clone)]
pub struct SealOptions {
    /// Primary algorithm for new hashes this seal.
    pub algorithm: HashAlgorithm,
    /// Extra entry names to ignore, on top of the fixed platform list.
    pub ignore_patterns: Vec<String>,
    /// Bounded size of the hashing pool. `None` uses the global pool.
    pub pool_size: Option<usize>,
    /// Hold the advisory store lock for the duration of each root's seal.
    pub use_lock: bool,
    /// Cooperative cancellation signal, polled between files and roots.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Xxh64,
            ignore_patterns: Vec::new(),
            pool_size: None,
            use_lock: true,
            cancel: None,
        }
    }
}

/// Result of sealing one root (nested or top-level).
#[derive(Debug, Clone)]
pub struct RootSealOutcome {
    pub root: PathBuf,
    pub generation: u64,
    pub manifest_path: PathBuf,
    pub root_content_digest: Vec<u8>,
    pub root_structure_digest: Vec<u8>,
    pub verified: usize,
    pub new_files: usize,
    pub extended: usize,
    pub mismatches: usize,
    pub missing: usize,
}

/// Result of a whole seal operation: nested roots first, top-level last.
#[derive(Debug, Clone, Default)]
pub struct SealReport {
    pub roots: Vec<RootSealOutcome>,
}

impl SealReport {
    pub fn mismatches(&self) -> usize {
        self.roots.iter().map(|r| r.mismatches).sum()
    }

    pub fn missing(&self) -> usize {
        self.roots.iter().map(|r| r.missing).sum()
    }

    /// A seal succeeds iff no mismatch and no missing entry anywhere.
    pub fn is_success(&self) -> bool {
        self.mismatches() == 0 && self.missing() == 0
    }

    /// The outcome for the root the operation was invoked on.
    pub fn top_level(&self) -> Option<&RootSealOutcome> {
        self.roots.last()
    }
}

/// Drives seal operations.
pub struct SealOrchestrator<'a> {
    options: SealOptions,
    reporter: &'a ProgressReporter,
}

impl<'a> SealOrchestrator<'a> {
    pub fn new(options: SealOptions, reporter: &'a ProgressReporter) -> Self {
        Self { options, reporter }
    }

    /// Seal a directory tree, nested sealed roots first.
    ///
    /// Verification failures (mismatch, missing) do not error here: the
    /// generation recording them is the point. Callers inspect the report.
    pub fn seal(&self, root: &Path) -> Result<SealReport, SealError> {
        if !root.exists() {
            return Err(SealError::Config(format!(
                "path {} does not exist",
                root.display()
            )));
        }
        let root = canonicalize_root(root)?;
        if !root.is_dir() {
            return Err(SealError::Config(format!(
                "path {} is not a directory",
                root.display()
            )));
        }

        let mut report = SealReport::default();
        self.seal_root(&root, &root, &mut report)?;
        Ok(report)
    }

    /// Seal one root. Children of `root` that are sealed roots themselves are
    /// sealed first so their fresh digests can be absorbed by reference.
    #[instrument(skip(self, report), fields(root = %root.display()))]
    fn seal_root(
        &self,
        root: &Path,
        top_root: &Path,
        report: &mut SealReport,
    ) -> Result<RootSealOutcome, SealError> {
        self.check_cancelled()?;

        // Step 1: nested roots first, depth-first. Their generations commit
        // even if this root's seal fails later.
        let nested = ManifestStore::locate_nested_roots(root)?;
        let mut sealed_children: HashMap<PathBuf, RootSealOutcome> = HashMap::new();
        for child in &nested {
            let child_outcome = self.seal_root(child, top_root, report)?;
            sealed_children.insert(child.clone(), child_outcome);
        }

        // Step 2: open the store, replay prior generations.
        let store = ManifestStore::open(root)?;
        let _lock = if self.options.use_lock {
            Some(store.lock()?)
        } else {
            None
        };
        let generations = store.load_all()?;
        let index = HistoryIndex::build(&generations)?;
        debug!(
            generations = generations.len(),
            known_paths = index.all_known_paths().len(),
            "history replayed"
        );

        // Step 3: walk the tree, then hash and verify every observed file.
        let walker = Walker::new(
            root.to_path_buf(),
            nested.clone(),
            WalkerConfig {
                ignore_patterns: self.options.ignore_patterns.clone(),
            },
        );
        let tree = walker.walk()?;
        self.check_cancelled()?;

        let verdicts = self.hash_stage(&index, &tree.files)?;
        self.report_file_outcomes(&verdicts);

        // Step 4: paths known to history but not observed on disk. Paths that
        // now live under a nested sealed root belong to the child's history.
        let missing_paths: Vec<String> = index
            .all_known_paths()
            .into_iter()
            .filter(|path| !verdicts.contains_key(path))
            .filter(|path| !tree.nested_roots.iter().any(|(rel, _)| is_under(path, rel)))
            .collect();
        self.reporter.missing_files(&missing_paths);

        // Step 5: directory digests on the unwind, children before parents.
        let algorithm = self.options.algorithm;
        let nested_by_rel: HashMap<&str, &RootSealOutcome> = tree
            .nested_roots
            .iter()
            .filter_map(|(rel, abs)| sealed_children.get(abs).map(|o| (rel.as_str(), o)))
            .collect();

        let mut dir_digests: HashMap<String, (Vec<u8>, Vec<u8>)> = HashMap::new();
        for dir in &tree.dirs_post_order {
            let mut children = Vec::with_capacity(dir.children.len());
            for child in &dir.children {
                let child_rel = join_rel(&dir.rel_path, &child.name);
                let digest = match child.kind {
                    ChildKind::File => {
                        let (_, verdict) = &verdicts[&child_rel];
                        ChildDigest {
                            name: child.name.clone(),
                            kind: EntryKind::File,
                            content: verdict.observed[&algorithm].clone(),
                            structure: None,
                        }
                    }
                    ChildKind::Directory => {
                        let (content, structure) = &dir_digests[&child_rel];
                        ChildDigest {
                            name: child.name.clone(),
                            kind: EntryKind::Directory,
                            content: content.clone(),
                            structure: Some(structure.clone()),
                        }
                    }
                    ChildKind::NestedRoot => {
                        let outcome = nested_by_rel[child_rel.as_str()];
                        ChildDigest {
                            name: child.name.clone(),
                            kind: EntryKind::Directory,
                            content: outcome.root_content_digest.clone(),
                            structure: Some(outcome.root_structure_digest.clone()),
                        }
                    }
                };
                children.push(digest);
            }

            let (content, structure) = directory_digests(algorithm, &children);
            if dir.rel_path == ROOT_PATH {
                self.reporter.root_hash(algorithm, &content, &structure);
            } else {
                self.reporter
                    .directory_hash(&dir.rel_path, algorithm, &content, &structure);
            }
            dir_digests.insert(dir.rel_path.clone(), (content, structure));
        }

        // Step 6: compose the new generation document.
        let number = index.latest_generation() + 1;
        let mut outcome = RootSealOutcome {
            root: root.to_path_buf(),
            generation: number,
            manifest_path: PathBuf::new(),
            root_content_digest: dir_digests[ROOT_PATH].0.clone(),
            root_structure_digest: dir_digests[ROOT_PATH].1.clone(),
            verified: 0,
            new_files: 0,
            extended: 0,
            mismatches: 0,
            missing: missing_paths.len(),
        };

        let mut files = Vec::with_capacity(verdicts.len() + missing_paths.len());
        for (path, (record, verdict)) in &verdicts {
            match verdict.outcome {
                VerificationOutcome::NewFile => outcome.new_files += 1,
                VerificationOutcome::Verified => outcome.verified += 1,
                VerificationOutcome::VerifiedAndExtended => outcome.extended += 1,
                VerificationOutcome::HashMismatch => outcome.mismatches += 1,
                VerificationOutcome::Missing => {}
            }
            files.push(FileEntry {
                path: path.clone(),
                size: record.size,
                modified_at: record.modified,
                hashes: encode_map(&verdict.recorded),
                outcome: verdict.outcome,
                observed_hashes: (verdict.outcome == VerificationOutcome::HashMismatch)
                    .then(|| encode_map(&verdict.observed)),
            });
        }
        for path in &missing_paths {
            files.push(FileEntry {
                path: path.clone(),
                size: 0,
                modified_at: None,
                hashes: encode_map(&index.known_hashes(path)),
                outcome: VerificationOutcome::Missing,
                observed_hashes: None,
            });
        }
        files.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));

        let directories = tree
            .dirs_post_order
            .iter()
            .map(|dir| {
                let (content, structure) = &dir_digests[&dir.rel_path];
                DirectoryEntry {
                    path: dir.rel_path.clone(),
                    content_digests: BTreeMap::from([(
                        algorithm,
                        encode_digest(algorithm, content),
                    )]),
                    structure_digests: BTreeMap::from([(
                        algorithm,
                        encode_digest(algorithm, structure),
                    )]),
                }
            })
            .collect();

        let child_histories = tree
            .nested_roots
            .iter()
            .map(|(rel, _)| {
                let child = nested_by_rel[rel.as_str()];
                ChildHistoryRef {
                    path: rel.clone(),
                    generation: child.generation,
                    algorithm,
                    root_content_hash: encode_digest(algorithm, &child.root_content_digest),
                    root_structure_hash: encode_digest(algorithm, &child.root_structure_digest),
                }
            })
            .collect();

        let generation = Generation {
            generation: number,
            previous: (number > 1).then(|| number - 1),
            created_at: Utc::now(),
            root_name: store.root_name().to_string(),
            files,
            directories,
            child_histories,
            notes: tree
                .unsupported
                .iter()
                .map(|u| UnsupportedNote {
                    path: u.rel_path.clone(),
                    reason: u.reason.clone(),
                })
                .collect(),
        };

        // Step 7: atomic append. Cancellation never leaves a torn generation.
        self.check_cancelled()?;
        let manifest_path = store.append(&generation)?;
        let display_path = manifest_path
            .strip_prefix(top_root)
            .unwrap_or(&manifest_path);
        self.reporter
            .generation_created(&display_path.display().to_string());
        info!(
            root = %root.display(),
            generation = number,
            verified = outcome.verified,
            new_files = outcome.new_files,
            mismatches = outcome.mismatches,
            missing = outcome.missing,
            "sealed"
        );

        outcome.manifest_path = manifest_path;
        report.roots.push(outcome.clone());
        Ok(outcome)
    }

    /// Parallel hashing stage. Workers stream each file through all required
    /// algorithms in one pass and drop their verdicts into a shared collector
    /// keyed by path; everything downstream is serial.
    fn hash_stage(
        &self,
        index: &HistoryIndex,
        files: &[FileRecord],
    ) -> Result<BTreeMap<String, (FileRecord, FileVerdict)>, SealError> {
        let algorithm = self.options.algorithm;
        let collector: Mutex<BTreeMap<String, (FileRecord, FileVerdict)>> =
            Mutex::new(BTreeMap::new());

        let run = || -> Result<(), SealError> {
            files.par_iter().try_for_each(|record| {
                self.check_cancelled()?;
                let known = index.known_hashes(&record.rel_path);
                let algorithms = algorithms_to_hash(&known, algorithm);
                let observed = engine::hash_file(&record.abs_path, &algorithms)?;
                let verdict = judge_file(&known, &observed, algorithm);
                collector
                    .lock()
                    .insert(record.rel_path.clone(), (record.clone(), verdict));
                Ok(())
            })
        };

        match self.options.pool_size {
            Some(size) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(size)
                    .build()
                    .map_err(|e| SealError::Config(format!("hash pool: {}", e)))?;
                pool.install(run)?;
            }
            None => run()?,
        }

        Ok(collector.into_inner())
    }

    /// Drain verdicts in canonical name order and emit their progress lines.
    fn report_file_outcomes(&self, verdicts: &BTreeMap<String, (FileRecord, FileVerdict)>) {
        let algorithm = self.options.algorithm;
        for (path, (_, verdict)) in verdicts {
            match verdict.outcome {
                VerificationOutcome::NewFile => {
                    self.reporter
                        .original_hash(path, algorithm, &verdict.observed[&algorithm]);
                }
                VerificationOutcome::Verified => {
                    self.reporter.verified(path);
                }
                VerificationOutcome::VerifiedAndExtended => {
                    self.reporter.verified(path);
                    self.reporter
                        .new_hash(path, algorithm, &verdict.observed[&algorithm]);
                }
                VerificationOutcome::HashMismatch => {
                    warn!(path = %path, "hash mismatch");
                    for algo in &verdict.mismatched {
                        self.reporter.mismatch(
                            path,
                            *algo,
                            &verdict.recorded[algo],
                            &verdict.observed[algo],
                        );
                    }
                }
                VerificationOutcome::Missing => {}
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), SealError> {
        match &self.options.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(SealError::Cancelled),
            _ => Ok(()),
        }
    }
}

fn encode_map(hashes: &BTreeMap<HashAlgorithm, Vec<u8>>) -> BTreeMap<HashAlgorithm, String> {
    hashes
        .iter()
        .map(|(&algo, bytes)| (algo, encode_digest(algo, bytes)))
        .collect()
}
