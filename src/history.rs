//! History index: the replayed aggregate of all prior generations.
//!
//! Built once per seal by folding generations 1..N in order; read-only
//! afterwards. For every path it knows the most recently recorded hash per
//! algorithm and which generations saw the path present or missing.

use crate::error::SealError;
use crate::hash::algorithm::decode_digest;
use crate::store::{ChildHistoryRef, Generation};
use crate::types::{HashAlgorithm, VerificationOutcome};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Recorded hash with the generation that recorded it.
#[derive(Debug, Clone)]
pub struct RecordedHash {
    pub bytes: Vec<u8>,
    pub generation: u64,
}

/// Everything history knows about one path.
#[derive(Debug, Clone, Default)]
pub struct PathHistory {
    pub hashes: BTreeMap<HashAlgorithm, RecordedHash>,
    pub last_seen_present: Option<u64>,
    pub last_seen_missing: Option<u64>,
    /// Generations that touched this path.
    pub generations: BTreeSet<u64>,
}

/// In-memory aggregate of one sealed root's full history.
#[derive(Debug, Default)]
pub struct HistoryIndex {
    entries: HashMap<String, PathHistory>,
    child_histories: BTreeMap<String, ChildHistoryRef>,
    latest_generation: u64,
}

impl HistoryIndex {
    /// Fold generations 1..N (already chain-validated by the store) into the
    /// index. Recorded hash strings must decode; a generation carrying an
    /// undecodable value is corrupt.
    pub fn build(generations: &[Generation]) -> Result<Self, SealError> {
        let mut index = HistoryIndex::default();

        for generation in generations {
            index.latest_generation = generation.generation;

            for file in &generation.files {
                let entry = index.entries.entry(file.path.clone()).or_default();
                entry.generations.insert(generation.generation);

                if file.outcome == VerificationOutcome::Missing {
                    entry.last_seen_missing = Some(generation.generation);
                    continue;
                }
                entry.last_seen_present = Some(generation.generation);

                for (&algorithm, encoded) in &file.hashes {
                    let bytes = decode_digest(algorithm, encoded).map_err(|e| {
                        SealError::corrupt(
                            file.path.clone(),
                            format!(
                                "generation {} records undecodable {} hash: {}",
                                generation.generation, algorithm, e
                            ),
                        )
                    })?;
                    entry.hashes.insert(
                        algorithm,
                        RecordedHash {
                            bytes,
                            generation: generation.generation,
                        },
                    );
                }
            }

            for child in &generation.child_histories {
                index
                    .child_histories
                    .insert(child.path.clone(), child.clone());
            }
        }

        Ok(index)
    }

    /// Highest generation number folded in; 0 for an empty history.
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    pub fn is_known(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Most recent recorded hash per algorithm for a path.
    pub fn known_hashes(&self, path: &str) -> BTreeMap<HashAlgorithm, Vec<u8>> {
        self.entries
            .get(path)
            .map(|e| {
                e.hashes
                    .iter()
                    .map(|(&algo, recorded)| (algo, recorded.bytes.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn path_history(&self, path: &str) -> Option<&PathHistory> {
        self.entries.get(path)
    }

    /// Every path any generation ever recorded, including those last seen
    /// missing (a path that reappears is verified against its old hashes).
    pub fn all_known_paths(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Nested sealed-root references absorbed into this root's history, most
    /// recent reference per child path.
    pub fn child_histories(&self) -> impl Iterator<Item = &ChildHistoryRef> {
        self.child_histories.values()
    }
}
