//! Per-file verification state machine.
//!
//! For every file a seal observes, the prior recorded hashes and the freshly
//! computed ones meet here. Prior values are never overwritten: a mismatch is
//! recorded alongside the old values and the seal continues, so the history
//! durably preserves the evidence.

use crate::types::{HashAlgorithm, VerificationOutcome};
use std::collections::BTreeMap;

/// The verdict for one file after the single hashing pass.
#[derive(Debug, Clone)]
pub struct FileVerdict {
    pub outcome: VerificationOutcome,
    /// Hash values to record in the new generation: the prior values
    /// (re-recorded on verification) plus any newly added algorithm.
    pub recorded: BTreeMap<HashAlgorithm, Vec<u8>>,
    /// Freshly computed values. Only recorded in the generation when they
    /// disagree with history.
    pub observed: BTreeMap<HashAlgorithm, Vec<u8>>,
    /// Algorithms whose prior value did not match the bytes on disk.
    pub mismatched: Vec<HashAlgorithm>,
    /// Algorithms computed for this path for the first time.
    pub added: Vec<HashAlgorithm>,
}

/// The set of algorithms a file must be hashed in: every algorithm history
/// already records for it, plus the seal's requested algorithm.
pub fn algorithms_to_hash(
    known: &BTreeMap<HashAlgorithm, Vec<u8>>,
    requested: HashAlgorithm,
) -> Vec<HashAlgorithm> {
    let mut algorithms: Vec<HashAlgorithm> = known.keys().copied().collect();
    if !known.contains_key(&requested) {
        algorithms.push(requested);
    }
    algorithms
}

/// Judge one file: compare every prior hash against the observed value in the
/// same algorithm, in one pass worth of observations.
///
/// - No prior entry: `NewFile`, the requested hash is recorded.
/// - All prior hashes match, requested algorithm already known: `Verified`.
/// - All prior hashes match, requested algorithm new: `VerifiedAndExtended`,
///   the new hash is recorded alongside the re-recorded prior values.
/// - Any prior hash differs: `HashMismatch`; prior values stay recorded, the
///   observed values are carried separately, nothing is overwritten.
pub fn judge_file(
    known: &BTreeMap<HashAlgorithm, Vec<u8>>,
    observed: &BTreeMap<HashAlgorithm, Vec<u8>>,
    requested: HashAlgorithm,
) -> FileVerdict {
    if known.is_empty() {
        let mut recorded = BTreeMap::new();
        if let Some(value) = observed.get(&requested) {
            recorded.insert(requested, value.clone());
        }
        return FileVerdict {
            outcome: VerificationOutcome::NewFile,
            recorded,
            observed: observed.clone(),
            mismatched: Vec::new(),
            added: vec![requested],
        };
    }

    let mismatched: Vec<HashAlgorithm> = known
        .iter()
        .filter(|(algo, prior)| observed.get(algo).map(|seen| seen != *prior).unwrap_or(true))
        .map(|(&algo, _)| algo)
        .collect();

    if !mismatched.is_empty() {
        return FileVerdict {
            outcome: VerificationOutcome::HashMismatch,
            recorded: known.clone(),
            observed: observed.clone(),
            mismatched,
            added: Vec::new(),
        };
    }

    let mut recorded = known.clone();
    let mut added = Vec::new();
    let outcome = if known.contains_key(&requested) {
        VerificationOutcome::Verified
    } else {
        if let Some(value) = observed.get(&requested) {
            recorded.insert(requested, value.clone());
        }
        added.push(requested);
        VerificationOutcome::VerifiedAndExtended
    };

    FileVerdict {
        outcome,
        recorded,
        observed: observed.clone(),
        mismatched: Vec::new(),
        added,
    }
}
