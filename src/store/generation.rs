//! Generation documents.
//!
//! A generation is an immutable snapshot of one seal: every entry observed,
//! its verification outcome, the directory digest pairs, and references to
//! the previous generation and to nested child histories. Documents are
//! append-only; prior generations are never rewritten.

use crate::error::SealError;
use crate::hash::algorithm::decode_digest;
use crate::types::{HashAlgorithm, VerificationOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One file entry observed (or found missing) by a seal.
///
/// `hashes` carries the recorded values: prior hashes re-recorded on
/// verification plus any newly added algorithm. On a mismatch the prior
/// values stay in `hashes` untouched and the freshly computed values land in
/// `observed_hashes`, so the history preserves both sides of the failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    pub hashes: BTreeMap<HashAlgorithm, String>,
    pub outcome: VerificationOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_hashes: Option<BTreeMap<HashAlgorithm, String>>,
}

/// Digest pair for one directory, per algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub path: String,
    pub content_digests: BTreeMap<HashAlgorithm, String>,
    pub structure_digests: BTreeMap<HashAlgorithm, String>,
}

/// Reference to a nested sealed root absorbed by this generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildHistoryRef {
    pub path: String,
    pub generation: u64,
    pub algorithm: HashAlgorithm,
    pub root_content_hash: String,
    pub root_structure_hash: String,
}

/// Note for an entry the seal could not handle (symlink, special file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsupportedNote {
    pub path: String,
    pub reason: String,
}

/// One immutable generation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub generation: u64,
    pub previous: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub root_name: String,
    pub files: Vec<FileEntry>,
    pub directories: Vec<DirectoryEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_histories: Vec<ChildHistoryRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<UnsupportedNote>,
}

impl Generation {
    /// The directory entry for the sealed root itself.
    pub fn root_directory(&self) -> Option<&DirectoryEntry> {
        self.directories
            .iter()
            .find(|d| d.path == crate::tree::path::ROOT_PATH)
    }

    /// Decode the root digest pair in one algorithm.
    pub fn root_digests(
        &self,
        algorithm: HashAlgorithm,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, SealError> {
        let Some(root) = self.root_directory() else {
            return Ok(None);
        };
        let (Some(content), Some(structure)) = (
            root.content_digests.get(&algorithm),
            root.structure_digests.get(&algorithm),
        ) else {
            return Ok(None);
        };
        Ok(Some((
            decode_digest(algorithm, content)?,
            decode_digest(algorithm, structure)?,
        )))
    }

    /// Whether this generation recorded any verification failure.
    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|f| f.outcome.is_failure())
    }
}
