//! Core types shared across the sealing engine.

use crate::error::SealError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hash algorithms the engine recognizes.
///
/// `C4` is a content-addressable identifier over sha512; its digest bytes are
/// the raw sha512 bytes and only its string rendering differs (base58).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Xxh64,
    Xxh128,
    Md5,
    Sha1,
    C4,
}

impl HashAlgorithm {
    /// All supported algorithms, in declaration order.
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Xxh64,
        HashAlgorithm::Xxh128,
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::C4,
    ];

    /// Stable algorithm id used in manifests and progress output.
    pub fn id(&self) -> &'static str {
        match self {
            HashAlgorithm::Xxh64 => "xxh64",
            HashAlgorithm::Xxh128 => "xxh128",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::C4 => "c4",
        }
    }

    /// Fixed binary width of a digest in this algorithm, in bytes.
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Xxh64 => 8,
            HashAlgorithm::Xxh128 => 16,
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::C4 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for HashAlgorithm {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xxh64" => Ok(HashAlgorithm::Xxh64),
            "xxh128" => Ok(HashAlgorithm::Xxh128),
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "c4" => Ok(HashAlgorithm::C4),
            other => Err(SealError::Config(format!(
                "unknown hash algorithm '{}' (supported: xxh64, xxh128, md5, sha1, c4)",
                other
            ))),
        }
    }
}

/// Terminal verification states for one file observed by a seal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// First time any generation has seen this path.
    NewFile,
    /// Every prior recorded hash matched.
    Verified,
    /// Every prior hash matched and a hash in a new algorithm was added.
    VerifiedAndExtended,
    /// At least one prior recorded hash did not match the bytes on disk.
    HashMismatch,
    /// The path is known to history but absent from disk.
    Missing,
}

impl VerificationOutcome {
    /// Whether this outcome counts as a verification failure for the exit code.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            VerificationOutcome::HashMismatch | VerificationOutcome::Missing
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::NewFile => "new",
            VerificationOutcome::Verified => "verified",
            VerificationOutcome::VerifiedAndExtended => "verified+extended",
            VerificationOutcome::HashMismatch => "hash mismatch",
            VerificationOutcome::Missing => "missing",
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a directory child as presented to digest composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}
