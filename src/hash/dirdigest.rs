//! Folder-level digest composition.
//!
//! Each directory gets two digests per algorithm. The content digest changes
//! iff some descendant file's bytes change (or the file set changes); the
//! structure digest changes iff the set of names/kinds changes. Together they
//! let verification distinguish "same files, reorganized" from "same tree,
//! altered file".
//!
//! The content stream is name-free and order-canonicalized: the child
//! contributions (file hash, or child directory content digest) are sorted
//! byte-wise and concatenated, so renaming or reordering children never moves
//! the content digest. Names live exclusively in the structure stream.

use crate::hash::algorithm::HashState;
use crate::types::{EntryKind, HashAlgorithm};

/// Terminates each digest stream; also separates name from tag bytes.
const SEPARATOR: u8 = 0x00;
/// Kind tag bytes in the structure stream.
const TAG_FILE: u8 = b'f';
const TAG_DIR: u8 = b'd';

/// One immediate child as presented to digest composition.
///
/// For files `content` is the file hash and `structure` is `None`; for
/// directories (including nested sealed roots) both are the child's composed
/// digests.
#[derive(Debug, Clone)]
pub struct ChildDigest {
    /// Normalized child name. Callers present children ordered by byte-wise
    /// comparison of this name, never locale collation.
    pub name: String,
    pub kind: EntryKind,
    pub content: Vec<u8>,
    pub structure: Option<Vec<u8>>,
}

/// Compose the content and structure digests of a directory from its ordered
/// immediate children.
///
/// Content stream: the children's content hash bytes (file hash for files,
/// content digest for directories), sorted byte-wise, concatenated; a
/// trailing separator terminates the stream. Digest widths are fixed per
/// algorithm, so the framing is unambiguous.
///
/// Structure stream: per child in name order, the name bytes, a separator, a
/// kind tag, and for directories the child's structure digest bytes; the same
/// trailing separator. An empty directory digests the lone separator in both
/// streams.
pub fn directory_digests(
    algorithm: HashAlgorithm,
    children: &[ChildDigest],
) -> (Vec<u8>, Vec<u8>) {
    debug_assert!(
        children.windows(2).all(|w| w[0].name.as_bytes() < w[1].name.as_bytes()),
        "children must be in canonical byte-wise name order"
    );

    let mut content = HashState::new(algorithm);
    let mut structure = HashState::new(algorithm);

    let mut contributions: Vec<&[u8]> = children.iter().map(|c| c.content.as_slice()).collect();
    contributions.sort_unstable();
    for contribution in contributions {
        content.update(contribution);
    }

    for child in children {
        structure.update(child.name.as_bytes());
        structure.update(&[SEPARATOR]);
        match child.kind {
            EntryKind::File => {
                structure.update(&[TAG_FILE]);
            }
            EntryKind::Directory => {
                structure.update(&[TAG_DIR]);
                if let Some(child_structure) = &child.structure {
                    structure.update(child_structure);
                }
            }
        }
    }

    content.update(&[SEPARATOR]);
    structure.update(&[SEPARATOR]);

    (content.finalize(), structure.finalize())
}
