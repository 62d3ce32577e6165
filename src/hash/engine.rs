//! Single-pass streaming of file bytes through one or more hash algorithms.

use crate::error::SealError;
use crate::hash::algorithm::HashState;
use crate::types::HashAlgorithm;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read chunk size. Large files stream through without excessive memory use.
const CHUNK_SIZE: usize = 1024 * 1024;

/// Stream a byte source through every requested algorithm in exactly one pass.
///
/// Duplicate algorithms collapse; the result maps each algorithm to its final
/// digest bytes. An empty source yields each algorithm's empty-input digest.
pub fn hash_reader<R: Read>(
    mut reader: R,
    algorithms: &[HashAlgorithm],
) -> std::io::Result<BTreeMap<HashAlgorithm, Vec<u8>>> {
    let mut states: Vec<HashState> = {
        let mut seen = Vec::new();
        for &algo in algorithms {
            if !seen.iter().any(|s: &HashState| s.algorithm() == algo) {
                seen.push(HashState::new(algo));
            }
        }
        seen
    };

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        for state in states.iter_mut() {
            state.update(&buffer[..read]);
        }
    }

    Ok(states
        .into_iter()
        .map(|state| (state.algorithm(), state.finalize()))
        .collect())
}

/// Hash a file on disk in the given algorithms, one pass over its bytes.
pub fn hash_file(
    path: &Path,
    algorithms: &[HashAlgorithm],
) -> Result<BTreeMap<HashAlgorithm, Vec<u8>>, SealError> {
    let file = File::open(path).map_err(|e| SealError::io(path, e))?;
    hash_reader(file, algorithms).map_err(|e| SealError::io(path, e))
}
