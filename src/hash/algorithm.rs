//! Hash algorithm capability: incremental states and string encodings.
//!
//! Each algorithm exposes the same surface: create a state, feed bytes,
//! finalize to a fixed-width byte digest. The engine never deals in encoded
//! strings; encoding is applied at the manifest/progress boundary.

use crate::error::SealError;
use crate::types::HashAlgorithm;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha512};
use xxhash_rust::xxh3::Xxh3;
use xxhash_rust::xxh64::Xxh64;

/// Incremental hash state for one algorithm.
pub enum HashState {
    Xxh64(Xxh64),
    Xxh128(Xxh3),
    Md5(Md5),
    Sha1(Sha1),
    // c4 is a post-processing wrapper over sha512: the digest bytes ARE the
    // sha512 bytes, only the string rendering differs.
    C4(Sha512),
}

impl HashState {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Xxh64 => HashState::Xxh64(Xxh64::new(0)),
            HashAlgorithm::Xxh128 => HashState::Xxh128(Xxh3::new()),
            HashAlgorithm::Md5 => HashState::Md5(Md5::new()),
            HashAlgorithm::Sha1 => HashState::Sha1(Sha1::new()),
            HashAlgorithm::C4 => HashState::C4(Sha512::new()),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            HashState::Xxh64(_) => HashAlgorithm::Xxh64,
            HashState::Xxh128(_) => HashAlgorithm::Xxh128,
            HashState::Md5(_) => HashAlgorithm::Md5,
            HashState::Sha1(_) => HashAlgorithm::Sha1,
            HashState::C4(_) => HashAlgorithm::C4,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            HashState::Xxh64(state) => state.update(bytes),
            HashState::Xxh128(state) => state.update(bytes),
            HashState::Md5(state) => state.update(bytes),
            HashState::Sha1(state) => state.update(bytes),
            HashState::C4(state) => state.update(bytes),
        }
    }

    /// Consume the state and produce the digest bytes.
    ///
    /// Width always equals `algorithm().digest_size()`.
    pub fn finalize(self) -> Vec<u8> {
        match self {
            HashState::Xxh64(state) => state.digest().to_be_bytes().to_vec(),
            HashState::Xxh128(state) => state.digest128().to_be_bytes().to_vec(),
            HashState::Md5(state) => state.finalize().to_vec(),
            HashState::Sha1(state) => state.finalize().to_vec(),
            HashState::C4(state) => state.finalize().to_vec(),
        }
    }
}

/// Hash an in-memory byte slice in one algorithm.
pub fn digest_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> Vec<u8> {
    let mut state = HashState::new(algorithm);
    state.update(bytes);
    state.finalize()
}

/// Render digest bytes in the algorithm's canonical string form.
///
/// Lowercase hex for everything except c4, which renders as a 90-character
/// C4 ID (base58, `1`-padded, `c4`-prefixed).
pub fn encode_digest(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::C4 => c4_string(bytes),
        _ => hex::encode(bytes),
    }
}

/// Parse a digest string back into bytes, validating width.
pub fn decode_digest(algorithm: HashAlgorithm, s: &str) -> Result<Vec<u8>, SealError> {
    let bytes = match algorithm {
        HashAlgorithm::C4 => c4_bytes(s)
            .ok_or_else(|| SealError::Config(format!("invalid c4 id '{}'", s)))?,
        _ => hex::decode(s)
            .map_err(|e| SealError::Config(format!("invalid {} digest '{}': {}", algorithm, s, e)))?,
    };
    if bytes.len() != algorithm.digest_size() {
        return Err(SealError::Config(format!(
            "digest '{}' has wrong width for {} (expected {} bytes, got {})",
            s,
            algorithm,
            algorithm.digest_size(),
            bytes.len()
        )));
    }
    Ok(bytes)
}

const C4_CHARSET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const C4_ID_LENGTH: usize = 90;

/// Encode 64 sha512 bytes as a C4 ID: base58 digits of the big-endian value,
/// right-justified to 88 characters with `1` (zero in the C4 alphabet),
/// prefixed with `c4`.
fn c4_string(digest: &[u8]) -> String {
    let mut scratch = digest.to_vec();
    let mut digits: Vec<u8> = Vec::with_capacity(C4_ID_LENGTH - 2);

    while scratch.iter().any(|&b| b != 0) {
        let mut remainder: u32 = 0;
        for byte in scratch.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 58) as u8;
            remainder = acc % 58;
        }
        digits.push(C4_CHARSET[remainder as usize]);
    }

    let mut out = String::with_capacity(C4_ID_LENGTH);
    out.push_str("c4");
    for _ in 0..(C4_ID_LENGTH - 2 - digits.len()) {
        out.push('1');
    }
    out.extend(digits.iter().rev().map(|&b| b as char));
    out
}

/// Decode a C4 ID back into its 64 sha512 bytes. Returns `None` on malformed
/// input (wrong length, bad prefix, character outside the alphabet).
fn c4_bytes(s: &str) -> Option<Vec<u8>> {
    if s.len() != C4_ID_LENGTH || !s.starts_with("c4") {
        return None;
    }

    let mut value = vec![0u8; 64];
    for ch in s.bytes().skip(2) {
        let digit = C4_CHARSET.iter().position(|&c| c == ch)? as u32;
        let mut carry = digit;
        for byte in value.iter_mut().rev() {
            let acc = u32::from(*byte) * 58 + carry;
            *byte = (acc & 0xff) as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return None;
        }
    }
    Some(value)
}
