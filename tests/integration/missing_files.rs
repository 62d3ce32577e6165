//! Detection of files recorded in history but absent from disk.

use super::test_utils::{build_card, latest_generation, seal};
use std::fs;
use tempfile::TempDir;
use treeseal::types::{HashAlgorithm, VerificationOutcome};

#[test]
fn test_deleted_file_recorded_as_missing() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    let first = seal(&root, HashAlgorithm::Xxh64);
    fs::remove_file(root.join("Sidecar.txt")).unwrap();

    let second = seal(&root, HashAlgorithm::Xxh64);
    assert!(!second.is_success());
    assert_eq!(second.missing(), 1);

    let generation = latest_generation(&root);
    assert_eq!(generation.generation, 2);
    let sidecar = generation
        .files
        .iter()
        .find(|f| f.path == "Sidecar.txt")
        .unwrap();
    assert_eq!(sidecar.outcome, VerificationOutcome::Missing);
    // The last known hash travels with the missing annotation.
    assert!(sidecar.hashes.contains_key(&HashAlgorithm::Xxh64));

    // Both digests move: the name set changed and so did the content.
    let top = second.top_level().unwrap();
    assert_ne!(
        top.root_content_digest,
        first.top_level().unwrap().root_content_digest
    );
    assert_ne!(
        top.root_structure_digest,
        first.top_level().unwrap().root_structure_digest
    );
}

#[test]
fn test_reappearing_file_verifies_against_old_hashes() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    seal(&root, HashAlgorithm::Xxh64);
    fs::remove_file(root.join("Sidecar.txt")).unwrap();
    seal(&root, HashAlgorithm::Xxh64);

    // Restore the identical bytes: the old record still applies.
    fs::write(root.join("Sidecar.txt"), b"cccc").unwrap();
    let report = seal(&root, HashAlgorithm::Xxh64);
    assert!(report.is_success());

    let generation = latest_generation(&root);
    let sidecar = generation
        .files
        .iter()
        .find(|f| f.path == "Sidecar.txt")
        .unwrap();
    assert_eq!(sidecar.outcome, VerificationOutcome::Verified);
}

#[test]
fn test_reappearing_file_with_wrong_bytes_is_mismatch() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    seal(&root, HashAlgorithm::Xxh64);
    fs::remove_file(root.join("Sidecar.txt")).unwrap();
    seal(&root, HashAlgorithm::Xxh64);

    fs::write(root.join("Sidecar.txt"), b"CCCC").unwrap();
    let report = seal(&root, HashAlgorithm::Xxh64);
    assert!(!report.is_success());
    assert_eq!(report.mismatches(), 1);
}
