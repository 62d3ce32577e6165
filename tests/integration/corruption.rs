//! Detection of altered file bytes.

use super::test_utils::{build_card, latest_generation, seal};
use std::fs;
use tempfile::TempDir;
use treeseal::error::SealError;
use treeseal::store::ManifestStore;
use treeseal::types::{HashAlgorithm, VerificationOutcome};

#[test]
fn test_flipped_byte_recorded_as_mismatch_with_both_values() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    let first = seal(&root, HashAlgorithm::Xxh64);
    let original_hash = latest_generation(&root)
        .files
        .iter()
        .find(|f| f.path == "Sidecar.txt")
        .unwrap()
        .hashes[&HashAlgorithm::Xxh64]
        .clone();

    fs::write(root.join("Sidecar.txt"), b"cccd").unwrap();
    let second = seal(&root, HashAlgorithm::Xxh64);
    assert!(!second.is_success());
    assert_eq!(second.mismatches(), 1);

    // Generation 2 is still written; that is the point.
    let generation = latest_generation(&root);
    assert_eq!(generation.generation, 2);

    let sidecar = generation
        .files
        .iter()
        .find(|f| f.path == "Sidecar.txt")
        .unwrap();
    assert_eq!(sidecar.outcome, VerificationOutcome::HashMismatch);
    // Old value preserved, new value recorded alongside it.
    assert_eq!(sidecar.hashes[&HashAlgorithm::Xxh64], original_hash);
    let observed = sidecar.observed_hashes.as_ref().unwrap();
    assert_ne!(observed[&HashAlgorithm::Xxh64], original_hash);

    // Content digest moves, structure digest does not.
    let top = second.top_level().unwrap();
    assert_ne!(
        top.root_content_digest,
        first.top_level().unwrap().root_content_digest
    );
    assert_eq!(
        top.root_structure_digest,
        first.top_level().unwrap().root_structure_digest
    );
}

#[test]
fn test_untouched_files_still_verify_alongside_a_mismatch() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    seal(&root, HashAlgorithm::Xxh64);
    fs::write(root.join("Clips/a.mov"), b"AAAAAAAX").unwrap();
    let report = seal(&root, HashAlgorithm::Xxh64);

    let top = report.top_level().unwrap();
    assert_eq!(top.mismatches, 1);
    assert_eq!(top.verified, 2);
}

#[test]
fn test_tampered_manifest_is_corrupt_history() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());
    seal(&root, HashAlgorithm::Xxh64);

    // Truncate the generation document.
    let store = ManifestStore::open(&root).unwrap();
    let manifest = fs::read_dir(store.folder())
        .unwrap()
        .flatten()
        .find(|e| e.file_name().to_string_lossy().ends_with(".json"))
        .unwrap();
    fs::write(manifest.path(), b"{").unwrap();

    let reporter = treeseal::progress::ProgressReporter::new(false);
    let err = treeseal::seal::SealOrchestrator::new(Default::default(), &reporter)
        .seal(&root)
        .unwrap_err();
    assert!(matches!(err, SealError::CorruptHistory { .. }));

    // Fatal: no new generation was appended.
    assert_eq!(
        fs::read_dir(store.folder())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".json"))
            .count(),
        1
    );
}
