//! Re-sealing an unmodified tree.

use super::test_utils::{build_card, latest_generation, seal};
use tempfile::TempDir;
use treeseal::types::{HashAlgorithm, VerificationOutcome};

#[test]
fn test_reseal_unchanged_tree_verifies_everything() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    let first = seal(&root, HashAlgorithm::Xxh64);
    let second = seal(&root, HashAlgorithm::Xxh64);
    assert!(second.is_success());

    let generation = latest_generation(&root);
    assert_eq!(generation.generation, 2);
    assert_eq!(generation.previous, Some(1));
    assert!(generation
        .files
        .iter()
        .all(|f| f.outcome == VerificationOutcome::Verified));

    // The root digest pair reproduces exactly.
    assert_eq!(
        second.top_level().unwrap().root_content_digest,
        first.top_level().unwrap().root_content_digest
    );
    assert_eq!(
        second.top_level().unwrap().root_structure_digest,
        first.top_level().unwrap().root_structure_digest
    );
}

#[test]
fn test_repeated_seals_stay_stable() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    let first = seal(&root, HashAlgorithm::Xxh64);
    let baseline = first.top_level().unwrap().root_content_digest.clone();

    for expected in 2..=4u64 {
        let report = seal(&root, HashAlgorithm::Xxh64);
        assert!(report.is_success());
        let top = report.top_level().unwrap();
        assert_eq!(top.generation, expected);
        assert_eq!(top.verified, 3);
        assert_eq!(top.root_content_digest, baseline);
    }
}

#[test]
fn test_recorded_hashes_never_change_across_reseals() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    seal(&root, HashAlgorithm::Xxh64);
    let first = latest_generation(&root);
    seal(&root, HashAlgorithm::Xxh64);
    let second = latest_generation(&root);

    for file in &first.files {
        let later = second.files.iter().find(|f| f.path == file.path).unwrap();
        assert_eq!(later.hashes[&HashAlgorithm::Xxh64], file.hashes[&HashAlgorithm::Xxh64]);
    }
}
