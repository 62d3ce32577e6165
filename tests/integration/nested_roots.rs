//! Composition of nested sealed histories.

use super::test_utils::{latest_generation, seal};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use treeseal::hash::algorithm::encode_digest;
use treeseal::store::ManifestStore;
use treeseal::types::{HashAlgorithm, VerificationOutcome};

fn build_reels(parent: &Path) -> PathBuf {
    let reels = parent.join("Reels");
    for card in ["A002", "A003"] {
        fs::create_dir_all(reels.join(card).join("Clips")).unwrap();
        fs::write(
            reels.join(card).join("Clips/take.mov"),
            format!("footage-{}", card),
        )
        .unwrap();
    }
    reels
}

#[test]
fn test_parent_seal_absorbs_nested_histories_by_reference() {
    let temp_dir = TempDir::new().unwrap();
    let reels = build_reels(temp_dir.path());

    // Each card sealed independently first, as if on set.
    seal(&reels.join("A002"), HashAlgorithm::Xxh64);
    seal(&reels.join("A003"), HashAlgorithm::Xxh64);
    fs::write(reels.join("Summary.txt"), b"two cards").unwrap();

    let report = seal(&reels, HashAlgorithm::Xxh64);
    assert!(report.is_success());

    // Depth-first: both cards sealed again before the parent.
    assert_eq!(report.roots.len(), 3);
    for card in ["A002", "A003"] {
        let outcome = report
            .roots
            .iter()
            .find(|r| r.root.ends_with(card))
            .unwrap();
        assert_eq!(outcome.generation, 2);
        assert_eq!(outcome.verified, 1);
    }

    // The parent wrote its own generation 1 with two child references.
    let parent = latest_generation(&reels);
    assert_eq!(parent.generation, 1);
    assert_eq!(parent.child_histories.len(), 2);
    assert!(parent.files.iter().any(|f| f.path == "Summary.txt"));

    // Each reference carries the child's fresh generation number and root
    // content digest, exactly as written in the child's own store.
    for child_ref in &parent.child_histories {
        let card_outcome = report
            .roots
            .iter()
            .find(|r| r.root.ends_with(&child_ref.path))
            .unwrap();
        assert_eq!(child_ref.generation, 2);
        assert_eq!(
            child_ref.root_content_hash,
            encode_digest(HashAlgorithm::Xxh64, &card_outcome.root_content_digest)
        );

        let card_generation = latest_generation(&card_outcome.root);
        let (content, _) = card_generation
            .root_digests(HashAlgorithm::Xxh64)
            .unwrap()
            .unwrap();
        assert_eq!(
            child_ref.root_content_hash,
            encode_digest(HashAlgorithm::Xxh64, &content)
        );
    }

    // The parent never recorded the cards' files itself.
    assert!(parent.files.iter().all(|f| !f.path.starts_with("A00")));
}

#[test]
fn test_parent_digest_depends_on_nested_content() {
    let temp_dir = TempDir::new().unwrap();
    let reels = build_reels(temp_dir.path());
    seal(&reels.join("A002"), HashAlgorithm::Xxh64);
    seal(&reels.join("A003"), HashAlgorithm::Xxh64);

    let first = seal(&reels, HashAlgorithm::Xxh64);

    // Changing bytes inside a card changes the parent's content digest even
    // though the parent never hashes the card's files directly.
    fs::write(reels.join("A002/Clips/take.mov"), b"altered").unwrap();
    let second = seal(&reels, HashAlgorithm::Xxh64);

    assert!(!second.is_success()); // the card itself records the mismatch
    assert_ne!(
        first.top_level().unwrap().root_content_digest,
        second.top_level().unwrap().root_content_digest
    );
    assert_eq!(
        first.top_level().unwrap().root_structure_digest,
        second.top_level().unwrap().root_structure_digest
    );
}

#[test]
fn test_discovery_does_not_cross_a_sealed_boundary() {
    let temp_dir = TempDir::new().unwrap();
    let reels = build_reels(temp_dir.path());

    // Seal a root nested inside A002 as well.
    let inner = reels.join("A002/Clips");
    seal(&inner, HashAlgorithm::Xxh64);
    seal(&reels.join("A002"), HashAlgorithm::Xxh64);

    let found = ManifestStore::locate_nested_roots(&reels).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("A002"));
}

#[test]
fn test_unsealed_subdirectory_is_walked_normally() {
    let temp_dir = TempDir::new().unwrap();
    let reels = build_reels(temp_dir.path());
    seal(&reels.join("A002"), HashAlgorithm::Xxh64);
    // A003 left unsealed: its files belong to the parent's generation.

    let report = seal(&reels, HashAlgorithm::Xxh64);
    assert!(report.is_success());

    let parent = latest_generation(&reels);
    assert_eq!(parent.child_histories.len(), 1);
    assert!(parent
        .files
        .iter()
        .any(|f| f.path == "A003/Clips/take.mov"
            && f.outcome == VerificationOutcome::NewFile));
}
