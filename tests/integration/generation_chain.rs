//! Generation numbering and chain invariants.

use super::test_utils::{build_card, seal};
use tempfile::TempDir;
use treeseal::store::ManifestStore;
use treeseal::types::HashAlgorithm;

#[test]
fn test_generation_numbers_are_contiguous_from_one() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    for _ in 0..4 {
        seal(&root, HashAlgorithm::Xxh64);
    }

    let store = ManifestStore::open(&root).unwrap();
    assert_eq!(store.list_generations().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_each_generation_references_its_predecessor() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    seal(&root, HashAlgorithm::Xxh64);
    seal(&root, HashAlgorithm::Xxh64);
    seal(&root, HashAlgorithm::Xxh64);

    let store = ManifestStore::open(&root).unwrap();
    let generations = store.load_all().unwrap();
    assert_eq!(generations.len(), 3);
    assert_eq!(generations[0].previous, None);
    for pair in generations.windows(2) {
        assert_eq!(pair[1].previous, Some(pair[0].generation));
        assert_eq!(pair[1].generation, pair[0].generation + 1);
    }
}

#[test]
fn test_prior_generation_documents_are_never_rewritten() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());

    seal(&root, HashAlgorithm::Xxh64);
    let store = ManifestStore::open(&root).unwrap();
    let first_path = std::fs::read_dir(store.folder())
        .unwrap()
        .flatten()
        .find(|e| e.file_name().to_string_lossy().starts_with("0001_"))
        .unwrap()
        .path();
    let before = std::fs::read(&first_path).unwrap();

    seal(&root, HashAlgorithm::Md5);
    seal(&root, HashAlgorithm::Xxh64);

    let after = std::fs::read(&first_path).unwrap();
    assert_eq!(before, after);
}
