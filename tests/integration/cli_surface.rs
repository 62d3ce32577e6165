//! CLI routing and exit codes, driven through the library surface.

use super::test_utils::build_card;
use clap::Parser;
use std::fs;
use tempfile::TempDir;
use treeseal::cli::{run, Cli, EXIT_STRUCTURAL_FAILURE, EXIT_VERIFICATION_FAILED};

fn run_cli(args: &[&str]) -> i32 {
    run(Cli::parse_from(args))
}

#[test]
fn test_create_then_verify_exit_zero() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());
    let root_str = root.to_string_lossy().to_string();

    assert_eq!(run_cli(&["treeseal", "create", root_str.as_str()]), 0);
    assert_eq!(run_cli(&["treeseal", "verify", root_str.as_str()]), 0);
    assert_eq!(run_cli(&["treeseal", "diff", root_str.as_str()]), 0);
}

#[test]
fn test_create_with_algorithm_flag() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());
    let root_str = root.to_string_lossy().to_string();

    assert_eq!(
        run_cli(&["treeseal", "create", "-h", "sha1", root_str.as_str()]),
        0
    );
    assert_eq!(
        run_cli(&["treeseal", "create", "-h", "c4", root_str.as_str()]),
        0
    );
}

#[test]
fn test_mismatch_exits_with_verification_code() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());
    let root_str = root.to_string_lossy().to_string();

    assert_eq!(run_cli(&["treeseal", "create", root_str.as_str()]), 0);
    fs::write(root.join("Sidecar.txt"), b"dddd").unwrap();
    assert_eq!(
        run_cli(&["treeseal", "create", root_str.as_str()]),
        EXIT_VERIFICATION_FAILED
    );
}

#[test]
fn test_missing_file_exits_with_verification_code() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());
    let root_str = root.to_string_lossy().to_string();

    assert_eq!(run_cli(&["treeseal", "create", root_str.as_str()]), 0);
    fs::remove_file(root.join("Sidecar.txt")).unwrap();
    assert_eq!(
        run_cli(&["treeseal", "create", root_str.as_str()]),
        EXIT_VERIFICATION_FAILED
    );
}

#[test]
fn test_unknown_algorithm_exits_with_structural_code() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());
    let root_str = root.to_string_lossy().to_string();

    assert_eq!(
        run_cli(&["treeseal", "create", "-h", "crc32", root_str.as_str()]),
        EXIT_STRUCTURAL_FAILURE
    );
}

#[test]
fn test_nonexistent_path_exits_with_structural_code() {
    let temp_dir = TempDir::new().unwrap();
    let gone = temp_dir.path().join("gone").to_string_lossy().to_string();
    assert_eq!(
        run_cli(&["treeseal", "create", gone.as_str()]),
        EXIT_STRUCTURAL_FAILURE
    );
}

#[test]
fn test_info_prints_generation_records() {
    let temp_dir = TempDir::new().unwrap();
    let root = build_card(temp_dir.path());
    let root_str = root.to_string_lossy().to_string();

    assert_eq!(run_cli(&["treeseal", "create", root_str.as_str()]), 0);
    assert_eq!(
        run_cli(&["treeseal", "info", root_str.as_str(), "Sidecar.txt"]),
        0
    );
}
