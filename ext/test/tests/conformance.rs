//! Conformance tests that run YAML fixtures against volmatch
//!
//! Run with: cargo test -p volmatch-test --test conformance

use std::fs;
use std::path::{Path, PathBuf};
use volmatch_test::fixture::Fixture;

/// Fixture directory of this crate
fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run every fixture in one file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    println!("Running fixture: {}", path.display());

    let yaml = fs::read_to_string(&path).expect("read yaml");

    // Parse potentially multiple fixtures (separated by ---)
    let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {}", path.display(), e);
    });
    assert!(!fixtures.is_empty(), "{} holds no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_capacity() {
    run_fixture_file("01_capacity.yaml");
}

#[test]
fn test_storage_class() {
    run_fixture_file("02_storage_class.yaml");
}

#[test]
fn test_nfs() {
    run_fixture_file("03_nfs.yaml");
}

#[test]
fn test_csi() {
    run_fixture_file("04_csi.yaml");
}

#[test]
fn test_pvc_labels() {
    run_fixture_file("05_pvc_labels.yaml");
}

#[test]
fn test_combined() {
    run_fixture_file("06_combined.yaml");
}

#[test]
fn every_fixture_file_is_exercised() {
    let mut files: Vec<_> = fs::read_dir(fixtures_dir())
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").file_name().into_string().expect("utf-8"))
        .filter(|name| name.ends_with(".yaml") || name.ends_with(".yml"))
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "01_capacity.yaml",
            "02_storage_class.yaml",
            "03_nfs.yaml",
            "04_csi.yaml",
            "05_pvc_labels.yaml",
            "06_combined.yaml",
        ]
    );
}
