//! Integration tests for the full check pipeline.
//!
//! These tests run the checker against the sample project in
//! `testdata/project` with the catalogs in `testdata/`.

use std::path::PathBuf;

use phpvercheck::catalog::{Catalog, FunctionRecord, LoadOptions};
use phpvercheck::scan::{DiscoveryConfig, Runner};
use phpvercheck::{check_project, CheckError};
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn project_path() -> PathBuf {
    testdata_path().join("project")
}

fn load_catalog(name: &str) -> Catalog {
    Catalog::load(testdata_path().join(name), LoadOptions::default())
        .expect("should load catalog")
}

#[test]
fn test_check_sample_project() {
    let catalog = load_catalog("functions.xml");
    let report = check_project(project_path(), &catalog).expect("check should succeed");

    assert_eq!(report.files_scanned, 3, "index.php, Archive.php, page.phtml");
    assert_eq!(report.required_version_label(), "8.1.0");
    assert_eq!(
        report.used_functions,
        vec![
            "array_map",
            "htmlspecialchars",
            "iconv_strlen",
            "mb_strlen",
            "str_contains",
            "UnitEnum::cases",
            "ZipArchive::__construct",
        ]
    );
    assert_eq!(report.used_classes, vec!["UnitEnum", "ZipArchive"]);

    let extensions: Vec<(String, Option<String>)> = report
        .used_extensions
        .iter()
        .map(|e| {
            (
                e.name.clone(),
                e.required_version.as_ref().map(|v| v.to_string()),
            )
        })
        .collect();
    assert_eq!(
        extensions,
        vec![
            ("iconv".to_string(), None),
            ("mbstring".to_string(), None),
            ("zip".to_string(), Some("1.1.0".to_string())),
        ]
    );

    assert!(report.version_warning);
    assert_eq!(report.unversioned, vec!["iconv_strlen"]);
    assert!(report.skipped.is_empty());
}

#[test]
fn test_instance_calls_are_not_attributed() {
    let catalog = load_catalog("functions.xml");
    let report = check_project(project_path(), &catalog).unwrap();

    // $this->zip->addFile() is a bare call to addFile, which only exists
    // on ZipArchive in the catalog.
    assert!(!report
        .used_functions
        .iter()
        .any(|f| f.eq_ignore_ascii_case("ZipArchive::addFile")));
}

#[test]
fn test_xml_and_json_catalogs_agree() {
    let from_xml = check_project(project_path(), &load_catalog("functions.xml")).unwrap();
    let from_json = check_project(project_path(), &load_catalog("functions.json")).unwrap();
    assert_eq!(from_xml, from_json);
}

#[test]
fn test_check_is_deterministic() {
    let catalog = load_catalog("functions.xml");
    let first = check_project(project_path(), &catalog).unwrap();
    let second = check_project(project_path(), &catalog).unwrap();
    let parallel = Runner::new(&catalog)
        .parallel(true)
        .run(project_path())
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, parallel);
}

#[test]
fn test_extra_extensions() {
    let catalog = load_catalog("functions.xml");
    let report = Runner::new(&catalog)
        .discovery(DiscoveryConfig {
            extensions: vec!["php".into(), "phtml".into(), "inc".into()],
            ..Default::default()
        })
        .run(project_path())
        .unwrap();

    assert_eq!(report.files_scanned, 4);
    assert!(report.used_functions.contains(&"mysql_connect".to_string()));
    assert!(report.used_extensions.iter().any(|e| e.name == "mysql"));
    assert_eq!(report.required_version_label(), "8.1.0");
}

#[test]
fn test_excluded_paths() {
    let catalog = load_catalog("functions.xml");
    let report = Runner::new(&catalog)
        .discovery(DiscoveryConfig {
            excluded_paths: vec!["lib/**".into()],
            ..Default::default()
        })
        .run(project_path())
        .unwrap();

    assert_eq!(report.files_scanned, 2);
    assert!(report.used_classes.is_empty());
    assert_eq!(report.required_version_label(), "8.0.0");
}

#[test]
fn test_single_free_call_scenario() {
    let catalog = Catalog::from_records(vec![
        FunctionRecord::new("array_map", Some("4.0.6")),
        FunctionRecord::new("enum", Some("8.1.0")).owned_by("UnitEnum"),
    ]);

    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("a.php"), "<?php\narray_map($f, $a);\n").unwrap();

    let report = check_project(temp.path(), &catalog).unwrap();
    assert_eq!(report.required_version_label(), "4.0.6");
    assert_eq!(report.used_functions, vec!["array_map"]);
    assert!(!report.version_warning);
    assert!(report.warning_text().is_none());

    std::fs::write(
        temp.path().join("a.php"),
        "<?php\nnew UnitEnum();\narray_map($f,$a);\n",
    )
    .unwrap();

    let report = check_project(temp.path(), &catalog).unwrap();
    assert_eq!(report.required_version_label(), "8.1.0");
    assert_eq!(report.used_classes, vec!["UnitEnum"]);
    assert_eq!(report.used_functions, vec!["array_map", "UnitEnum::enum"]);
}

#[test]
fn test_only_unversioned_match_is_unknown() {
    let catalog = Catalog::from_records(vec![FunctionRecord::new("mystery", None)]);
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("a.php"), "<?php mystery();").unwrap();

    let report = check_project(temp.path(), &catalog).unwrap();
    assert_eq!(report.required_version_label(), "unknown");
    assert!(report.version_warning);
    assert!(report.warning_text().unwrap().contains("mystery"));
}

#[test]
fn test_missing_root() {
    let catalog = load_catalog("functions.xml");
    let result = check_project(testdata_path().join("does-not-exist"), &catalog);
    assert!(matches!(result, Err(CheckError::RootUnresolvable { .. })));
}

#[test]
fn test_missing_catalog() {
    let result = Catalog::load(testdata_path().join("missing.xml"), LoadOptions::default());
    assert!(matches!(result, Err(CheckError::CatalogUnreadable { .. })));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_not_scanned() {
    let catalog = load_catalog("functions.xml");
    let temp = TempDir::new().unwrap();
    std::os::unix::fs::symlink(project_path(), temp.path().join("linked")).unwrap();

    let report = check_project(temp.path(), &catalog).unwrap();
    assert_eq!(report.files_scanned, 0);
    assert!(report.used_functions.is_empty());
    assert_eq!(report.required_version_label(), "unknown");
}
