//! Loading specifications from disk

use std::io::Write;
use tempfile::NamedTempFile;
use tether_spec::{SpecError, SpecRegistry};

fn write_spec(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_json_file() {
    let file = write_spec(
        ".json",
        r#"{ "classes": [ { "name": "Widget", "members": [ { "name": "press" } ] } ] }"#,
    );

    let registry = SpecRegistry::load(file.path()).unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.declares("Widget", "press"));
}

#[test]
fn test_load_toml_file() {
    let file = write_spec(
        ".toml",
        r#"
        [[classes]]
        name = "Widget"
        members = [ { name = "press" }, { name = "release" } ]
        "#,
    );

    let registry = SpecRegistry::load(file.path()).unwrap();
    assert_eq!(registry.members_of("Widget").len(), 2);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    let err = SpecRegistry::load(&missing).unwrap_err();
    assert!(matches!(err, SpecError::NotFound { ref path } if path == &missing));
}

#[test]
fn test_unparsable_file_is_config_error() {
    let file = write_spec(".json", "classes: [Widget]");
    assert!(matches!(
        SpecRegistry::load(file.path()),
        Err(SpecError::Json(_))
    ));
}

#[test]
fn test_shipped_sandbox_spec_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../specs/sandbox.json");
    let registry = SpecRegistry::load(path).unwrap();

    assert!(registry.declares("Browser", "newPage"));
    assert!(registry.member("Page", "mouse").unwrap().is_scope());
    assert!(registry.declares("Mouse", "click"));
    assert!(registry.declares("Video", "path"));
}
