//! End-to-end tests of the validate-then-persist flow over an isolated
//! storage root.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use hookstore::{AppConfig, Payload, store, validation};

fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.storage_root = root.to_string_lossy().into_owned();
    config
}

fn payload(value: serde_json::Value) -> Payload {
    serde_json::from_value(value).expect("payload should deserialize")
}

/// Build `levels` nested objects, innermost holding a scalar.
fn nested_objects(levels: usize) -> serde_json::Value {
    let mut value = json!({"leaf": 1});
    for _ in 1..levels {
        value = json!({"level": value});
    }
    value
}

fn accept(config: &AppConfig, mut p: Payload) -> hookstore::PersistenceResult {
    validation::validate(&p, &config.policy).expect("payload should validate");
    store::persist(&mut p, config).expect("payload should persist")
}

#[test]
fn accepted_payload_round_trips() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let submitted = json!({
        "title": "Hello",
        "description": "integration check",
        "source": "api.example.com",
        "type": "resource.updated",
        "data": {
            "a": 1,
            "nested": {"flag": true, "items": [1, 2.5, "three", null]},
        }
    });
    let result = accept(&config, payload(submitted.clone()));

    let written = fs::read_to_string(&result.path).unwrap();
    assert!(written.contains("\"title\": \"Hello\""));

    let reread: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(reread["data"], submitted["data"]);
    assert_eq!(reread["title"], "Hello");
    assert_eq!(reread["description"], "integration check");
    assert_eq!(reread["source"], "api.example.com");
    assert_eq!(reread["type"], "resource.updated");

    // System-assigned metadata is present in the file
    assert!(reread["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(reread["timestamp"].as_str().is_some());
}

#[test]
fn empty_title_is_rejected() {
    let config = test_config(Path::new("/tmp/unused"));
    let p = payload(json!({"title": "", "data": {"a": 1}}));
    let err = validation::validate(&p, &config.policy).unwrap_err();
    assert_eq!(err.to_string(), "title is required");
}

#[test]
fn reserved_data_key_is_rejected() {
    let config = test_config(Path::new("/tmp/unused"));
    let p = payload(json!({"title": "X", "data": {"id": "spoof"}}));
    let err = validation::validate(&p, &config.policy).unwrap_err();
    assert!(err.to_string().contains("id"));
}

#[test]
fn hostile_title_lands_inside_storage_root() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let result = accept(
        &config,
        payload(json!({"title": "../../etc/passwd", "data": {"a": 1}})),
    );

    assert!(result.path.starts_with(dir.path()));
    assert!(result.path.is_file());

    let file_name = result.path.file_name().unwrap().to_string_lossy();
    assert!(!file_name.contains('/'));
    assert!(!file_name.contains(".."));

    // Nothing escaped the root
    assert!(!Path::new("/etc/passwd.json").exists());
}

#[test]
fn oversized_string_is_rejected() {
    let config = test_config(Path::new("/tmp/unused"));
    let p = payload(json!({"title": "t", "data": {"field": "x".repeat(15_000)}}));
    let err = validation::validate(&p, &config.policy).unwrap_err();
    assert!(err.to_string().contains("string length"));
}

#[test]
fn nesting_depth_boundary_is_exact() {
    let config = test_config(Path::new("/tmp/unused"));

    // Five levels of nested objects with a limit of five passes
    let p = payload(json!({"title": "t", "data": nested_objects(5)}));
    assert!(validation::validate(&p, &config.policy).is_ok());

    // One level deeper fails
    let p = payload(json!({"title": "t", "data": nested_objects(6)}));
    let err = validation::validate(&p, &config.policy).unwrap_err();
    assert!(err.to_string().contains("nesting depth"));
}

#[test]
fn repeated_persists_never_collide() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let first = accept(&config, payload(json!({"title": "Same", "data": {"a": 1}})));
    let second = accept(&config, payload(json!({"title": "Same", "data": {"a": 2}})));

    assert_ne!(first.path, second.path);
    assert!(first.path.is_file());
    assert!(second.path.is_file());
}

#[test]
fn filename_follows_convention() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let result = accept(
        &config,
        payload(json!({"title": "Build Report", "data": {"a": 1}})),
    );

    let file_name = result.path.file_name().unwrap().to_string_lossy();
    // YYYY-MM-DD_HH-MM-SS_<id>_<title prefix>.json
    assert!(file_name.ends_with("_Build_Report.json"));
    let date_part = &file_name[..10];
    assert_eq!(date_part.len(), 10);
    assert!(date_part.chars().all(|c| c.is_ascii_digit() || c == '-'));
}

#[test]
fn capacity_check_reports_available_bytes() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("storage");
    let config = test_config(&root);

    let available = store::check_capacity(&config).unwrap();
    assert!(available > 0);
    assert!(root.is_dir());
}

#[test]
fn decode_validate_persist_pipeline() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let body = br#"{"title": "From Bytes", "data": {"n": 7}}"#;
    let mut p = Payload::from_json_bytes(body).unwrap();
    validation::validate(&p, &config.policy).unwrap();
    let result = store::persist(&mut p, &config).unwrap();

    let reread: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&result.path).unwrap()).unwrap();
    assert_eq!(reread["data"]["n"], 7);
}

#[test]
fn no_partial_files_visible_after_failure() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.storage.max_file_size_mb = 1;

    let big = "x".repeat(9_000);
    let mut items = serde_json::Map::new();
    for i in 0..150 {
        items.insert(format!("item{}", i), json!(big));
    }
    let mut p = payload(json!({"title": "too big", "data": items}));

    assert!(store::persist(&mut p, &config).is_err());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
