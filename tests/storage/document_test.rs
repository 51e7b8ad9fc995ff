/*!
 * Document Loading Tests
 * Policy and content documents read from disk
 */

use pdp::document::{load_content_file, load_policy_file, DocumentError};
use pdp::expr::AttributeAssignment;
use pdp::policy::Effect;
use pdp::value::AttributeValue;
use pdp::{Pdp, PdpConfig};
use std::fs;
use tempfile::TempDir;
use uuid::Uuid;

const POLICY: &str = r#"{
    "tag": "6a2f6f6e-3f0b-4bd4-9d0a-0c6f3f1c1b5e",
    "attributes": {"user": "string"},
    "policies": {
        "id": "root",
        "alg": {
            "id": "mapper",
            "map": {"selector": {"uri": "local:users/roles", "path": [{"attr": "user"}], "type": "string"}},
            "error": "unknown"
        },
        "rules": [
            {"id": "admin", "effect": "permit"},
            {"id": "guest", "effect": "deny"},
            {"id": "unknown", "effect": "deny"}
        ]
    }
}"#;

const USERS: &str = r#"{
    "id": "users",
    "items": {
        "roles": {"type": "string", "keys": ["string"], "data": {"alice": "admin", "bob": "guest"}}
    }
}"#;

fn write(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn user(name: &str) -> Vec<AttributeAssignment> {
    vec![AttributeAssignment::new("user", AttributeValue::String(name.into()))]
}

#[test]
fn test_load_documents() {
    let dir = TempDir::new().unwrap();
    let policy = load_policy_file(write(&dir, "policy.json", POLICY)).unwrap();
    assert_eq!(
        policy.tag(),
        Some(Uuid::parse_str("6a2f6f6e-3f0b-4bd4-9d0a-0c6f3f1c1b5e").unwrap())
    );

    let content = load_content_file(write(&dir, "users.json", USERS)).unwrap();
    assert_eq!(content.id(), "users");
    assert_eq!(content.len(), 1);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");
    let err = load_policy_file(&missing).unwrap_err();
    assert!(matches!(err, DocumentError::Io { ref path, .. } if path.ends_with("absent.json")));
}

#[test]
fn test_pdp_loads_configured_documents() {
    let dir = TempDir::new().unwrap();
    let config = PdpConfig {
        policy_path: Some(write(&dir, "policy.json", POLICY)),
        content_paths: vec![write(&dir, "users.json", USERS)],
        ..PdpConfig::default()
    };
    let pdp = Pdp::load(config).unwrap();

    assert_eq!(pdp.decide(user("alice")).effect, Effect::Permit);
    assert_eq!(pdp.decide(user("bob")).effect, Effect::Deny);

    // Lookup miss goes to the error rule with the miss as status
    let response = pdp.decide(user("mallory"));
    assert_eq!(response.effect, Effect::Deny);
    assert!(response.status.is_some());
}

#[test]
fn test_pdp_load_rejects_bad_content() {
    let dir = TempDir::new().unwrap();
    let config = PdpConfig {
        content_paths: vec![write(&dir, "bad.json", r#"{"id": "x", "items": {"i": {"type": "color", "data": 1}}}"#)],
        ..PdpConfig::default()
    };
    let err = Pdp::load(config).unwrap_err();
    assert_eq!(err.code(), "invalid_document");
}
