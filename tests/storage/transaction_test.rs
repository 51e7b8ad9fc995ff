/*!
 * Transaction Tests
 * Tag checks, failure stickiness and structural sharing
 */

use pdp::content::{ContentEntity, ContentUpdate, LocalContentStorage};
use pdp::document::{parse_content, parse_policy};
use pdp::expr::Context;
use pdp::policy::{Effect, Evaluable, Rule, RuleEffect};
use pdp::storage::{Command, PolicyStorage, PolicyUpdate, StorageError};
use pdp::value::AttributeValue;
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

const TREE: &str = r#"{
    "policies": {
        "id": "root",
        "alg": "denyOverrides",
        "policies": [
            {"id": "p1", "rules": [{"id": "r1", "effect": "permit"}]},
            {"id": "p2", "rules": []}
        ]
    }
}"#;

fn tree(tag: Uuid) -> PolicyStorage {
    parse_policy(TREE.as_bytes(), Some(tag)).unwrap()
}

fn path(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn add_deny(from: Uuid, to: Uuid) -> PolicyUpdate {
    let mut update = PolicyUpdate::new(from, to);
    update.append(Command::add(
        path(&["root", "p2"]),
        Evaluable::from(Rule::simple("r2", RuleEffect::Deny)),
    ));
    update
}

#[test]
fn test_transaction_against_current_tag() {
    let (t0, t1) = (Uuid::new_v4(), Uuid::new_v4());
    let live = tree(t0);

    let mut tx = live.new_transaction(t0).unwrap();
    tx.apply(&add_deny(t0, t1)).unwrap();
    let next = tx.commit().unwrap();

    assert_eq!(next.tag(), Some(t1));
    assert_eq!(next.calculate(&Context::new()).effect, Effect::Deny);
    // The old tree is untouched
    assert_eq!(live.tag(), Some(t0));
    assert_eq!(live.calculate(&Context::new()).effect, Effect::Permit);
}

#[test]
fn test_untouched_subtrees_are_shared() {
    let (t0, t1) = (Uuid::new_v4(), Uuid::new_v4());
    let live = tree(t0);
    let mut tx = live.new_transaction(t0).unwrap();
    tx.apply(&add_deny(t0, t1)).unwrap();
    let next = tx.commit().unwrap();

    let (Evaluable::PolicySet(old), Evaluable::PolicySet(new)) = (live.root().as_ref(), next.root().as_ref()) else {
        panic!("root is a policy set");
    };
    assert!(Arc::ptr_eq(&old.children()[0], &new.children()[0]));
    assert!(!Arc::ptr_eq(&old.children()[1], &new.children()[1]));
}

#[test]
fn test_failed_transaction_stays_failed() {
    let (t0, t1) = (Uuid::new_v4(), Uuid::new_v4());
    let live = tree(t0);
    let mut tx = live.new_transaction(t0).unwrap();

    let mut bad = PolicyUpdate::new(t0, t1);
    bad.append(Command::delete(path(&["root", "missing"])));
    assert!(matches!(tx.apply(&bad), Err(StorageError::PathNotFound { .. })));
    assert!(tx.is_failed());

    assert!(matches!(tx.apply(&add_deny(t0, t1)), Err(StorageError::TransactionFailed(_))));
    assert!(matches!(tx.commit(), Err(StorageError::TransactionFailed(_))));
}

#[test]
fn test_untagged_storage_has_no_transactions() {
    let untagged = parse_policy(TREE.as_bytes(), None).unwrap();
    assert!(matches!(
        untagged.new_transaction(Uuid::new_v4()),
        Err(StorageError::MissingStorageTag)
    ));
}

proptest! {
    #[test]
    fn prop_stale_tag_is_rejected(seed in any::<u128>(), other in any::<u128>()) {
        prop_assume!(seed != other);
        let (t0, t1) = (Uuid::from_u128(seed), Uuid::from_u128(other));
        let live = tree(t0);

        let mut tx = live.new_transaction(t0).unwrap();
        tx.apply(&add_deny(t0, t1)).unwrap();
        let advanced = tx.commit().unwrap();

        let err = advanced.new_transaction(t0).unwrap_err();
        prop_assert!(err.is_tag_error());
        prop_assert_eq!(err, StorageError::TagMismatch { expected: t0, actual: t1 });
        prop_assert_eq!(advanced.tag(), Some(t1));
        prop_assert_eq!(advanced.calculate(&Context::new()).effect, Effect::Deny);
    }
}

#[test]
fn test_content_transactions_are_per_content() {
    let (a0, a1, b0) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let doc = |id: &str| format!(r#"{{"id": "{id}", "items": {{"names": {{"type": "string", "keys": ["string"], "data": {{}}}}}}}}"#);
    let a = parse_content(doc("a").as_bytes(), Some(a0)).unwrap();
    let b = parse_content(doc("b").as_bytes(), Some(b0)).unwrap();
    let storage = LocalContentStorage::new([a, b]);

    // The tag of "b" doesn't open "a"
    assert!(matches!(
        storage.new_transaction("a", b0),
        Err(StorageError::TagMismatch { .. })
    ));

    let mut update = ContentUpdate::new(a0, a1);
    update.append(Command::add(
        path(&["names", "k"]),
        ContentEntity::Node(pdp::content::ContentNode::Value(AttributeValue::String("v".into()))),
    ));
    let mut tx = storage.new_transaction("a", a0).unwrap();
    tx.apply(&update).unwrap();
    let next = tx.commit(&storage).unwrap();

    assert_eq!(next.tag("a"), Some(a1));
    assert_eq!(next.tag("b"), Some(b0));
    assert_eq!(
        next.get("a", "names", &[AttributeValue::String("k".into())]),
        Some(&AttributeValue::String("v".into()))
    );
    assert!(storage.get("a", "names", &[AttributeValue::String("k".into())]).is_none());
}
