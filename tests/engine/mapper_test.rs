/*!
 * Mapper Tests
 * Routing by a domain-to-tags content table
 */

use pdp::content::LocalContentStorage;
use pdp::document::{parse_content, parse_policy};
use pdp::expr::{AttributeAssignment, Context};
use pdp::policy::Effect;
use pdp::storage::PolicyStorage;
use pdp::value::{AttributeValue, Domain};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const TAGS: &str = r#"{
    "id": "dns",
    "items": {
        "domain-tags": {
            "type": "set of strings",
            "keys": ["domain"],
            "data": {
                "allowed.com": ["AllowRule"],
                "blocked.com": ["BlockRule"],
                "mixed.com": ["AllowRule", "BlockRule"],
                "ordered.com": ["BlockRule", "AllowRule"],
                "stale.com": ["RetiredRule"],
                "quiet.com": ["LogRule", "AllowRule"]
            }
        }
    }
}"#;

/// Mapper policy over five rules; `ALG` and `ORDER` are substituted per test
const MAPPER: &str = r#"{
    "attributes": {"domain": "domain", "rule": "string"},
    "policies": {
        "id": "root",
        "alg": {
            "id": "mapper",
            "map": {"call": {"name": "try", "args": [
                {"selector": {"uri": "local:dns/domain-tags", "path": [{"attr": "domain"}], "type": "set of strings"}},
                {"val": {"type": "set of strings", "content": []}}
            ]}},
            "order": "ORDER",
            "default": "DefaultRule",
            "alg": "ALG"
        },
        "rules": [
            {"id": "AllowRule", "effect": "permit",
             "obligations": [{"id": "rule", "expr": {"val": {"type": "string", "content": "allow"}}}]},
            {"id": "BlockRule", "effect": "deny",
             "obligations": [{"id": "rule", "expr": {"val": {"type": "string", "content": "block"}}}]},
            {"id": "LogRule", "effect": "permit",
             "condition": {"val": {"type": "boolean", "content": false}}},
            {"id": "RedirectRule", "effect": "deny",
             "obligations": [{"id": "rule", "expr": {"val": {"type": "string", "content": "redirect"}}}]},
            {"id": "DefaultRule", "effect": "permit",
             "obligations": [{"id": "rule", "expr": {"val": {"type": "string", "content": "default"}}}]}
        ]
    }
}"#;

const GUARDED_MAP: &str = r#"{"call": {"name": "try", "args": [
                {"selector": {"uri": "local:dns/domain-tags", "path": [{"attr": "domain"}], "type": "set of strings"}},
                {"val": {"type": "set of strings", "content": []}}
            ]}}"#;

const BARE_MAP: &str =
    r#"{"selector": {"uri": "local:dns/domain-tags", "path": [{"attr": "domain"}], "type": "set of strings"}}"#;

fn policy(alg: &str, order: &str) -> PolicyStorage {
    let text = MAPPER.replace("ALG", alg).replace("ORDER", order);
    parse_policy(text.as_bytes(), None).unwrap()
}

/// Same tree with the selector as the whole routing argument
fn bare_policy(alg: &str) -> PolicyStorage {
    let text = MAPPER
        .replace(GUARDED_MAP, BARE_MAP)
        .replace("ALG", alg)
        .replace("ORDER", "internal");
    assert!(!text.contains("\"try\""));
    parse_policy(text.as_bytes(), None).unwrap()
}

fn content() -> Arc<LocalContentStorage> {
    Arc::new(LocalContentStorage::new([parse_content(TAGS.as_bytes(), None).unwrap()]))
}

fn decide(storage: &PolicyStorage, domain: &str) -> (Effect, Vec<AttributeAssignment>) {
    let ctx = Context::from_attributes(
        [(
            "domain".to_string(),
            AttributeValue::Domain(Domain::parse(domain).unwrap()),
        )],
        Some(content()),
    );
    let response = storage.calculate(&ctx);
    (response.effect, response.obligations)
}

fn rule(name: &str) -> Vec<AttributeAssignment> {
    vec![AttributeAssignment::new("rule", AttributeValue::String(name.to_string()))]
}

#[test]
fn test_absent_domain_uses_default_rule() {
    let storage = policy("denyOverrides", "internal");
    assert_eq!(decide(&storage, "nowhere.org"), (Effect::Permit, rule("default")));
}

#[test]
fn test_tag_naming_no_rule_uses_default_rule() {
    let storage = policy("denyOverrides", "internal");
    assert_eq!(decide(&storage, "stale.com"), (Effect::Permit, rule("default")));
}

#[test]
fn test_single_tag_routes_to_its_rule() {
    let storage = policy("denyOverrides", "internal");
    assert_eq!(decide(&storage, "allowed.com"), (Effect::Permit, rule("allow")));
    // Parent domain entries cover subdomains
    assert_eq!(decide(&storage, "www.blocked.com"), (Effect::Deny, rule("block")));
}

#[test]
fn test_conflicting_tags_use_sub_algorithm() {
    let deny = policy("denyOverrides", "internal");
    assert_eq!(decide(&deny, "mixed.com"), (Effect::Deny, rule("block")));

    let permit = policy("permitOverrides", "internal");
    assert_eq!(decide(&permit, "mixed.com"), (Effect::Permit, rule("allow")));
}

#[test]
fn test_order_decides_first_applicable() {
    // Table lists BlockRule first, declaration lists AllowRule first
    let internal = policy("firstApplicableEffect", "internal");
    assert_eq!(decide(&internal, "ordered.com").0, Effect::Permit);

    let external = policy("firstApplicableEffect", "external");
    assert_eq!(decide(&external, "ordered.com").0, Effect::Deny);
}

#[test]
fn test_fast_order_skips_not_applicable_children() {
    let fast = policy("denyOverrides", "fast");
    assert_eq!(decide(&fast, "quiet.com"), (Effect::Permit, rule("allow")));
    assert_eq!(decide(&fast, "ordered.com"), (Effect::Deny, rule("block")));
}

#[test]
fn test_absent_domain_without_fallback_argument_uses_default_rule() {
    let storage = bare_policy("denyOverrides");
    assert_eq!(decide(&storage, "nowhere.org"), (Effect::Permit, rule("default")));
    assert_eq!(decide(&storage, "mixed.com"), (Effect::Deny, rule("block")));
}

#[test]
fn test_missing_request_attribute_uses_default_rule() {
    let storage = bare_policy("denyOverrides");
    let response = storage.calculate(&Context::from_attributes(std::iter::empty(), Some(content())));
    assert_eq!(response.effect, Effect::Permit);
    assert_eq!(response.obligations, rule("default"));
}
