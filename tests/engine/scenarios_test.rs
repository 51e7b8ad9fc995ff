/*!
 * Decision Scenario Tests
 * End-to-end decisions over documents built with the JSON front end
 */

use pdp::document::parse_policy;
use pdp::expr::{AttributeAssignment, Context};
use pdp::policy::Effect;
use pdp::value::{AttributeValue, Domain};
use pretty_assertions::assert_eq;

const DOMAIN_RULE: &str = r#"{
    "attributes": {"type": "string", "domain": "domain"},
    "policies": {
        "id": "query-rule",
        "target": [[[{"call": {"name": "equal", "args": [
            {"attr": "type"}, {"val": {"type": "string", "content": "query"}}
        ]}}]]],
        "condition": {"call": {"name": "contains", "args": [
            {"val": {"type": "set of domains", "content": ["example.com"]}},
            {"attr": "domain"}
        ]}},
        "effect": "permit"
    }
}"#;

const FIRST_APPLICABLE: &str = r#"{
    "attributes": {"type": "string", "rule": "string"},
    "policies": {
        "id": "root",
        "alg": "firstApplicableEffect",
        "rules": [
            {
                "id": "deny-updates",
                "target": [[[{"call": {"name": "equal", "args": [
                    {"attr": "type"}, {"val": {"type": "string", "content": "update"}}
                ]}}]]],
                "effect": "deny",
                "obligations": [{"id": "rule", "expr": {"val": {"type": "string", "content": "deny-updates"}}}]
            },
            {
                "id": "permit-rest",
                "effect": "permit",
                "obligations": [{"id": "rule", "expr": {"val": {"type": "string", "content": "permit-rest"}}}]
            }
        ]
    }
}"#;

fn request(pairs: &[(&str, AttributeValue)]) -> Context {
    Context::from_attributes(pairs.iter().map(|(id, v)| (id.to_string(), v.clone())), None)
}

fn string(text: &str) -> AttributeValue {
    AttributeValue::String(text.to_string())
}

fn domain(text: &str) -> AttributeValue {
    AttributeValue::Domain(Domain::parse(text).unwrap())
}

#[test]
fn test_listed_domain_is_permitted() {
    let storage = parse_policy(DOMAIN_RULE.as_bytes(), None).unwrap();
    let response = storage.calculate(&request(&[("type", string("query")), ("domain", domain("example.com"))]));
    assert_eq!(response.effect, Effect::Permit);
    assert!(response.status.is_none());
}

#[test]
fn test_unlisted_domain_is_not_applicable() {
    let storage = parse_policy(DOMAIN_RULE.as_bytes(), None).unwrap();
    let response = storage.calculate(&request(&[("type", string("query")), ("domain", domain("other.com"))]));
    assert_eq!(response.effect, Effect::NotApplicable);
    assert!(response.obligations.is_empty());
}

#[test]
fn test_missing_domain_is_indeterminate_permit() {
    let storage = parse_policy(DOMAIN_RULE.as_bytes(), None).unwrap();
    let response = storage.calculate(&request(&[("type", string("query"))]));
    assert_eq!(response.effect, Effect::IndeterminateP);
    assert!(response.status_message().contains("\"domain\""));
}

#[test]
fn test_empty_context_without_matching_target() {
    let empty_set = r#"{"policies": {"id": "root", "alg": "denyOverrides", "policies": []}}"#;
    let empty_policy = r#"{"policies": {"id": "root", "alg": "permitOverrides", "rules": []}}"#;
    for document in [empty_set, empty_policy] {
        let response = parse_policy(document.as_bytes(), None).unwrap().calculate(&Context::new());
        assert_eq!(response.effect, Effect::NotApplicable);
        assert!(response.obligations.is_empty());
    }

    let storage = parse_policy(DOMAIN_RULE.as_bytes(), None).unwrap();
    let response = storage.calculate(&request(&[("type", string("update"))]));
    assert_eq!(response.effect, Effect::NotApplicable);
    assert!(response.obligations.is_empty());
}

#[test]
fn test_first_applicable_returns_only_chosen_obligations() {
    let storage = parse_policy(FIRST_APPLICABLE.as_bytes(), None).unwrap();

    let denied = storage.calculate(&request(&[("type", string("update"))]));
    assert_eq!(denied.effect, Effect::Deny);
    assert_eq!(denied.obligations, vec![AttributeAssignment::new("rule", string("deny-updates"))]);

    let permitted = storage.calculate(&request(&[("type", string("query"))]));
    assert_eq!(permitted.effect, Effect::Permit);
    assert_eq!(permitted.obligations, vec![AttributeAssignment::new("rule", string("permit-rest"))]);
}

#[test]
fn test_evaluation_errors_stay_local() {
    let document = r#"{
        "attributes": {"n": "integer"},
        "policies": {
            "id": "root",
            "alg": "denyOverrides",
            "rules": [
                {"id": "divide", "effect": "deny", "condition": {"call": {"name": "equal", "args": [
                    {"call": {"name": "divide", "args": [{"val": {"type": "integer", "content": 1}}, {"attr": "n"}]}},
                    {"val": {"type": "integer", "content": 1}}
                ]}}},
                {"id": "allow", "effect": "permit"}
            ]
        }
    }"#;
    let storage = parse_policy(document.as_bytes(), None).unwrap();

    let response = storage.calculate(&request(&[("n", AttributeValue::Integer(0))]));
    assert_eq!(response.effect, Effect::IndeterminateDP);
    assert!(response.status_message().contains("division by zero"));

    let response = storage.calculate(&request(&[("n", AttributeValue::Integer(2))]));
    assert_eq!(response.effect, Effect::Permit);
}
