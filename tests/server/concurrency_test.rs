/*!
 * Concurrency Tests
 * Decisions racing wholesale policy replacement
 */

use pdp::expr::AttributeAssignment;
use pdp::policy::Effect;
use pdp::value::AttributeValue;
use pdp::{Pdp, PdpConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use uuid::Uuid;

/// Policy generation `name`: every field of the response names it
fn generation(name: &str, effect: &str) -> String {
    format!(
        r#"{{
        "policies": {{
            "id": "root",
            "alg": "permitOverrides",
            "policies": [{{
                "id": "p",
                "alg": "denyOverrides",
                "rules": [
                    {{"id": "a", "effect": "{effect}",
                      "obligations": [{{"id": "first", "expr": {{"val": {{"type": "string", "content": "{name}"}}}}}}]}},
                    {{"id": "b", "effect": "{effect}",
                      "obligations": [{{"id": "second", "expr": {{"val": {{"type": "string", "content": "{name}"}}}}}}]}}
                ]
            }}]
        }}
    }}"#
    )
}

fn replace(pdp: &Pdp, text: &str) {
    let id = pdp.stage_policy(None, Some(Uuid::new_v4())).unwrap();
    pdp.upload(id, text.as_bytes()).unwrap();
    pdp.apply(id).unwrap();
}

#[test]
fn test_replace_never_mixes_generations() {
    let pdp = Pdp::new(PdpConfig::default());
    let old = generation("old", "permit");
    let new = generation("new", "deny");
    replace(&pdp, &old);

    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let request = vec![AttributeAssignment::new("x", AttributeValue::Boolean(true))];
                while !done.load(Ordering::Acquire) {
                    let response = pdp.decide(request.clone());
                    let expected = match response.effect {
                        Effect::Permit => "old",
                        Effect::Deny => "new",
                        other => panic!("unexpected effect {other}"),
                    };
                    assert_eq!(response.obligations.len(), 2);
                    for obligation in &response.obligations {
                        assert_eq!(obligation.value, AttributeValue::String(expected.into()));
                    }
                }
            });
        }

        for i in 0..200 {
            replace(&pdp, if i % 2 == 0 { &new } else { &old });
        }
        done.store(true, Ordering::Release);
    });
}

#[test]
fn test_snapshot_outlives_replace() {
    let pdp = Pdp::new(PdpConfig::default());
    replace(&pdp, &generation("old", "permit"));

    let snapshot = pdp.policy();
    replace(&pdp, &generation("new", "deny"));

    let ctx = pdp::expr::Context::new();
    assert_eq!(snapshot.calculate(&ctx).effect, Effect::Permit);
    assert_eq!(pdp.policy().calculate(&ctx).effect, Effect::Deny);
}
