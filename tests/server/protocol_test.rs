/*!
 * Control Plane Protocol Tests
 * Stage, upload, apply and abort through the public decision point
 */

use bytes::Bytes;
use futures::executor::block_on;
use futures::{stream, FutureExt, StreamExt};
use pdp::expr::AttributeAssignment;
use pdp::policy::Effect;
use pdp::value::AttributeValue;
use pdp::{Pdp, PdpConfig, SerializableError, ServerError};
use uuid::Uuid;

const ALLOW_ALL: &str = r#"{"policies": {"id": "root", "rules": [{"id": "all", "effect": "permit"}]}}"#;

fn pdp_with(max_staged: usize, max_upload_bytes: usize) -> Pdp {
    Pdp::new(PdpConfig {
        max_staged,
        max_upload_bytes,
        ..PdpConfig::default()
    })
}

fn push_policy(pdp: &Pdp, from: Option<Uuid>, to: Option<Uuid>, text: &str) -> Result<Option<Uuid>, ServerError> {
    let id = pdp.stage_policy(from, to)?;
    pdp.upload(id, text.as_bytes())?;
    pdp.apply(id)
}

fn anything() -> Vec<AttributeAssignment> {
    vec![AttributeAssignment::new("x", AttributeValue::Integer(1))]
}

#[test]
fn test_queue_overflow_and_recovery() {
    let pdp = pdp_with(2, 1024);
    let first = pdp.stage_policy(None, None).unwrap();
    pdp.stage_content("c", None, None).unwrap();

    let err = pdp.stage_policy(None, None).unwrap_err();
    assert!(matches!(err, ServerError::QueueOverflow { capacity: 2 }));
    assert_eq!(SerializableError::from(err).error_type, "queue_overflow");

    pdp.abort(first).unwrap();
    assert!(pdp.stage_policy(None, None).is_ok());
}

#[test]
fn test_unknown_staged_id() {
    let pdp = pdp_with(4, 1024);
    assert!(matches!(pdp.upload(77, b"{}"), Err(ServerError::UnknownStagedId(77))));
    assert!(matches!(pdp.apply(77), Err(ServerError::UnknownStagedId(77))));
    assert!(matches!(pdp.abort(77), Err(ServerError::UnknownStagedId(77))));
}

#[test]
fn test_oversized_upload_is_discarded() {
    let pdp = pdp_with(4, 16);
    let id = pdp.stage_policy(None, None).unwrap();
    let err = pdp.upload(id, ALLOW_ALL.as_bytes()).unwrap_err();
    assert!(matches!(err, ServerError::UploadTooLarge { limit: 16, .. }));
    assert_eq!(pdp.staged_len(), 0);
    assert_eq!(pdp.decide(anything()).effect, Effect::NotApplicable);
}

#[test]
fn test_chunked_upload() {
    let pdp = pdp_with(4, 1024);
    let id = pdp.stage_policy(None, None).unwrap();
    for chunk in ALLOW_ALL.as_bytes().chunks(7) {
        pdp.upload(id, chunk).unwrap();
    }
    pdp.apply(id).unwrap();
    assert_eq!(pdp.decide(anything()).effect, Effect::Permit);
}

#[test]
fn test_streamed_upload_over_limit() {
    let pdp = pdp_with(4, 32);
    let id = pdp.stage_policy(None, None).unwrap();
    let chunks = stream::iter(
        ALLOW_ALL
            .as_bytes()
            .chunks(8)
            .map(|c| Ok::<_, std::io::Error>(Bytes::copy_from_slice(c)))
            .collect::<Vec<_>>(),
    );
    let err = block_on(pdp.upload_stream(id, chunks)).unwrap_err();
    assert!(matches!(err, ServerError::UploadTooLarge { .. }));
    assert_eq!(pdp.staged_len(), 0);
}

#[test]
fn test_concurrent_updates_from_same_tag() {
    let pdp = pdp_with(4, 4096);
    let t0 = Uuid::new_v4();
    push_policy(&pdp, None, Some(t0), ALLOW_ALL).unwrap();

    let add = |id: &str| format!(r#"[{{"op": "add", "path": ["root"], "entity": {{"id": "{id}", "effect": "deny"}}}}]"#);
    let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
    let first = pdp.stage_policy(Some(t0), Some(t1)).unwrap();
    let second = pdp.stage_policy(Some(t0), Some(t2)).unwrap();
    pdp.upload(first, add("one").as_bytes()).unwrap();
    pdp.upload(second, add("two").as_bytes()).unwrap();

    assert_eq!(pdp.apply(first).unwrap(), Some(t1));
    let err = pdp.apply(second).unwrap_err();
    assert!(err.is_tag_mismatch());
    assert_eq!(err.code(), "tag_mismatch");
    assert_eq!(pdp.policy_tag(), Some(t1));
}

#[test]
fn test_missing_to_tag_is_rejected_at_staging() {
    let pdp = pdp_with(4, 1024);
    let err = pdp.stage_policy(Some(Uuid::new_v4()), None).unwrap_err();
    assert_eq!(err.code(), "storage");
    assert_eq!(pdp.staged_len(), 0);
}

#[test]
fn test_policy_and_content_tags_are_independent() {
    let pdp = pdp_with(4, 4096);
    let (p0, c0) = (Uuid::new_v4(), Uuid::new_v4());
    push_policy(&pdp, None, Some(p0), ALLOW_ALL).unwrap();

    let id = pdp.stage_content("users", None, Some(c0)).unwrap();
    pdp.upload(id, br#"{"id": "users", "items": {}}"#).unwrap();
    pdp.apply(id).unwrap();

    assert_eq!(pdp.policy_tag(), Some(p0));
    assert_eq!(pdp.content_tag("users"), Some(c0));

    // A content update from the policy tag is stale
    let id = pdp.stage_content("users", Some(p0), Some(Uuid::new_v4())).unwrap();
    pdp.upload(id, b"[]").unwrap();
    assert!(pdp.apply(id).unwrap_err().is_tag_mismatch());
    assert_eq!(pdp.content_tag("users"), Some(c0));
}

#[test]
fn test_cancelled_stream_frees_its_slot() {
    let pdp = pdp_with(1, 1024);
    let id = pdp.stage_policy(None, None).unwrap();
    let chunks = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(b"{"))]).chain(stream::pending());

    let upload = pdp.upload_stream(id, chunks);
    assert!(upload.now_or_never().is_none());

    assert_eq!(pdp.staged_len(), 0);
    assert!(matches!(pdp.apply(id), Err(ServerError::UnknownStagedId(_))));
    push_policy(&pdp, None, None, ALLOW_ALL).unwrap();
    assert_eq!(pdp.decide(anything()).effect, Effect::Permit);
}
