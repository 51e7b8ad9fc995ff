/*!
 * Messages
 * Request and response framing on top of the value codec
 *
 * Request:  u16 count, then `count` x (u16 id length, id, kind code, payload)
 * Response: u8 effect code, u16 status length, status, then the obligations
 *           in the request tuple layout
 */

use super::errors::{WireError, WireResult};
use super::value::{decode_value, encode_value, ensure, get_string, get_u16, put_count, put_string};
use crate::core::limits::MAX_WIRE_STRING_LEN;
use crate::expr::AttributeAssignment;
use crate::policy::{Effect, Response};
use crate::value::Symbols;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

/// Decoded response as a PEP sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireResponse {
    pub effect: Effect,
    /// Empty when the decision carried no status
    pub status: String,
    pub obligations: Vec<AttributeAssignment>,
}

pub fn encode_request(attributes: &[AttributeAssignment]) -> WireResult<Bytes> {
    let mut buf = BytesMut::with_capacity(64);
    put_assignments(&mut buf, attributes)?;
    Ok(buf.freeze())
}

/// Decode request attributes, resolving flags attributes through `symbols`
pub fn decode_request(mut buf: &[u8], symbols: &Symbols) -> WireResult<Vec<AttributeAssignment>> {
    let attributes = get_assignments(&mut buf, symbols)?;
    finish(buf)?;
    Ok(attributes)
}

pub fn encode_response(response: &Response) -> WireResult<Bytes> {
    let mut buf = BytesMut::with_capacity(64);
    buf.put_u8(response.effect.code());
    let status = response.status_message();
    put_string(&mut buf, truncate(&status, MAX_WIRE_STRING_LEN), "status")?;
    put_assignments(&mut buf, &response.obligations)?;
    Ok(buf.freeze())
}

pub fn decode_response(mut buf: &[u8], symbols: &Symbols) -> WireResult<WireResponse> {
    ensure(&buf, 1, "effect code")?;
    let code = buf.get_u8();
    let effect = Effect::from_code(code).ok_or(WireError::UnknownEffect(code))?;
    let status = get_string(&mut buf, "status")?;
    let obligations = get_assignments(&mut buf, symbols)?;
    finish(buf)?;
    Ok(WireResponse {
        effect,
        status,
        obligations,
    })
}

fn put_assignments(buf: &mut BytesMut, assignments: &[AttributeAssignment]) -> WireResult<()> {
    put_count(buf, assignments.len(), "attribute list")?;
    for assignment in assignments {
        put_string(buf, &assignment.id, "attribute id")?;
        encode_value(buf, &assignment.value)?;
    }
    Ok(())
}

fn get_assignments(buf: &mut &[u8], symbols: &Symbols) -> WireResult<Vec<AttributeAssignment>> {
    let count = get_u16(buf, "attribute list")?;
    let mut assignments = Vec::with_capacity(count);
    for index in 0..count {
        let id = get_string(buf, "attribute id")?;
        let flags = symbols
            .attribute(&id)
            .and_then(|attribute| attribute.value_type().flags());
        let value = decode_value(buf, flags).map_err(|err| err.at(index, &id))?;
        assignments.push(AttributeAssignment::new(id, value));
    }
    Ok(assignments)
}

fn finish(buf: &[u8]) -> WireResult<()> {
    if buf.is_empty() {
        Ok(())
    } else {
        Err(WireError::TrailingBytes(buf.len()))
    }
}

/// Longest prefix of `text` within `limit` bytes ending on a char boundary
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::EvalError;
    use crate::value::{Attribute, AttributeValue, FlagsType, FlagsValue, ValueType};
    use pretty_assertions::assert_eq;

    fn symbols_with_flags() -> Symbols {
        let mut symbols = Symbols::new();
        let ty = symbols.put_flags_type(FlagsType::new("perm", ["read", "write"]).unwrap()).unwrap();
        symbols
            .put_attribute(Attribute::new("perm", ValueType::Flags(ty)))
            .unwrap();
        symbols
    }

    #[test]
    fn test_request_layout() {
        let bytes = encode_request(&[AttributeAssignment::new("x", AttributeValue::Boolean(false))]).unwrap();
        assert_eq!(bytes.as_ref(), &[0, 1, 0, 1, b'x', 0, 0]);
    }

    #[test]
    fn test_flags_request_uses_declared_type() {
        let symbols = symbols_with_flags();
        let ty = symbols.flags_type("perm").unwrap().clone();
        let attributes = vec![
            AttributeAssignment::new("s", AttributeValue::String("v".into())),
            AttributeAssignment::new(
                "perm",
                AttributeValue::Flags(FlagsValue::from_names(ty, ["write"]).unwrap()),
            ),
        ];
        let bytes = encode_request(&attributes).unwrap();
        assert_eq!(decode_request(&bytes, &symbols).unwrap(), attributes);

        let err = decode_request(&bytes, &Symbols::new()).unwrap_err();
        assert!(matches!(err, WireError::Attribute { index: 1, ref id, .. } if id == "perm"));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode_request(&[]).unwrap().to_vec();
        bytes.push(0);
        assert_eq!(
            decode_request(&bytes, &Symbols::new()),
            Err(WireError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_response_round_trip() {
        let mut response = Response::new(Effect::Permit)
            .with_obligations(vec![AttributeAssignment::new("log", AttributeValue::Integer(3))]);
        let bytes = encode_response(&response).unwrap();
        assert_eq!(bytes[0], Effect::Permit.code());

        let decoded = decode_response(&bytes, &Symbols::new()).unwrap();
        assert_eq!(decoded.effect, Effect::Permit);
        assert_eq!(decoded.status, "");
        assert_eq!(decoded.obligations, response.obligations);

        response = Response::indeterminate(Effect::IndeterminateP, EvalError::MissingValue("domain".into()));
        let decoded = decode_response(&encode_response(&response).unwrap(), &Symbols::new()).unwrap();
        assert_eq!(decoded.effect, Effect::IndeterminateP);
        assert!(decoded.status.contains("domain"));
    }

    #[test]
    fn test_unknown_effect_code() {
        assert_eq!(
            decode_response(&[9, 0, 0, 0, 0], &Symbols::new()),
            Err(WireError::UnknownEffect(9))
        );
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
