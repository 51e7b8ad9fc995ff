/*!
 * Request Documents
 * JSON decision requests for the line-oriented front end
 */

use super::errors::DocumentResult;
use super::value::{infer_value, shape, to_value};
use crate::expr::AttributeAssignment;
use crate::value::Symbols;
use serde_json::Value as Json;

/// Parse `{"attribute": value, ...}` into request attributes
///
/// Declared attributes are converted to their declared type; anything else
/// must be a bare boolean, number or string.
pub fn parse_request(data: &[u8], symbols: &Symbols) -> DocumentResult<Vec<AttributeAssignment>> {
    let json: Json = serde_json::from_slice(data)?;
    let Json::Object(map) = &json else {
        return Err(shape("request", "an object of attributes", &json));
    };

    map.iter()
        .map(|(id, value)| {
            let path = format!("request/{id}");
            let value = match symbols.attribute(id) {
                Some(attribute) => to_value(attribute.value_type(), value, &path)?,
                None => infer_value(value, &path)?,
            };
            Ok(AttributeAssignment::new(id.clone(), value))
        })
        .collect()
}
