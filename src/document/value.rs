/*!
 * Literal Values
 * JSON literals to typed attribute values
 */

use super::errors::{AtPath, DocumentError, DocumentResult};
use crate::value::{
    parse_network, AttributeValue, Domain, DomainSet, FlagsValue, NetworkSet, StringSet, ValueType,
};
use serde_json::Value as Json;

/// Convert a JSON literal to a value of `ty`
///
/// Scalars may be written as their JSON type or as text; collections and
/// flags are arrays of strings.
pub(super) fn to_value(ty: &ValueType, json: &Json, path: &str) -> DocumentResult<AttributeValue> {
    match (ty, json) {
        (ValueType::Boolean, Json::Bool(b)) => Ok(AttributeValue::Boolean(*b)),
        (ValueType::Integer, Json::Number(n)) => n
            .as_i64()
            .map(AttributeValue::Integer)
            .ok_or_else(|| shape(path, "a 64-bit integer", json)),
        (ValueType::Float, Json::Number(n)) => n
            .as_f64()
            .map(AttributeValue::Float)
            .ok_or_else(|| shape(path, "a float", json)),
        (ValueType::SetOfStrings, Json::Array(items)) => {
            Ok(AttributeValue::SetOfStrings(strings(items, path)?.into_iter().collect::<StringSet>()))
        }
        (ValueType::ListOfStrings, Json::Array(items)) => {
            Ok(AttributeValue::ListOfStrings(strings(items, path)?))
        }
        (ValueType::SetOfNetworks, Json::Array(items)) => {
            let mut set = NetworkSet::new();
            for text in strings(items, path)? {
                set.insert(parse_network(&text).at(path)?);
            }
            Ok(AttributeValue::SetOfNetworks(set))
        }
        (ValueType::SetOfDomains, Json::Array(items)) => {
            let mut set = DomainSet::new();
            for text in strings(items, path)? {
                set.insert(Domain::parse(&text).at(path)?);
            }
            Ok(AttributeValue::SetOfDomains(set))
        }
        (ValueType::Flags(flags_type), Json::Array(items)) => {
            let names = strings(items, path)?;
            FlagsValue::from_names(flags_type.clone(), names)
                .map(AttributeValue::Flags)
                .at(path)
        }
        (_, Json::String(text)) => AttributeValue::parse(ty, text).at(path),
        (_, other) => Err(shape(path, ty.name(), other)),
    }
}

/// Infer a value from a bare JSON scalar
pub(super) fn infer_value(json: &Json, path: &str) -> DocumentResult<AttributeValue> {
    match json {
        Json::Bool(b) => Ok(AttributeValue::Boolean(*b)),
        Json::String(s) => Ok(AttributeValue::String(s.clone())),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(AttributeValue::Integer(i)),
            None => n
                .as_f64()
                .map(AttributeValue::Float)
                .ok_or_else(|| shape(path, "a number", json)),
        },
        other => Err(shape(path, "a boolean, number or string", other)),
    }
}

fn strings(items: &[Json], path: &str) -> DocumentResult<Vec<String>> {
    items
        .iter()
        .map(|item| match item {
            Json::String(s) => Ok(s.clone()),
            other => Err(shape(path, "a string", other)),
        })
        .collect()
}

pub(super) fn shape(path: &str, expected: impl Into<String>, found: &Json) -> DocumentError {
    DocumentError::Shape {
        path: path.to_string(),
        expected: expected.into(),
        found: json_kind(found),
    }
}

pub(super) fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
