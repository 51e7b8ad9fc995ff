/*!
 * Document Schema
 * Serde shapes of policy, content, update and request documents
 */

use crate::storage::UpdateOp;
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Complete policy document
///
/// ```json
/// {
///   "tag": "5f0d1a4e-...",
///   "flags": {"perm": ["read", "write"]},
///   "attributes": {"type": "string", "domain": "domain", "perm": "perm"},
///   "policies": {"id": "root", "alg": "firstApplicableEffect", "rules": [...]}
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    #[serde(default)]
    pub tag: Option<Uuid>,
    #[serde(default)]
    pub flags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub policies: RawEvaluable,
}

/// Rule, policy or policy set
///
/// The shape decides the variant: rules carry an `effect`, policies carry
/// `rules` and policy sets carry `policies`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEvaluable {
    #[serde(default)]
    pub id: Option<String>,
    /// AnyOf list, each an AllOf list, each a list of matches
    #[serde(default)]
    pub target: Vec<Vec<Vec<RawExpression>>>,
    #[serde(default)]
    pub condition: Option<RawExpression>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub alg: Option<RawAlgorithm>,
    #[serde(default)]
    pub rules: Option<Vec<RawEvaluable>>,
    #[serde(default)]
    pub policies: Option<Vec<RawEvaluable>>,
    #[serde(default)]
    pub obligations: Vec<RawObligation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", deny_unknown_fields)]
pub enum RawExpression {
    Attr(String),
    Val(RawValue),
    Selector(RawSelector),
    Call(RawCall),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawValue {
    #[serde(rename = "type")]
    pub ty: String,
    pub content: Json,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSelector {
    pub uri: String,
    pub path: Vec<RawExpression>,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<RawExpression>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawObligation {
    pub id: String,
    pub expr: RawExpression,
}

/// Algorithm by name, or a mapper with its parameters
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawAlgorithm {
    Name(String),
    Mapper(RawMapper),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMapper {
    pub id: String,
    pub map: RawExpression,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub alg: Option<Box<RawAlgorithm>>,
}

/// Named content with its items
///
/// Item data nests one JSON object per key; the innermost values are
/// written the same way as literal contents in policies.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentDocument {
    pub id: String,
    #[serde(default)]
    pub tag: Option<Uuid>,
    #[serde(default)]
    pub items: BTreeMap<String, RawItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawItem {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub keys: Vec<String>,
    pub data: Json,
}

/// One update command; tags travel with the staging request
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCommand<E> {
    pub op: UpdateOp,
    pub path: Vec<String>,
    #[serde(default = "Option::default")]
    pub entity: Option<E>,
}
