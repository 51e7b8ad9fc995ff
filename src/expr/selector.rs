/*!
 * Content Selectors
 * Typed lookups into local content storage
 */

use super::context::Context;
use super::errors::{BuildError, BuildResult, EvalError, EvalResult};
use super::expression::Expression;
use crate::value::{AttributeValue, Kind, ValueType};
use std::fmt;

const LOCAL_SCHEME: &str = "local:";

/// Selector of a value from a content item
///
/// The URI names the content and item as `local:<content>/<item>`; path
/// expressions produce the item's keys.
#[derive(Debug, Clone)]
pub struct Selector {
    content_id: String,
    item_id: String,
    path: Vec<Expression>,
    ty: ValueType,
}

impl Selector {
    pub fn new(uri: &str, path: Vec<Expression>, ty: ValueType) -> BuildResult<Self> {
        let (content_id, item_id) = parse_uri(uri)?;

        if path.is_empty() {
            return Err(BuildError::InvalidSelector(format!("{uri}: path is empty")));
        }
        for element in &path {
            let kind = element.kind();
            if !matches!(kind, Kind::String | Kind::Address | Kind::Network | Kind::Domain) {
                return Err(BuildError::InvalidSelector(format!(
                    "{uri}: {kind} can't be a path element"
                )));
            }
        }

        Ok(Self {
            content_id: content_id.to_string(),
            item_id: item_id.to_string(),
            path,
            ty,
        })
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn path(&self) -> &[Expression] {
        &self.path
    }

    pub fn value_type(&self) -> &ValueType {
        &self.ty
    }

    pub fn evaluate<'a>(&'a self, ctx: &'a Context) -> EvalResult<&'a AttributeValue> {
        let keys = self
            .path
            .iter()
            .map(|element| element.evaluate(ctx).map(|value| value.into_owned()))
            .collect::<EvalResult<Vec<_>>>()?;

        let value = ctx
            .content()?
            .lookup(&self.content_id, &self.item_id, &keys)?;

        if !value.is_of(&self.ty) {
            return Err(EvalError::TypeMismatch {
                id: self.to_string(),
                expected: self.ty.to_string(),
                actual: value.value_type().to_string(),
            });
        }
        Ok(value)
    }
}

fn parse_uri(uri: &str) -> BuildResult<(&str, &str)> {
    let rest = uri
        .strip_prefix(LOCAL_SCHEME)
        .ok_or_else(|| BuildError::InvalidSelector(format!("{uri}: only local content is supported")))?;

    match rest.split_once('/') {
        Some((content, item)) if !content.is_empty() && !item.is_empty() && !item.contains('/') => {
            Ok((content, item))
        }
        _ => Err(BuildError::InvalidSelector(format!(
            "{uri}: expected local:<content>/<item>"
        ))),
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LOCAL_SCHEME}{}/{}", self.content_id, self.item_id)
    }
}
