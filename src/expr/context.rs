/*!
 * Decision Context
 * Request attributes plus a snapshot of local content
 */

use super::errors::{EvalError, EvalResult};
use crate::content::{ContentError, LocalContentStorage};
use crate::value::{AttributeValue, ValueType};
use std::sync::Arc;

/// Everything a decision can read
///
/// Built per request. The content handle is the snapshot current when the
/// request arrived and stays fixed for the whole evaluation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    attributes: ahash::HashMap<String, AttributeValue>,
    content: Option<Arc<LocalContentStorage>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: Arc<LocalContentStorage>) -> Self {
        Self {
            attributes: Default::default(),
            content: Some(content),
        }
    }

    /// Build from request attributes; a repeated ID keeps the last value
    pub fn from_attributes<I>(attributes: I, content: Option<Arc<LocalContentStorage>>) -> Self
    where
        I: IntoIterator<Item = (String, AttributeValue)>,
    {
        Self {
            attributes: attributes.into_iter().collect(),
            content,
        }
    }

    pub fn put(&mut self, id: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        self.attributes.insert(id.into(), value)
    }

    /// Typed attribute lookup
    pub fn get(&self, id: &str, ty: &ValueType) -> EvalResult<&AttributeValue> {
        let value = self
            .attributes
            .get(id)
            .ok_or_else(|| EvalError::MissingValue(id.to_string()))?;
        if !value.is_of(ty) {
            return Err(EvalError::TypeMismatch {
                id: id.to_string(),
                expected: ty.to_string(),
                actual: value.value_type().to_string(),
            });
        }
        Ok(value)
    }

    pub fn content(&self) -> EvalResult<&LocalContentStorage> {
        self.content
            .as_deref()
            .ok_or(EvalError::Content(ContentError::NoStorage))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
