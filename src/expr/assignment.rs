/*!
 * Attribute Assignments
 * Obligation declarations and their resolved values
 */

use super::context::Context;
use super::errors::{BuildError, BuildResult, EvalResult};
use super::expression::Expression;
use crate::value::{Attribute, AttributeValue};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;

/// Declared obligation: an attribute and the expression giving its value
#[derive(Debug, Clone)]
pub struct AttributeAssignmentExpression {
    attribute: Attribute,
    expr: Expression,
}

impl AttributeAssignmentExpression {
    pub fn new(attribute: Attribute, expr: Expression) -> BuildResult<Self> {
        let actual = expr.result_type();
        if &actual != attribute.value_type() {
            return Err(BuildError::ObligationType {
                id: attribute.id().to_string(),
                expected: attribute.value_type().to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(Self { attribute, expr })
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    pub fn evaluate(&self, ctx: &Context) -> EvalResult<AttributeAssignment> {
        let value = self.expr.evaluate(ctx)?.into_owned();
        Ok(AttributeAssignment::new(self.attribute.id(), value))
    }
}

/// Resolved obligation
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAssignment {
    pub id: String,
    pub value: AttributeValue,
}

impl AttributeAssignment {
    pub fn new(id: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

impl fmt::Display for AttributeAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.id, self.value.describe())
    }
}

impl Serialize for AttributeAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AttributeAssignment", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", self.value.value_type().name())?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}
