/*!
 * Expressions
 * Literals, attribute designators, content selectors and function calls
 */

use super::context::Context;
use super::errors::{EvalError, EvalResult};
use super::functions::Function;
use super::selector::Selector;
use crate::value::{Attribute, AttributeValue, Kind, ValueType};
use std::borrow::Cow;
use std::fmt;

/// Expression tree node
///
/// Evaluation borrows literals, request attributes and content values
/// whenever it can; only function results are freshly allocated.
#[derive(Debug, Clone)]
pub enum Expression {
    Value(AttributeValue),
    Designator(Attribute),
    Selector(Selector),
    Function(Function),
}

impl Expression {
    pub fn value(value: AttributeValue) -> Self {
        Expression::Value(value)
    }

    pub fn designator(attribute: Attribute) -> Self {
        Expression::Designator(attribute)
    }

    /// Type of every value the expression can produce
    pub fn result_type(&self) -> ValueType {
        match self {
            Expression::Value(value) => value.value_type(),
            Expression::Designator(attribute) => attribute.value_type().clone(),
            Expression::Selector(selector) => selector.value_type().clone(),
            Expression::Function(function) => function.result_type().clone(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Expression::Value(value) => value.kind(),
            Expression::Designator(attribute) => attribute.kind(),
            Expression::Selector(selector) => selector.value_type().kind(),
            Expression::Function(function) => function.result_type().kind(),
        }
    }

    /// True for designators and selectors, the operands a match may look up
    pub fn is_lookup(&self) -> bool {
        matches!(self, Expression::Designator(_) | Expression::Selector(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Value(_))
    }

    pub fn evaluate<'a>(&'a self, ctx: &'a Context) -> EvalResult<Cow<'a, AttributeValue>> {
        match self {
            Expression::Value(value) => Ok(Cow::Borrowed(value)),
            Expression::Designator(attribute) => ctx
                .get(attribute.id(), attribute.value_type())
                .map(Cow::Borrowed),
            Expression::Selector(selector) => selector.evaluate(ctx).map(Cow::Borrowed),
            Expression::Function(function) => function.evaluate(ctx).map(Cow::Owned),
        }
    }

    /// Evaluate an expression known to be boolean
    pub fn evaluate_bool(&self, ctx: &Context) -> EvalResult<bool> {
        let value = self.evaluate(ctx)?;
        value.as_bool().ok_or(EvalError::UnexpectedKind {
            context: "boolean expression",
            expected: Kind::Boolean,
            actual: value.kind(),
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Value(value) => f.write_str(&value.describe()),
            Expression::Designator(attribute) => write!(f, "attr({})", attribute.id()),
            Expression::Selector(selector) => fmt::Display::fmt(selector, f),
            Expression::Function(function) => fmt::Display::fmt(function, f),
        }
    }
}

impl From<AttributeValue> for Expression {
    fn from(value: AttributeValue) -> Self {
        Expression::Value(value)
    }
}

impl From<Attribute> for Expression {
    fn from(attribute: Attribute) -> Self {
        Expression::Designator(attribute)
    }
}

impl From<Selector> for Expression {
    fn from(selector: Selector) -> Self {
        Expression::Selector(selector)
    }
}

impl From<Function> for Expression {
    fn from(function: Function) -> Self {
        Expression::Function(function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_and_designator() {
        let mut ctx = Context::new();
        ctx.put("s", AttributeValue::String("x".into()));

        let literal = Expression::value(AttributeValue::Integer(1));
        assert_eq!(literal.evaluate(&ctx).unwrap().as_ref(), &AttributeValue::Integer(1));
        assert!(matches!(literal.evaluate(&ctx).unwrap(), Cow::Borrowed(_)));

        let designator = Expression::designator(Attribute::new("s", ValueType::String));
        assert_eq!(designator.evaluate(&ctx).unwrap().as_str(), Some("x"));
        assert!(designator.is_lookup());

        let missing = Expression::designator(Attribute::new("t", ValueType::String));
        assert_eq!(missing.evaluate(&ctx), Err(EvalError::MissingValue("t".into())));
    }

    #[test]
    fn test_evaluate_bool_rejects_other_kinds() {
        let ctx = Context::new();
        let literal = Expression::value(AttributeValue::String("true".into()));
        assert!(matches!(
            literal.evaluate_bool(&ctx),
            Err(EvalError::UnexpectedKind { .. })
        ));
    }
}
