/*!
 * Rules
 * Leaves of the policy tree: target, condition, effect and obligations
 */

use super::algorithms::Combinable;
use super::effect::RuleEffect;
use super::evaluable::{describe, resolve_obligations};
use super::response::Response;
use crate::expr::{
    AttributeAssignmentExpression, BuildError, BuildResult, Context, Expression, MatchResult, Target,
};
use crate::value::Kind;

#[derive(Debug, Clone)]
pub struct Rule {
    id: Option<String>,
    target: Target,
    condition: Option<Expression>,
    effect: RuleEffect,
    obligations: Vec<AttributeAssignmentExpression>,
}

impl Rule {
    /// Build a rule; a condition must be boolean
    pub fn new(
        id: Option<String>,
        target: Target,
        condition: Option<Expression>,
        effect: RuleEffect,
        obligations: Vec<AttributeAssignmentExpression>,
    ) -> BuildResult<Self> {
        if let Some(condition) = &condition {
            if condition.kind() != Kind::Boolean {
                return Err(BuildError::ConditionNotBoolean(condition.result_type().to_string()));
            }
        }

        Ok(Self {
            id,
            target,
            condition,
            effect,
            obligations,
        })
    }

    /// Unconditional rule without target or obligations
    pub fn simple(id: impl Into<String>, effect: RuleEffect) -> Self {
        Self {
            id: Some(id.into()),
            target: Target::default(),
            condition: None,
            effect,
            obligations: Vec::new(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn condition(&self) -> Option<&Expression> {
        self.condition.as_ref()
    }

    pub fn effect(&self) -> RuleEffect {
        self.effect
    }

    pub fn obligations(&self) -> &[AttributeAssignmentExpression] {
        &self.obligations
    }
}

impl Combinable for Rule {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn calculate(&self, ctx: &Context) -> Response {
        let node = || describe("rule", self.id.as_deref());

        match self.target.evaluate(ctx) {
            MatchResult::Match => {}
            MatchResult::NoMatch => return Response::not_applicable(),
            MatchResult::Indeterminate(err) => {
                return Response::indeterminate(self.effect.indeterminate(), err.bind(node()))
            }
        }

        if let Some(condition) = &self.condition {
            match condition.evaluate_bool(ctx) {
                Ok(true) => {}
                Ok(false) => return Response::not_applicable(),
                Err(err) => return Response::indeterminate(self.effect.indeterminate(), err.bind(node())),
            }
        }

        let mut response = Response::new(self.effect.effect());
        resolve_obligations(&self.obligations, ctx, &mut response, node);
        response
    }
}
