/*!
 * Policies
 * Ordered rules combined by a rule-combining algorithm
 */

use super::algorithms::{Algorithm, Combinable};
use super::evaluable::{calculate_node, check_unique_ids, describe};
use super::response::Response;
use super::rule::Rule;
use crate::expr::{AttributeAssignmentExpression, BuildResult, Context, Target};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Policy {
    id: Option<String>,
    target: Target,
    rules: Vec<Arc<Rule>>,
    algorithm: Algorithm,
    obligations: Vec<AttributeAssignmentExpression>,
}

impl Policy {
    /// Build a policy, binding the algorithm to its rules
    pub fn new(
        id: Option<String>,
        target: Target,
        rules: Vec<Arc<Rule>>,
        mut algorithm: Algorithm,
        obligations: Vec<AttributeAssignmentExpression>,
    ) -> BuildResult<Self> {
        check_unique_ids(rules.iter().map(|rule| rule.id()))?;
        algorithm.bind(&rules)?;
        Ok(Self {
            id,
            target,
            rules,
            algorithm,
            obligations,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&Arc<Rule>> {
        self.rules.iter().find(|rule| rule.id() == Some(id))
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    pub fn obligations(&self) -> &[AttributeAssignmentExpression] {
        &self.obligations
    }

    /// Copy with a rule replaced by ID, or appended if the ID is new
    pub fn with_rule(&self, rule: Rule) -> BuildResult<Self> {
        let mut rules = self.rules.clone();
        let existing = rule
            .id()
            .and_then(|id| rules.iter().position(|r| r.id() == Some(id)));
        match existing {
            Some(pos) => rules[pos] = Arc::new(rule),
            None => rules.push(Arc::new(rule)),
        }
        self.with_rules(rules)
    }

    /// Copy without the rule with ID `id`
    pub fn without_rule(&self, id: &str) -> BuildResult<Self> {
        let rules = self
            .rules
            .iter()
            .filter(|rule| rule.id() != Some(id))
            .cloned()
            .collect();
        self.with_rules(rules)
    }

    fn with_rules(&self, rules: Vec<Arc<Rule>>) -> BuildResult<Self> {
        Self::new(
            self.id.clone(),
            self.target.clone(),
            rules,
            self.algorithm.clone(),
            self.obligations.clone(),
        )
    }
}

impl Combinable for Policy {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn calculate(&self, ctx: &Context) -> Response {
        calculate_node(
            &self.target,
            &self.rules,
            &self.algorithm,
            &self.obligations,
            ctx,
            || describe("policy", self.id.as_deref()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{AllOf, AnyOf, BuildError, Expression, Function, Match};
    use crate::policy::{Combiner, Effect, Mapper, MapperOrder, RuleEffect};
    use crate::value::{Attribute, AttributeValue, ValueType};

    fn obligation(id: &str, value: &str) -> AttributeAssignmentExpression {
        AttributeAssignmentExpression::new(
            Attribute::new(id, ValueType::String),
            Expression::value(AttributeValue::String(value.into())),
        )
        .unwrap()
    }

    fn rule(id: &str, effect: RuleEffect, obligation_value: &str) -> Arc<Rule> {
        Arc::new(
            Rule::new(
                Some(id.into()),
                Target::default(),
                None,
                effect,
                vec![obligation("rule", obligation_value)],
            )
            .unwrap(),
        )
    }

    fn missing_target() -> Target {
        let m = Match::new(
            Function::new(
                "equal",
                vec![
                    Expression::designator(Attribute::new("x", ValueType::String)),
                    Expression::value(AttributeValue::String("v".into())),
                ],
            )
            .unwrap(),
        )
        .unwrap();
        Target::new(vec![AnyOf::new(vec![AllOf::new(vec![m])])])
    }

    #[test]
    fn test_first_applicable_with_own_obligations() {
        let policy = Policy::new(
            Some("p".into()),
            Target::default(),
            vec![rule("a", RuleEffect::Deny, "a"), rule("b", RuleEffect::Permit, "b")],
            Combiner::FirstApplicableEffect.into(),
            vec![obligation("policy", "p")],
        )
        .unwrap();

        let response = policy.calculate(&Context::new());
        assert_eq!(response.effect, Effect::Deny);
        let ids: Vec<_> = response.obligations.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["rule", "policy"]);
        assert_eq!(response.obligations[0].value.as_str(), Some("a"));
    }

    #[test]
    fn test_no_obligations_when_not_decisive() {
        let policy = Policy::new(
            None,
            Target::default(),
            vec![],
            Combiner::DenyOverrides.into(),
            vec![obligation("policy", "p")],
        )
        .unwrap();
        let response = policy.calculate(&Context::new());
        assert_eq!(response.effect, Effect::NotApplicable);
        assert!(response.obligations.is_empty());
    }

    #[test]
    fn test_target_error_degrades_result() {
        let policy = Policy::new(
            Some("p".into()),
            missing_target(),
            vec![rule("a", RuleEffect::Permit, "a")],
            Combiner::DenyOverrides.into(),
            vec![],
        )
        .unwrap();
        let response = policy.calculate(&Context::new());
        assert_eq!(response.effect, Effect::IndeterminateP);
        assert!(response.obligations.is_empty());
        assert!(response.status_message().contains("\"x\""));

        let empty = Policy::new(None, missing_target(), vec![], Combiner::DenyOverrides.into(), vec![]).unwrap();
        assert_eq!(empty.calculate(&Context::new()).effect, Effect::NotApplicable);
    }

    #[test]
    fn test_duplicate_rules_rejected() {
        let result = Policy::new(
            None,
            Target::default(),
            vec![rule("a", RuleEffect::Permit, "1"), rule("a", RuleEffect::Deny, "2")],
            Combiner::DenyOverrides.into(),
            vec![],
        );
        assert!(matches!(result, Err(BuildError::DuplicateChild(_))));
    }

    #[test]
    fn test_with_and_without_rule_rebind_mapper() {
        let argument = Expression::designator(Attribute::new("name", ValueType::String));
        let mapper = Mapper::new(argument, MapperOrder::Internal, Some("a".into()), None, None).unwrap();
        let policy = Policy::new(
            None,
            Target::default(),
            vec![rule("a", RuleEffect::Deny, "a")],
            mapper.into(),
            vec![],
        )
        .unwrap();

        let updated = policy.with_rule(Rule::simple("b", RuleEffect::Permit)).unwrap();
        let mut ctx = Context::new();
        ctx.put("name", AttributeValue::String("b".into()));
        assert_eq!(updated.calculate(&ctx).effect, Effect::Permit);
        assert_eq!(policy.calculate(&ctx).effect, Effect::Deny);

        let replaced = updated.with_rule(Rule::simple("b", RuleEffect::Deny)).unwrap();
        assert_eq!(replaced.rules().len(), 2);
        assert_eq!(replaced.calculate(&ctx).effect, Effect::Deny);

        assert!(matches!(
            updated.without_rule("a"),
            Err(BuildError::DanglingReference { role: "default", .. })
        ));
    }
}
