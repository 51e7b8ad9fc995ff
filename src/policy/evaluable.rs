/*!
 * Evaluables
 * Closed set of tree nodes and the evaluation steps they share
 */

use super::algorithms::{Algorithm, Combinable};
use super::effect::Effect;
use super::policies::Policy;
use super::policy_set::PolicySet;
use super::response::Response;
use super::rule::Rule;
use crate::expr::{AttributeAssignmentExpression, BuildError, BuildResult, Context, MatchResult, Target};
use std::sync::Arc;

/// Node of a policy tree
#[derive(Debug, Clone)]
pub enum Evaluable {
    Rule(Rule),
    Policy(Policy),
    PolicySet(PolicySet),
}

impl Evaluable {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Evaluable::Rule(_) => "rule",
            Evaluable::Policy(_) => "policy",
            Evaluable::PolicySet(_) => "policy set",
        }
    }

    /// Human-readable node description for statuses and errors
    pub fn describe(&self) -> String {
        describe(self.kind_name(), self.id())
    }
}

impl Combinable for Evaluable {
    fn id(&self) -> Option<&str> {
        match self {
            Evaluable::Rule(rule) => rule.id(),
            Evaluable::Policy(policy) => policy.id(),
            Evaluable::PolicySet(set) => set.id(),
        }
    }

    fn calculate(&self, ctx: &Context) -> Response {
        match self {
            Evaluable::Rule(rule) => rule.calculate(ctx),
            Evaluable::Policy(policy) => policy.calculate(ctx),
            Evaluable::PolicySet(set) => set.calculate(ctx),
        }
    }
}

impl From<Rule> for Evaluable {
    fn from(rule: Rule) -> Self {
        Evaluable::Rule(rule)
    }
}

impl From<Policy> for Evaluable {
    fn from(policy: Policy) -> Self {
        Evaluable::Policy(policy)
    }
}

impl From<PolicySet> for Evaluable {
    fn from(set: PolicySet) -> Self {
        Evaluable::PolicySet(set)
    }
}

pub(super) fn describe(kind: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{kind} {id:?}"),
        None => format!("hidden {kind}"),
    }
}

/// Append resolved obligations; failures become statuses bound to the node
pub(super) fn resolve_obligations(
    obligations: &[AttributeAssignmentExpression],
    ctx: &Context,
    response: &mut Response,
    node: impl Fn() -> String,
) {
    for obligation in obligations {
        match obligation.evaluate(ctx) {
            Ok(assignment) => response.obligations.push(assignment),
            Err(err) => response.add_status(err.bind(node())),
        }
    }
}

/// Sibling IDs must be unique; hidden children are exempt
pub(super) fn check_unique_ids<'a>(ids: impl IntoIterator<Item = Option<&'a str>>) -> BuildResult<()> {
    let mut seen = ahash::HashSet::default();
    for id in ids.into_iter().flatten() {
        if !seen.insert(id) {
            return Err(BuildError::DuplicateChild(id.to_string()));
        }
    }
    Ok(())
}

/// Evaluation shared by policies and policy sets
///
/// A failed target still combines the children: if they would have been
/// not applicable the node is too, otherwise the result becomes the
/// indeterminate variant of what they would have decided.
pub(super) fn calculate_node<T: Combinable>(
    target: &Target,
    children: &[Arc<T>],
    algorithm: &Algorithm,
    obligations: &[AttributeAssignmentExpression],
    ctx: &Context,
    node: impl Fn() -> String,
) -> Response {
    let target_error = match target.evaluate(ctx) {
        MatchResult::Match => None,
        MatchResult::NoMatch => return Response::not_applicable(),
        MatchResult::Indeterminate(err) => Some(err.bind(node())),
    };

    let mut response = algorithm.combine(children, ctx);

    if let Some(err) = target_error {
        return match response.effect {
            Effect::NotApplicable => Response::not_applicable(),
            effect => {
                let mut failed = Response::new(effect.as_indeterminate());
                failed.status = response.status.take();
                failed.add_status(err);
                failed
            }
        };
    }

    if response.is_decisive() {
        resolve_obligations(obligations, ctx, &mut response, node);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids() {
        assert!(check_unique_ids([Some("a"), None, None, Some("b")]).is_ok());
        assert_eq!(
            check_unique_ids([Some("a"), Some("a")]),
            Err(BuildError::DuplicateChild("a".into()))
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe("rule", Some("r")), "rule \"r\"");
        assert_eq!(describe("policy", None), "hidden policy");
    }
}
