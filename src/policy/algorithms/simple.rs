/*!
 * Ordered and Default-Effect Algorithms
 * First-applicable, deny-unless-permit and permit-unless-deny
 */

use crate::policy::{Effect, Response};

/// First response that isn't NotApplicable
///
/// Stops consuming at the first such response, so later children are never
/// evaluated.
pub(super) fn first_applicable<I>(responses: I) -> Response
where
    I: IntoIterator<Item = Response>,
{
    responses
        .into_iter()
        .find(|response| response.effect != Effect::NotApplicable)
        .unwrap_or_else(Response::not_applicable)
}

/// `preferred` if any child gives it, otherwise the opposite effect
///
/// Never indeterminate or not applicable.
pub(super) fn unless<I>(responses: I, preferred: Effect) -> Response
where
    I: IntoIterator<Item = Response>,
{
    let fallback = match preferred {
        Effect::Permit => Effect::Deny,
        _ => Effect::Permit,
    };

    let mut preferred_obligations = Vec::new();
    let mut preferred_any = false;
    let mut fallback_obligations = Vec::new();

    for response in responses {
        if response.effect == preferred {
            preferred_any = true;
            preferred_obligations.extend(response.obligations);
        } else if response.effect == fallback {
            fallback_obligations.extend(response.obligations);
        }
    }

    if preferred_any {
        Response::new(preferred).with_obligations(preferred_obligations)
    } else {
        Response::new(fallback).with_obligations(fallback_obligations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{AttributeAssignment, EvalError};
    use crate::value::AttributeValue;

    fn tagged(effect: Effect, id: &str) -> Response {
        Response::new(effect).with_obligations(vec![AttributeAssignment::new(id, AttributeValue::Boolean(true))])
    }

    #[test]
    fn test_first_applicable_stops() {
        let mut evaluated = 0;
        let responses = [Effect::NotApplicable, Effect::Deny, Effect::Permit]
            .into_iter()
            .map(|effect| {
                evaluated += 1;
                tagged(effect, effect.name())
            });

        let response = first_applicable(responses);
        assert_eq!(response.effect, Effect::Deny);
        assert_eq!(response.obligations[0].id, "Deny");
        assert_eq!(evaluated, 2);
    }

    #[test]
    fn test_first_applicable_returns_indeterminate() {
        let responses = vec![
            Response::indeterminate(Effect::IndeterminateP, EvalError::DivisionByZero),
            Response::new(Effect::Permit),
        ];
        assert_eq!(first_applicable(responses).effect, Effect::IndeterminateP);
        assert_eq!(first_applicable(Vec::new()).effect, Effect::NotApplicable);
    }

    #[test]
    fn test_unless() {
        let mixed = || {
            vec![
                tagged(Effect::Deny, "d"),
                Response::indeterminate(Effect::IndeterminateDP, EvalError::DivisionByZero),
                tagged(Effect::Permit, "p"),
            ]
        };

        let response = unless(mixed(), Effect::Permit);
        assert_eq!(response.effect, Effect::Permit);
        assert_eq!(response.obligations[0].id, "p");

        let response = unless(mixed(), Effect::Deny);
        assert_eq!(response.effect, Effect::Deny);
        assert_eq!(response.obligations[0].id, "d");

        assert_eq!(unless(Vec::new(), Effect::Permit).effect, Effect::Deny);
        assert_eq!(unless(Vec::new(), Effect::Deny).effect, Effect::Permit);
    }
}
