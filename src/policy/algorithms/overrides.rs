/*!
 * Overrides Algorithms
 * Deny-overrides and permit-overrides with extended indeterminate handling
 */

use crate::expr::EvalError;
use crate::policy::{Effect, Response};

/// A decisive `winner` anywhere overrides everything else
///
/// Plain `Indeterminate` children count as `Indeterminate{DP}`. Every child
/// with the returned effect contributes its obligations in order.
pub(super) fn overrides<I>(responses: I, winner: Effect) -> Response
where
    I: IntoIterator<Item = Response>,
{
    let loser = match winner {
        Effect::Deny => Effect::Permit,
        _ => Effect::Deny,
    };
    let (winner_error, loser_error) = (winner.as_indeterminate(), loser.as_indeterminate());

    let mut won = Vec::new();
    let mut won_any = false;
    let mut lost = Vec::new();
    let mut lost_any = false;

    let (mut err_win, mut err_lose, mut err_both) = (false, false, false);
    let mut status: Option<EvalError> = None;

    for response in responses {
        match response.effect {
            Effect::NotApplicable => continue,
            effect if effect == winner => {
                won_any = true;
                won.extend(response.obligations);
                continue;
            }
            effect if effect == loser => {
                lost_any = true;
                lost.extend(response.obligations);
                continue;
            }
            effect if effect == winner_error => err_win = true,
            effect if effect == loser_error => err_lose = true,
            _ => err_both = true,
        }

        if let Some(err) = response.status {
            status = Some(match status {
                Some(existing) => existing.merge(err),
                None => err,
            });
        }
    }

    let indeterminate = |effect: Effect| Response {
        effect,
        obligations: Vec::new(),
        status: status.clone(),
    };

    if won_any {
        Response::new(winner).with_obligations(won)
    } else if err_both || (err_win && (err_lose || lost_any)) {
        indeterminate(Effect::IndeterminateDP)
    } else if err_win {
        indeterminate(winner_error)
    } else if lost_any {
        Response::new(loser).with_obligations(lost)
    } else if err_lose {
        indeterminate(loser_error)
    } else {
        Response::not_applicable()
    }
}
