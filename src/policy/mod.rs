/*!
 * Policy Module
 * Rules, policies, policy sets and the algorithms that combine them
 *
 * Evaluation never fails: every error is contained in the subtree it
 * happened in and surfaces as an indeterminate effect with a status.
 */

mod algorithms;
mod effect;
mod evaluable;
mod policies;
mod policy_set;
mod response;
mod rule;

pub use algorithms::{Algorithm, Combinable, Combiner, Mapper, MapperOrder, MAPPER_NAME};
pub use effect::{Effect, RuleEffect};
pub use evaluable::Evaluable;
pub use policies::Policy;
pub use policy_set::PolicySet;
pub use response::Response;
pub use rule::Rule;
