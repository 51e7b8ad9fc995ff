/*!
 * Expression Module
 * Expressions, functions, selectors and targets evaluated against a context
 */

mod assignment;
mod context;
mod errors;
mod expression;
mod functions;
mod selector;
mod target;

pub use assignment::{AttributeAssignment, AttributeAssignmentExpression};
pub use context::Context;
pub use errors::{BuildError, BuildResult, EvalError, EvalResult};
pub use expression::Expression;
pub use functions::{Function, Operator, RANGE_ABOVE, RANGE_BELOW, RANGE_WITHIN};
pub use selector::Selector;
pub use target::{AllOf, AnyOf, Match, MatchResult, Target};
