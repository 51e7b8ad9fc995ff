/*!
 * Targets
 * Restricted boolean pre-filters: Target of AnyOf of AllOf of Match
 */

use super::context::Context;
use super::errors::{BuildError, BuildResult, EvalError};
use super::functions::Function;
use crate::value::{AttributeValue, Kind};

/// Tri-valued match outcome
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Match,
    NoMatch,
    Indeterminate(EvalError),
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// Comparison of one lookup with one literal
#[derive(Debug, Clone)]
pub struct Match {
    function: Function,
}

impl Match {
    /// Accept only target-compatible functions over a lookup and a literal
    pub fn new(function: Function) -> BuildResult<Self> {
        if !function.operator().is_target_compatible() {
            return Err(BuildError::InvalidMatch(format!(
                "{} can't be used in a target",
                function.operator()
            )));
        }

        let args = function.args();
        let lookups = args.iter().filter(|arg| arg.is_lookup()).count();
        let literals = args.iter().filter(|arg| arg.is_literal()).count();
        if args.len() != 2 || lookups != 1 || literals != 1 {
            return Err(BuildError::InvalidMatch(format!(
                "{function} needs one attribute or selector and one value"
            )));
        }

        Ok(Self { function })
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn evaluate(&self, ctx: &Context) -> MatchResult {
        match self.function.evaluate(ctx) {
            Ok(AttributeValue::Boolean(true)) => MatchResult::Match,
            Ok(AttributeValue::Boolean(false)) => MatchResult::NoMatch,
            Ok(other) => MatchResult::Indeterminate(EvalError::UnexpectedKind {
                context: "match",
                expected: Kind::Boolean,
                actual: other.kind(),
            }),
            Err(err) => MatchResult::Indeterminate(err),
        }
    }
}

/// Conjunction of matches
#[derive(Debug, Clone, Default)]
pub struct AllOf {
    matches: Vec<Match>,
}

impl AllOf {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// NoMatch anywhere wins over an error elsewhere
    pub fn evaluate(&self, ctx: &Context) -> MatchResult {
        let mut error = None;
        for m in &self.matches {
            match m.evaluate(ctx) {
                MatchResult::Match => {}
                MatchResult::NoMatch => return MatchResult::NoMatch,
                MatchResult::Indeterminate(err) => {
                    error.get_or_insert(err);
                }
            }
        }
        error.map_or(MatchResult::Match, MatchResult::Indeterminate)
    }
}

/// Disjunction of conjunctions
#[derive(Debug, Clone, Default)]
pub struct AnyOf {
    all: Vec<AllOf>,
}

impl AnyOf {
    pub fn new(all: Vec<AllOf>) -> Self {
        Self { all }
    }

    pub fn all(&self) -> &[AllOf] {
        &self.all
    }

    /// Match anywhere wins over an error elsewhere
    pub fn evaluate(&self, ctx: &Context) -> MatchResult {
        let mut error = None;
        for all in &self.all {
            match all.evaluate(ctx) {
                MatchResult::Match => return MatchResult::Match,
                MatchResult::NoMatch => {}
                MatchResult::Indeterminate(err) => {
                    error.get_or_insert(err);
                }
            }
        }
        error.map_or(MatchResult::NoMatch, MatchResult::Indeterminate)
    }
}

/// Conjunction of AnyOf; empty targets match everything
#[derive(Debug, Clone, Default)]
pub struct Target {
    any: Vec<AnyOf>,
}

impl Target {
    pub fn new(any: Vec<AnyOf>) -> Self {
        Self { any }
    }

    pub fn any(&self) -> &[AnyOf] {
        &self.any
    }

    pub fn is_empty(&self) -> bool {
        self.any.is_empty()
    }

    pub fn evaluate(&self, ctx: &Context) -> MatchResult {
        let mut error = None;
        for any in &self.any {
            match any.evaluate(ctx) {
                MatchResult::Match => {}
                MatchResult::NoMatch => return MatchResult::NoMatch,
                MatchResult::Indeterminate(err) => {
                    error.get_or_insert(err);
                }
            }
        }
        error.map_or(MatchResult::Match, MatchResult::Indeterminate)
    }
}
