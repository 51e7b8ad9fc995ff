/*!
 * Combining Algorithms
 * Reduce the ordered responses of a node's children to one response
 *
 * Children are evaluated lazily in declaration order. Algorithms that can
 * decide early stop pulling responses, which is indistinguishable from
 * evaluating every child first because evaluation has no side effects.
 */

mod mapper;
mod overrides;
mod simple;

pub use mapper::{Mapper, MapperOrder};

use crate::expr::{BuildError, BuildResult, Context};
use crate::policy::{Effect, Response};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Anything a combining algorithm can combine
pub trait Combinable {
    fn id(&self) -> Option<&str>;
    fn calculate(&self, ctx: &Context) -> Response;
}

/// Algorithms defined purely over the sequence of child responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combiner {
    FirstApplicableEffect,
    DenyOverrides,
    PermitOverrides,
    DenyUnlessPermit,
    PermitUnlessDeny,
}

impl Combiner {
    pub const ALL: [Combiner; 5] = [
        Combiner::FirstApplicableEffect,
        Combiner::DenyOverrides,
        Combiner::PermitOverrides,
        Combiner::DenyUnlessPermit,
        Combiner::PermitUnlessDeny,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Combiner::FirstApplicableEffect => "firstApplicableEffect",
            Combiner::DenyOverrides => "denyOverrides",
            Combiner::PermitOverrides => "permitOverrides",
            Combiner::DenyUnlessPermit => "denyUnlessPermit",
            Combiner::PermitUnlessDeny => "permitUnlessDeny",
        }
    }

    pub fn combine<I>(self, responses: I) -> Response
    where
        I: IntoIterator<Item = Response>,
    {
        match self {
            Combiner::FirstApplicableEffect => simple::first_applicable(responses),
            Combiner::DenyOverrides => overrides::overrides(responses, Effect::Deny),
            Combiner::PermitOverrides => overrides::overrides(responses, Effect::Permit),
            Combiner::DenyUnlessPermit => simple::unless(responses, Effect::Permit),
            Combiner::PermitUnlessDeny => simple::unless(responses, Effect::Deny),
        }
    }
}

impl FromStr for Combiner {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BuildError::UnknownAlgorithm(s.to_string()))
    }
}

impl fmt::Display for Combiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name the mapper is declared with in documents
pub const MAPPER_NAME: &str = "mapper";

/// Combining algorithm of a policy or policy set
#[derive(Debug, Clone)]
pub enum Algorithm {
    Combiner(Combiner),
    Mapper(Box<Mapper>),
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Combiner(combiner) => combiner.name(),
            Algorithm::Mapper(_) => MAPPER_NAME,
        }
    }

    /// Prepare for a specific child list; called whenever the children change
    pub fn bind<T: Combinable>(&mut self, children: &[Arc<T>]) -> BuildResult<()> {
        match self {
            Algorithm::Combiner(_) => Ok(()),
            Algorithm::Mapper(mapper) => mapper.bind(children.iter().map(|child| child.id())),
        }
    }

    /// True if removing child `id` would leave a dangling reference
    pub fn references(&self, id: &str) -> bool {
        match self {
            Algorithm::Combiner(_) => false,
            Algorithm::Mapper(mapper) => mapper.references(id),
        }
    }

    pub fn combine<T: Combinable>(&self, children: &[Arc<T>], ctx: &Context) -> Response {
        match self {
            Algorithm::Combiner(combiner) => {
                combiner.combine(children.iter().map(|child| child.calculate(ctx)))
            }
            Algorithm::Mapper(mapper) => mapper.combine(children, ctx),
        }
    }
}

impl From<Combiner> for Algorithm {
    fn from(combiner: Combiner) -> Self {
        Algorithm::Combiner(combiner)
    }
}

impl From<Mapper> for Algorithm {
    fn from(mapper: Mapper) -> Self {
        Algorithm::Mapper(Box::new(mapper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        for combiner in Combiner::ALL {
            assert_eq!(combiner.name().parse::<Combiner>(), Ok(combiner));
        }
        assert_eq!("DENYOVERRIDES".parse::<Combiner>(), Ok(Combiner::DenyOverrides));
        assert!(matches!(
            MAPPER_NAME.parse::<Combiner>(),
            Err(BuildError::UnknownAlgorithm(_))
        ));
    }
}
