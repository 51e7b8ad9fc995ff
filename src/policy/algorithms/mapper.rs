/*!
 * Mapper Algorithm
 * Routes to children by ID using a value computed from the request
 *
 * The argument yields a string (one child) or a set, list or flags value
 * (several children, combined with a sub-algorithm). Children are looked up
 * through an ID index built when the owning node is built, so routing costs
 * one hash lookup per name regardless of the number of children.
 *
 * A routing value that is absent (missing attribute, key not in the content
 * table) selects nothing and goes to the default child. Any other argument
 * failure goes to the error child.
 */

use super::{Combinable, Combiner};
use crate::expr::{BuildError, BuildResult, Context, EvalError, Expression};
use crate::policy::{Effect, Response};
use crate::value::{AttributeValue, Kind};
use log::trace;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Visiting order for collection routing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MapperOrder {
    /// Declaration order of the children
    #[default]
    Internal,
    /// Order of the names in the routing value
    External,
    /// Routing value order, stopping at the first Permit or Deny
    Fast,
}

impl MapperOrder {
    pub const fn name(self) -> &'static str {
        match self {
            MapperOrder::Internal => "internal",
            MapperOrder::External => "external",
            MapperOrder::Fast => "fast",
        }
    }
}

impl FromStr for MapperOrder {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [MapperOrder::Internal, MapperOrder::External, MapperOrder::Fast]
            .into_iter()
            .find(|order| order.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BuildError::UnknownOrder(s.to_string()))
    }
}

impl fmt::Display for MapperOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mapper parameters plus the child index of the node it is bound to
#[derive(Debug, Clone)]
pub struct Mapper {
    argument: Expression,
    order: MapperOrder,
    default: Option<String>,
    error: Option<String>,
    sub: Option<Combiner>,
    index: ahash::HashMap<String, usize>,
    default_pos: Option<usize>,
    error_pos: Option<usize>,
}

impl Mapper {
    pub fn new(
        argument: Expression,
        order: MapperOrder,
        default: Option<String>,
        error: Option<String>,
        sub: Option<Combiner>,
    ) -> BuildResult<Self> {
        let ty = argument.result_type();
        match ty.kind() {
            Kind::String => {}
            Kind::SetOfStrings | Kind::ListOfStrings | Kind::Flags => {
                if sub.is_none() {
                    return Err(BuildError::MissingSubAlgorithm(ty.to_string()));
                }
            }
            _ => return Err(BuildError::MapperArgument(ty.to_string())),
        }

        Ok(Self {
            argument,
            order,
            default,
            error,
            sub,
            index: Default::default(),
            default_pos: None,
            error_pos: None,
        })
    }

    pub fn argument(&self) -> &Expression {
        &self.argument
    }

    pub fn order(&self) -> MapperOrder {
        self.order
    }

    pub fn default_id(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn error_id(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn sub_algorithm(&self) -> Option<Combiner> {
        self.sub
    }

    /// True if `id` is the default or error child
    pub fn references(&self, id: &str) -> bool {
        self.default.as_deref() == Some(id) || self.error.as_deref() == Some(id)
    }

    /// Index the children of the owning node and resolve default and error
    pub(super) fn bind<'a, I>(&mut self, ids: I) -> BuildResult<()>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        self.index = ids
            .into_iter()
            .enumerate()
            .filter_map(|(pos, id)| id.map(|id| (id.to_string(), pos)))
            .collect();

        self.default_pos = self.resolve("default", self.default.as_deref())?;
        self.error_pos = self.resolve("error", self.error.as_deref())?;
        Ok(())
    }

    fn resolve(&self, role: &'static str, id: Option<&str>) -> BuildResult<Option<usize>> {
        match id {
            None => Ok(None),
            Some(id) => self
                .index
                .get(id)
                .copied()
                .map(Some)
                .ok_or_else(|| BuildError::DanglingReference {
                    role,
                    id: id.to_string(),
                }),
        }
    }

    pub(super) fn combine<T: Combinable>(&self, children: &[Arc<T>], ctx: &Context) -> Response {
        let value = match self.argument.evaluate(ctx) {
            Ok(value) => value,
            Err(err) if err.is_missing() => return self.on_missing(children, ctx, err),
            Err(err) => return self.on_error(children, ctx, err),
        };

        let names: Vec<&str> = match value.as_ref() {
            AttributeValue::String(id) => {
                return match self.index.get(id.as_str()) {
                    Some(&pos) => children[pos].calculate(ctx),
                    None => self.fallback(children, ctx, &value),
                };
            }
            AttributeValue::SetOfStrings(set) => set.iter().collect(),
            AttributeValue::ListOfStrings(list) => list.iter().map(String::as_str).collect(),
            AttributeValue::Flags(flags) => flags.names().collect(),
            other => {
                let err = EvalError::UnexpectedKind {
                    context: "mapper argument",
                    expected: Kind::SetOfStrings,
                    actual: other.kind(),
                };
                return self.on_error(children, ctx, err);
            }
        };

        let mut seen = ahash::HashSet::with_capacity_and_hasher(names.len(), Default::default());
        let mut selected: Vec<usize> = Vec::with_capacity(names.len());
        for name in names {
            if let Some(&pos) = self.index.get(name) {
                if seen.insert(pos) {
                    selected.push(pos);
                }
            }
        }
        if selected.is_empty() {
            return self.fallback(children, ctx, &value);
        }

        let Some(sub) = self.sub else {
            unreachable!("collection routing values require a sub-algorithm, checked by Mapper::new")
        };

        match self.order {
            MapperOrder::Internal => {
                selected.sort_unstable();
                sub.combine(selected.iter().map(|&pos| children[pos].calculate(ctx)))
            }
            MapperOrder::External => sub.combine(selected.iter().map(|&pos| children[pos].calculate(ctx))),
            MapperOrder::Fast => {
                let mut visited = Vec::with_capacity(selected.len());
                for &pos in &selected {
                    let response = children[pos].calculate(ctx);
                    if response.is_decisive() {
                        return response;
                    }
                    visited.push(response);
                }
                sub.combine(visited)
            }
        }
    }

    /// No child selected: default, then error, then indeterminate
    fn fallback<T: Combinable>(&self, children: &[Arc<T>], ctx: &Context, value: &AttributeValue) -> Response {
        trace!("mapper selected no child for {}", value.describe());
        match self.default_pos.or(self.error_pos) {
            Some(pos) => children[pos].calculate(ctx),
            None => Response::indeterminate(
                Effect::Indeterminate,
                EvalError::NoChildSelected(value.describe()),
            ),
        }
    }

    /// Argument absent: default, then the error path
    fn on_missing<T: Combinable>(&self, children: &[Arc<T>], ctx: &Context, err: EvalError) -> Response {
        match self.default_pos {
            Some(pos) => {
                trace!("mapper argument absent, using default: {err}");
                children[pos].calculate(ctx)
            }
            None => self.on_error(children, ctx, err),
        }
    }

    /// Argument failed: error child with the failure as status, or indeterminate
    fn on_error<T: Combinable>(&self, children: &[Arc<T>], ctx: &Context, err: EvalError) -> Response {
        trace!("mapper argument failed: {err}");
        match self.error_pos {
            Some(pos) => {
                let mut response = children[pos].calculate(ctx);
                if response.status.is_none() {
                    response.status = Some(err);
                }
                response
            }
            None => Response::indeterminate(Effect::Indeterminate, err),
        }
    }
}
