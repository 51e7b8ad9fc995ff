/*!
 * Policy Sets
 * Ordered child evaluables combined by a policy-combining algorithm
 */

use super::algorithms::{Algorithm, Combinable};
use super::evaluable::{calculate_node, check_unique_ids, describe, Evaluable};
use super::response::Response;
use crate::expr::{AttributeAssignmentExpression, BuildResult, Context, Target};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PolicySet {
    id: Option<String>,
    target: Target,
    children: Vec<Arc<Evaluable>>,
    algorithm: Algorithm,
    obligations: Vec<AttributeAssignmentExpression>,
}

impl PolicySet {
    pub fn new(
        id: Option<String>,
        target: Target,
        children: Vec<Arc<Evaluable>>,
        mut algorithm: Algorithm,
        obligations: Vec<AttributeAssignmentExpression>,
    ) -> BuildResult<Self> {
        check_unique_ids(children.iter().map(|child| child.id()))?;
        algorithm.bind(&children)?;
        Ok(Self {
            id,
            target,
            children,
            algorithm,
            obligations,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn children(&self) -> &[Arc<Evaluable>] {
        &self.children
    }

    pub fn child(&self, id: &str) -> Option<&Arc<Evaluable>> {
        self.children.iter().find(|child| child.id() == Some(id))
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    pub fn obligations(&self) -> &[AttributeAssignmentExpression] {
        &self.obligations
    }

    /// Copy with a child replaced by ID, or appended if the ID is new
    pub fn with_child(&self, child: Arc<Evaluable>) -> BuildResult<Self> {
        let mut children = self.children.clone();
        let existing = child
            .id()
            .and_then(|id| children.iter().position(|c| c.id() == Some(id)));
        match existing {
            Some(pos) => children[pos] = child,
            None => children.push(child),
        }
        self.with_children(children)
    }

    /// Copy without the child with ID `id`
    pub fn without_child(&self, id: &str) -> BuildResult<Self> {
        let children = self
            .children
            .iter()
            .filter(|child| child.id() != Some(id))
            .cloned()
            .collect();
        self.with_children(children)
    }

    fn with_children(&self, children: Vec<Arc<Evaluable>>) -> BuildResult<Self> {
        Self::new(
            self.id.clone(),
            self.target.clone(),
            children,
            self.algorithm.clone(),
            self.obligations.clone(),
        )
    }
}

impl Combinable for PolicySet {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn calculate(&self, ctx: &Context) -> Response {
        calculate_node(
            &self.target,
            &self.children,
            &self.algorithm,
            &self.obligations,
            ctx,
            || describe("policy set", self.id.as_deref()),
        )
    }
}
