/*!
 * Policy Storage
 * Immutable, tagged policy tree with its declarations
 */

use super::errors::{StorageError, StorageResult};
use super::transaction::PolicyTransaction;
use crate::expr::{Context, Target};
use crate::policy::{Combinable, Combiner, Evaluable, PolicySet, Response};
use crate::value::Symbols;
use std::sync::Arc;
use uuid::Uuid;

/// Root evaluable, symbols and version tag
///
/// Never modified after construction; updates produce a new storage that
/// shares every untouched subtree with this one.
#[derive(Debug, Clone)]
pub struct PolicyStorage {
    root: Arc<Evaluable>,
    symbols: Arc<Symbols>,
    tag: Option<Uuid>,
}

impl PolicyStorage {
    pub fn new(root: Evaluable, symbols: Symbols, tag: Option<Uuid>) -> Self {
        Self::from_parts(Arc::new(root), Arc::new(symbols), tag)
    }

    pub(super) fn from_parts(root: Arc<Evaluable>, symbols: Arc<Symbols>, tag: Option<Uuid>) -> Self {
        Self { root, symbols, tag }
    }

    /// Untagged storage whose root is never applicable
    pub fn empty() -> Self {
        let root = PolicySet::new(
            None,
            Target::default(),
            Vec::new(),
            Combiner::FirstApplicableEffect.into(),
            Vec::new(),
        );
        match root {
            Ok(root) => Self::new(root.into(), Symbols::new(), None),
            Err(err) => unreachable!("an empty policy set always builds: {err}"),
        }
    }

    pub fn root(&self) -> &Arc<Evaluable> {
        &self.root
    }

    pub fn symbols(&self) -> &Arc<Symbols> {
        &self.symbols
    }

    pub fn tag(&self) -> Option<Uuid> {
        self.tag
    }

    /// Evaluate the root against a request
    pub fn calculate(&self, ctx: &Context) -> Response {
        self.root.calculate(ctx)
    }

    /// Open a transaction against the current tag
    pub fn new_transaction(&self, from_tag: Uuid) -> StorageResult<PolicyTransaction> {
        let tag = self.tag.ok_or(StorageError::MissingStorageTag)?;
        if tag != from_tag {
            return Err(StorageError::TagMismatch {
                expected: from_tag,
                actual: tag,
            });
        }
        Ok(PolicyTransaction::new(
            tag,
            self.root.clone(),
            self.symbols.clone(),
        ))
    }
}

impl Default for PolicyStorage {
    fn default() -> Self {
        Self::empty()
    }
}
