/*!
 * Policy Transactions
 * Path-copying add/delete commands against a snapshot of the tree
 *
 * Only the nodes on the path from the root to the modified node are copied;
 * everything else is shared with the snapshot the transaction started from,
 * which stays valid and unchanged for whoever still evaluates it.
 */

use super::errors::{StorageError, StorageResult};
use super::policy::PolicyStorage;
use super::update::{Command, Update, UpdateOp};
use crate::expr::BuildError;
use crate::policy::{Combinable, Evaluable};
use crate::value::Symbols;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

/// Policy update: ordered commands carrying evaluables
pub type PolicyUpdate = Update<Evaluable>;

/// Working copy of a policy tree
#[derive(Debug)]
pub struct PolicyTransaction {
    tag: Uuid,
    root: Arc<Evaluable>,
    symbols: Arc<Symbols>,
    error: Option<StorageError>,
}

impl PolicyTransaction {
    pub(super) fn new(tag: Uuid, root: Arc<Evaluable>, symbols: Arc<Symbols>) -> Self {
        Self {
            tag,
            root,
            symbols,
            error: None,
        }
    }

    pub fn tag(&self) -> Uuid {
        self.tag
    }

    /// Declarations entities of an update must be built with
    pub fn symbols(&self) -> &Arc<Symbols> {
        &self.symbols
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Apply an update whose `from_tag` must match the transaction's tag
    ///
    /// Commands run in order. The first failing command fails the whole
    /// transaction; nothing it did becomes visible.
    pub fn apply(&mut self, update: &PolicyUpdate) -> StorageResult<()> {
        if let Some(err) = &self.error {
            return Err(StorageError::TransactionFailed(Box::new(err.clone())));
        }

        if update.from_tag != self.tag {
            return Err(self.fail(StorageError::TagMismatch {
                expected: update.from_tag,
                actual: self.tag,
            }));
        }

        let mut root = self.root.clone();
        for command in &update.commands {
            root = match apply_command(&root, command) {
                Ok(root) => root,
                Err(err) => return Err(self.fail(err)),
            };
        }

        debug!(
            "Applied {} policy commands: {} -> {}",
            update.len(),
            self.tag,
            update.to_tag
        );
        self.root = root;
        self.tag = update.to_tag;
        Ok(())
    }

    /// New storage tagged with the last applied `to_tag`
    pub fn commit(self) -> StorageResult<PolicyStorage> {
        if let Some(err) = self.error {
            return Err(StorageError::TransactionFailed(Box::new(err)));
        }
        Ok(PolicyStorage::from_parts(self.root, self.symbols, Some(self.tag)))
    }

    fn fail(&mut self, err: StorageError) -> StorageError {
        self.error = Some(err.clone());
        err
    }
}

fn apply_command(root: &Arc<Evaluable>, command: &Command<Evaluable>) -> StorageResult<Arc<Evaluable>> {
    let path = &command.path;
    let (root_id, below) = path.split_first().ok_or(StorageError::EmptyPath)?;
    if root.id() != Some(root_id.as_str()) {
        return Err(not_found(path, format!("root is {}", root.describe())));
    }

    match command.op {
        UpdateOp::Add => {
            let entity = command
                .entity
                .as_ref()
                .ok_or(StorageError::MissingEntity(UpdateOp::Add.name()))?;
            if entity.id().is_none() {
                return Err(StorageError::InvalidNode(format!(
                    "added {} must have an id",
                    entity.kind_name()
                )));
            }
            modify(root, below, path, |parent| add_child(parent, entity))
        }
        UpdateOp::Delete => {
            let Some((child_id, parent_path)) = below.split_last() else {
                return Err(StorageError::InvalidNode("the root can't be deleted".to_string()));
            };
            modify(root, parent_path, path, |parent| delete_child(parent, child_id, path))
        }
    }
}

/// Copy the path down to the node at `rest` and replace it with `f(node)`
fn modify<F>(node: &Arc<Evaluable>, rest: &[String], path: &[String], f: F) -> StorageResult<Arc<Evaluable>>
where
    F: FnOnce(&Evaluable) -> StorageResult<Evaluable>,
{
    let Some((next, rest)) = rest.split_first() else {
        return f(node).map(Arc::new);
    };

    match node.as_ref() {
        Evaluable::PolicySet(set) => {
            let child = set
                .child(next)
                .ok_or_else(|| not_found(path, format!("{} has no child {next:?}", node.describe())))?;
            let updated = modify(child, rest, path, f)?;
            let set = set.with_child(updated).map_err(|err| invalid(node, err))?;
            Ok(Arc::new(set.into()))
        }
        other => Err(not_found(
            path,
            format!("{} has no child {next:?}", other.describe()),
        )),
    }
}

fn add_child(parent: &Evaluable, entity: &Evaluable) -> StorageResult<Evaluable> {
    match (parent, entity) {
        (Evaluable::Policy(policy), Evaluable::Rule(rule)) => policy
            .with_rule(rule.clone())
            .map(Evaluable::Policy)
            .map_err(|err| invalid(parent, err)),
        (Evaluable::PolicySet(set), entity) => set
            .with_child(Arc::new(entity.clone()))
            .map(Evaluable::PolicySet)
            .map_err(|err| invalid(parent, err)),
        (parent, entity) => Err(StorageError::EntityMismatch {
            entity: entity.kind_name(),
            parent: parent.describe(),
        }),
    }
}

fn delete_child(parent: &Evaluable, id: &str, path: &[String]) -> StorageResult<Evaluable> {
    let (exists, algorithm) = match parent {
        Evaluable::Policy(policy) => (policy.rule(id).is_some(), policy.algorithm()),
        Evaluable::PolicySet(set) => (set.child(id).is_some(), set.algorithm()),
        Evaluable::Rule(_) => {
            return Err(not_found(path, format!("{} has no children", parent.describe())));
        }
    };

    if !exists {
        return Err(not_found(path, format!("{} has no child {id:?}", parent.describe())));
    }
    if algorithm.references(id) {
        return Err(StorageError::ReferencedChild {
            parent: parent.describe(),
            child: id.to_string(),
        });
    }

    let result = match parent {
        Evaluable::Policy(policy) => policy.without_rule(id).map(Evaluable::Policy),
        Evaluable::PolicySet(set) => set.without_child(id).map(Evaluable::PolicySet),
        Evaluable::Rule(_) => unreachable!("rules were rejected above"),
    };
    result.map_err(|err| invalid(parent, err))
}

fn not_found(path: &[String], reason: String) -> StorageError {
    StorageError::PathNotFound {
        path: path.to_vec(),
        reason,
    }
}

fn invalid(node: &Evaluable, err: BuildError) -> StorageError {
    StorageError::InvalidNode(format!("{}: {err}", node.describe()))
}
