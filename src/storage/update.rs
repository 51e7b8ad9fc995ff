/*!
 * Update Commands
 * Ordered add/delete commands shared by policy and content transactions
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of modification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOp {
    Add,
    Delete,
}

impl UpdateOp {
    pub const fn name(self) -> &'static str {
        match self {
            UpdateOp::Add => "add",
            UpdateOp::Delete => "delete",
        }
    }
}

impl fmt::Display for UpdateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Single command: operation, ID path and (for `add`) the new entity
#[derive(Debug, Clone)]
pub struct Command<E> {
    pub op: UpdateOp,
    pub path: Vec<String>,
    pub entity: Option<E>,
}

impl<E> Command<E> {
    pub fn add(path: Vec<String>, entity: E) -> Self {
        Self {
            op: UpdateOp::Add,
            path,
            entity: Some(entity),
        }
    }

    pub fn delete(path: Vec<String>) -> Self {
        Self {
            op: UpdateOp::Delete,
            path,
            entity: None,
        }
    }
}

/// Ordered command list moving storage from one tag to another
#[derive(Debug, Clone)]
pub struct Update<E> {
    pub from_tag: Uuid,
    pub to_tag: Uuid,
    pub commands: Vec<Command<E>>,
}

impl<E> Update<E> {
    pub fn new(from_tag: Uuid, to_tag: Uuid) -> Self {
        Self {
            from_tag,
            to_tag,
            commands: Vec::new(),
        }
    }

    pub fn append(&mut self, command: Command<E>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
